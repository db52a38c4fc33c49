//! 仿真器
//!
//! 定义事件驱动仿真器，维护当前时间与事件队列。

use super::event::{Event, EventHandle};
use super::scheduled_event::ScheduledEvent;
use super::time::SimTime;
use super::world::World;
use std::collections::BinaryHeap;
use tracing::{debug, info, trace};

/// 事件驱动仿真器：维护当前时间与事件队列。
///
/// 没有取消原语：过期的定时器事件照常出队，由其处理函数自行判断是否仍然有效。
#[derive(Debug, Default)]
pub struct Simulator {
    now: SimTime,
    next_seq: u64,
    executed: u64,
    q: BinaryHeap<ScheduledEvent>,
}

impl Simulator {
    /// 获取当前仿真时间
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// 队列中尚未执行的事件数
    pub fn pending(&self) -> usize {
        self.q.len()
    }

    /// 已执行的事件总数
    pub fn executed(&self) -> u64 {
        self.executed
    }

    /// 调度事件在指定时间执行；早于当前时间的请求按当前时间处理。
    #[tracing::instrument(skip(self, ev), fields(event_kind = %ev.kind(), schedule_at = ?at))]
    pub fn schedule(&mut self, at: SimTime, ev: Event) -> EventHandle {
        let at = at.max(self.now);
        let seq = self.next_seq;
        trace!(now = ?self.now, seq, "调度事件");

        self.next_seq = self.next_seq.wrapping_add(1);
        let handle = EventHandle(seq);
        self.q.push(ScheduledEvent { at, handle, ev });

        debug!(queue_size = self.q.len(), "事件已加入队列");
        handle
    }

    /// 调度事件在 `delay` 之后执行
    pub fn schedule_in(&mut self, delay: SimTime, ev: Event) -> EventHandle {
        let at = self.now.saturating_add(delay);
        self.schedule(at, ev)
    }

    fn execute(&mut self, item: ScheduledEvent, world: &mut dyn World) {
        self.now = item.at;
        self.executed = self.executed.saturating_add(1);
        trace!(
            event_num = self.executed,
            now = ?self.now,
            seq = item.handle.0,
            event_kind = %item.ev.kind(),
            remaining_queue = self.q.len(),
            "执行事件"
        );
        world.handle(item.handle, item.ev, self);
        world.on_tick(self);
    }

    /// 运行直到事件队列为空或到达 `until`。
    ///
    /// 恰好在 `until` 时刻的事件会被执行；结束时时钟推进到 `until`。
    pub fn run_until(&mut self, until: SimTime, world: &mut dyn World) {
        while let Some(top) = self.q.peek() {
            if top.at > until {
                break;
            }
            let Some(item) = self.q.pop() else {
                break;
            };
            self.execute(item, world);
        }
        self.now = self.now.max(until);
    }

    /// 运行所有事件直到队列为空。
    #[tracing::instrument(skip(self, world))]
    pub fn run(&mut self, world: &mut dyn World) {
        info!("▶️  开始运行仿真");
        debug!(now = ?self.now, queue_size = self.q.len(), "初始状态");

        let before = self.executed;
        while let Some(item) = self.q.pop() {
            self.execute(item, world);
        }

        info!(
            total_events = self.executed - before,
            final_time = ?self.now,
            "✅ 仿真完成"
        );
    }
}
