//! 调度队列中的条目
//!
//! 每个条目带着自己的 `EventHandle`。句柄单调递增，既是同一时刻事件的
//! FIFO 决胜键，也是定时器处理函数判断自己是否过期时比对的值。

use super::event::{Event, EventHandle};
use super::time::SimTime;
use std::cmp::Ordering;

#[derive(Debug)]
pub struct ScheduledEvent {
    pub(crate) at: SimTime,
    pub(crate) handle: EventHandle,
    pub(crate) ev: Event,
}

impl ScheduledEvent {
    fn key(&self) -> (SimTime, EventHandle) {
        (self.at, self.handle)
    }
}

// BinaryHeap 是 max-heap：按 (时间, 句柄) 反向比较，最早、最先调度的条目先出队。
impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for ScheduledEvent {}
