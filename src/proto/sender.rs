//! 发送端状态
//!
//! 序号以 packet 为单位，从 0 开始。ACK 号是接收方期望的下一个序号，
//! 收到 ACK `n` 表示 `< n` 的全部 packet 都已送达。

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, trace};

use super::flow::TransportConfig;
use super::rtt::RttEstimator;
use crate::net::{DataSegment, FlowId, NetApi, NodeId};
use crate::sim::{Event, EventHandle, SimTime, Simulator};

/// 拥塞控制阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CcMode {
    SlowStart,
    CongestionAvoidance,
    FastRecovery,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SenderStats {
    /// 发出的数据 packet（含重传）
    pub data_sent: u64,
    pub retransmits: u64,
    pub fast_retransmits: u64,
    pub dup_acks: u64,
    pub timeouts: u64,
}

/// 一个到达发送端的 ACK
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckInfo {
    pub ack: u64,
    /// 被确认数据 packet 的发送时间
    pub sent_at: SimTime,
}

/// ACK 分类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckClass {
    /// 比当前累计确认还旧
    Stale,
    /// 推进了累计确认
    New,
    /// 与当前累计确认相同；携带重复次数（该 ACK 号第一次到达时为 0）
    Duplicate(u32),
}

/// TLA 回调可用的上下文：当前流的地址信息、调度器和网络。
pub struct FlowCtx<'a> {
    pub flow: FlowId,
    pub src: NodeId,
    pub dst: NodeId,
    pub packet_bits: u64,
    pub sim: &'a mut Simulator,
    pub net: &'a mut dyn NetApi,
}

impl FlowCtx<'_> {
    pub fn now(&self) -> SimTime {
        self.sim.now()
    }

    pub fn send_data(&mut self, seq: u64) {
        let now = self.sim.now();
        let pkt = self.net.make_data_packet(
            self.src,
            self.dst,
            now,
            self.packet_bits,
            DataSegment {
                flow: self.flow,
                seq,
                ack: false,
            },
        );
        self.net.send_from_host(self.src, pkt, self.sim);
    }

    pub fn schedule_timeout(&mut self, delay: SimTime) -> EventHandle {
        self.sim.schedule_in(delay, Event::PacketTimeOut { flow: self.flow })
    }

    pub fn schedule_vegas_timer(&mut self, delay: SimTime) -> EventHandle {
        self.sim.schedule_in(delay, Event::VegasTimeOut { flow: self.flow })
    }

    pub fn record_window(&mut self, window: f64) {
        let now = self.sim.now();
        self.net.metrics_mut().record_window_size(now, self.flow, window);
    }
}

#[derive(Debug)]
pub struct SenderState {
    packet_count: u64,
    window: f64,
    pub ssthresh: f64,
    pub mode: CcMode,
    pub rtt: RttEstimator,
    in_flight: BTreeSet<u64>,
    cum_ack: u64,
    highest_sent: Option<u64>,
    dup_ack: Option<u64>,
    dup_count: u32,
    rto_timer: Option<EventHandle>,
    last_reset: SimTime,
    max_burst: u32,
    pub stats: SenderStats,
}

impl SenderState {
    pub fn new(packet_count: u64, initial_window: f64, cfg: &TransportConfig) -> Self {
        Self {
            packet_count,
            window: initial_window.max(1.0),
            ssthresh: cfg.init_ssthresh,
            mode: CcMode::SlowStart,
            rtt: RttEstimator::new(cfg.init_rto(), cfg.min_rto(), cfg.max_rto()),
            in_flight: BTreeSet::new(),
            cum_ack: 0,
            highest_sent: None,
            dup_ack: None,
            dup_count: 0,
            rto_timer: None,
            last_reset: SimTime::ZERO,
            max_burst: cfg.max_burst.max(1),
            stats: SenderStats::default(),
        }
    }

    pub fn packet_count(&self) -> u64 {
        self.packet_count
    }

    pub fn window(&self) -> f64 {
        self.window
    }

    pub fn in_flight(&self) -> &BTreeSet<u64> {
        &self.in_flight
    }

    /// 累计确认：期望的下一个序号
    pub fn cum_ack(&self) -> u64 {
        self.cum_ack
    }

    /// 已被确认的最高序号
    pub fn highest_acked(&self) -> Option<u64> {
        self.cum_ack.checked_sub(1)
    }

    pub fn is_complete(&self) -> bool {
        self.cum_ack >= self.packet_count
    }

    pub fn rto_timer(&self) -> Option<EventHandle> {
        self.rto_timer
    }

    pub fn last_reset(&self) -> SimTime {
        self.last_reset
    }

    pub(crate) fn is_current_timer(&self, handle: EventHandle) -> bool {
        self.rto_timer == Some(handle)
    }

    pub(crate) fn clear_timer(&mut self) {
        self.rto_timer = None;
    }

    /// 设置窗口（下限 1 个 packet）并记录度量
    pub fn set_window(&mut self, window: f64, cx: &mut FlowCtx<'_>) {
        self.window = window.max(1.0);
        cx.record_window(self.window);
    }

    /// ACK 对应的数据是否在最近一次重启之后发出
    pub fn is_fresh(&self, ack: &AckInfo) -> bool {
        ack.sent_at >= self.last_reset
    }

    /// 用新鲜 ACK 更新 RTT 估计；旧 ACK 不采样
    pub fn sample_rtt(&mut self, ack: &AckInfo, now: SimTime) -> bool {
        if !self.is_fresh(ack) {
            return false;
        }
        self.rtt.on_sample(now.saturating_sub(ack.sent_at));
        true
    }

    pub fn classify(&mut self, ack: u64) -> AckClass {
        if ack < self.cum_ack {
            return AckClass::Stale;
        }
        if ack > self.cum_ack {
            self.dup_ack = Some(ack);
            self.dup_count = 0;
            return AckClass::New;
        }
        if self.dup_ack != Some(ack) {
            // 尚未收到过任何 ACK：这是该号的原始 ACK，不算重复
            self.dup_ack = Some(ack);
            self.dup_count = 0;
            return AckClass::Duplicate(0);
        }
        self.dup_count += 1;
        self.stats.dup_acks += 1;
        AckClass::Duplicate(self.dup_count)
    }

    /// 推进累计确认，移出已确认的在途 packet；返回移出个数。
    pub fn acknowledge(&mut self, ack: u64, cx: &mut FlowCtx<'_>) -> usize {
        let ack = ack.min(self.packet_count);
        let before = self.in_flight.len();
        self.in_flight = self.in_flight.split_off(&ack);
        self.cum_ack = self.cum_ack.max(ack);
        let removed = before - self.in_flight.len();
        if removed > 0 {
            if self.in_flight.is_empty() {
                self.rto_timer = None;
            } else {
                self.reset_timer(cx);
            }
        }
        removed
    }

    fn transmit(&mut self, seq: u64, cx: &mut FlowCtx<'_>) {
        if self.highest_sent.is_some_and(|h| seq <= h) {
            self.stats.retransmits += 1;
        }
        self.highest_sent = Some(self.highest_sent.map_or(seq, |h| h.max(seq)));
        self.stats.data_sent += 1;
        trace!(flow = ?cx.flow, seq, "发送数据 packet");
        cx.send_data(seq);
    }

    pub fn reset_timer(&mut self, cx: &mut FlowCtx<'_>) {
        self.rto_timer = Some(cx.schedule_timeout(self.rtt.rto()));
    }

    /// 在窗口与突发上限允许的范围内发送新的 packet
    pub fn send_new_packets(&mut self, cx: &mut FlowCtx<'_>) -> u32 {
        let cap = self.window.floor().max(1.0) as usize;
        let mut sent = 0;
        while self.in_flight.len() < cap && sent < self.max_burst {
            let next = self
                .in_flight
                .last()
                .map(|&s| s + 1)
                .unwrap_or(self.cum_ack)
                .max(self.cum_ack);
            if next >= self.packet_count {
                break;
            }
            self.transmit(next, cx);
            self.in_flight.insert(next);
            sent += 1;
        }
        if sent > 0 && self.rto_timer.is_none() {
            self.reset_timer(cx);
        }
        sent
    }

    /// 重发第一个未确认的 packet 并重置定时器
    pub fn retransmit_missing(&mut self, cx: &mut FlowCtx<'_>) {
        if self.is_complete() {
            return;
        }
        let seq = self.cum_ack;
        self.transmit(seq, cx);
        self.in_flight.insert(seq);
        self.reset_timer(cx);
    }

    /// 从第一个未确认 packet 开始重发。
    ///
    /// `backoff` 为真时 RTO 翻倍；`collapse` 为真时 `ssthresh = W/2`、`W = 1` 并回到慢启动。
    pub fn restart(&mut self, backoff: bool, collapse: bool, cx: &mut FlowCtx<'_>) {
        if backoff {
            self.rtt.backoff();
        }
        if collapse {
            self.ssthresh = self.window / 2.0;
            self.mode = CcMode::SlowStart;
            self.set_window(1.0, cx);
        }
        debug!(
            flow = ?cx.flow,
            from = self.cum_ack,
            rto = ?self.rtt.rto(),
            window = self.window,
            "从第一个未确认 packet 重发"
        );
        // 重复 ACK 计数保留：同一个 ACK 号只触发一次快速重传
        self.in_flight.clear();
        self.last_reset = cx.now();
        self.reset_timer(cx);
        self.send_new_packets(cx);
    }

    /// AIMD 增长：慢启动每 ACK +1，超过 ssthresh 后转拥塞避免，每 ACK +1/W。
    pub fn grow(&mut self, cx: &mut FlowCtx<'_>) {
        match self.mode {
            CcMode::SlowStart => {
                let w = self.window + 1.0;
                self.set_window(w, cx);
                if self.window > self.ssthresh {
                    self.mode = CcMode::CongestionAvoidance;
                }
            }
            CcMode::CongestionAvoidance => {
                let w = self.window + 1.0 / self.window;
                self.set_window(w, cx);
            }
            CcMode::FastRecovery => {}
        }
    }

    /// 进入快速恢复：`ssthresh = W/2`，W 不变，在途列表截到 W，重发缺失的 packet。
    pub fn enter_fast_recovery(&mut self, cx: &mut FlowCtx<'_>) {
        self.ssthresh = self.window / 2.0;
        let keep = self.window.floor().max(1.0) as usize;
        while self.in_flight.len() > keep {
            self.in_flight.pop_last();
        }
        self.mode = CcMode::FastRecovery;
        self.stats.fast_retransmits += 1;
        debug!(flow = ?cx.flow, missing = self.cum_ack, window = self.window, "进入快速恢复");
        self.retransmit_missing(cx);
    }

    /// 快速恢复期间每个额外的重复 ACK 使窗口膨胀 1
    pub fn inflate(&mut self, cx: &mut FlowCtx<'_>) {
        let w = self.window + 1.0;
        self.set_window(w, cx);
        self.send_new_packets(cx);
    }

    pub fn exit_fast_recovery(&mut self, cx: &mut FlowCtx<'_>) {
        self.mode = CcMode::CongestionAvoidance;
        let w = (self.ssthresh - 1.0).max(1.0);
        self.set_window(w, cx);
    }
}
