//! 流：发送端 + 接收端 + TLA

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use super::receiver::Receiver;
use super::sender::{AckInfo, FlowCtx, SenderState};
use super::tla::{Tla, TlaSpec};
use crate::net::{DataSegment, FlowId, NetApi, NodeId, Packet};
use crate::sim::{EventHandle, SimTime, Simulator};

/// 传输层参数（时间单位：毫秒）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub packet_bits: u64,
    pub ack_bits: u64,
    pub init_rto_ms: f64,
    pub min_rto_ms: f64,
    /// RTO 上限；缺省不设上限，每次超时严格翻倍
    pub max_rto_ms: Option<f64>,
    /// 每次调用 `send_new_packets` 最多发出的 packet 数
    pub max_burst: u32,
    pub init_ssthresh: f64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            packet_bits: 8192,
            ack_bits: 512,
            init_rto_ms: 1000.0,
            min_rto_ms: 1000.0,
            max_rto_ms: None,
            max_burst: 2,
            init_ssthresh: 1e10,
        }
    }
}

impl TransportConfig {
    pub fn init_rto(&self) -> SimTime {
        SimTime::from_millis_f64(self.init_rto_ms)
    }

    pub fn min_rto(&self) -> SimTime {
        SimTime::from_millis_f64(self.min_rto_ms)
    }

    pub fn max_rto(&self) -> Option<SimTime> {
        self.max_rto_ms.map(SimTime::from_millis_f64)
    }

    /// 传输 `total_bits` 所需的 packet 数（向上取整）
    pub fn packet_count(&self, total_bits: u64) -> u64 {
        total_bits.div_ceil(self.packet_bits.max(1))
    }
}

#[derive(Debug)]
pub struct Flow {
    pub id: FlowId,
    pub name: String,
    pub src: NodeId,
    pub dst: NodeId,
    pub total_bits: u64,
    pub start_at: SimTime,
    packet_bits: u64,
    ack_bits: u64,
    sender: SenderState,
    receiver: Receiver,
    tla: Box<dyn Tla>,
    started_at: Option<SimTime>,
    done_at: Option<SimTime>,
}

impl Flow {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: FlowId,
        name: impl Into<String>,
        src: NodeId,
        dst: NodeId,
        total_bits: u64,
        start_at: SimTime,
        tla: &TlaSpec,
        cfg: &TransportConfig,
    ) -> Self {
        let tla = tla.build();
        let packets = cfg.packet_count(total_bits);
        let sender = SenderState::new(packets, tla.initial_window(), cfg);
        Self {
            id,
            name: name.into(),
            src,
            dst,
            total_bits,
            start_at,
            packet_bits: cfg.packet_bits,
            ack_bits: cfg.ack_bits,
            sender,
            receiver: Receiver::default(),
            tla,
            started_at: None,
            done_at: None,
        }
    }

    pub fn packet_count(&self) -> u64 {
        self.sender.packet_count()
    }

    pub fn sender(&self) -> &SenderState {
        &self.sender
    }

    pub fn receiver(&self) -> &Receiver {
        &self.receiver
    }

    pub fn tla_name(&self) -> &'static str {
        self.tla.name()
    }

    pub fn started_at(&self) -> Option<SimTime> {
        self.started_at
    }

    pub fn done_at(&self) -> Option<SimTime> {
        self.done_at
    }

    pub fn is_done(&self) -> bool {
        self.done_at.is_some()
    }

    fn ctx<'a>(&self, sim: &'a mut Simulator, net: &'a mut dyn NetApi) -> FlowCtx<'a> {
        FlowCtx {
            flow: self.id,
            src: self.src,
            dst: self.dst,
            packet_bits: self.packet_bits,
            sim,
            net,
        }
    }

    fn check_done(&mut self, now: SimTime) {
        if self.done_at.is_none() && self.sender.is_complete() {
            self.done_at = Some(now);
            let started = self.started_at.unwrap_or(self.start_at);
            info!(
                flow = %self.name,
                packets = self.packet_count(),
                elapsed_ms = now.saturating_sub(started).as_millis_f64(),
                retransmits = self.sender.stats.retransmits,
                "✅ 流传输完成"
            );
        }
    }

    #[tracing::instrument(skip(self, sim, net), fields(flow = %self.name))]
    pub fn on_start(&mut self, sim: &mut Simulator, net: &mut dyn NetApi) {
        if self.started_at.is_some() {
            return;
        }
        let now = sim.now();
        self.started_at = Some(now);
        info!(packets = self.packet_count(), tla = self.tla.name(), "▶️  流开始");
        if self.packet_count() == 0 {
            self.check_done(now);
            return;
        }
        let mut cx = self.ctx(sim, net);
        self.tla.on_flow_start(&mut self.sender, &mut cx);
    }

    /// 目的主机收到数据：更新接收端并回送累计 ACK（沿用数据的时间戳）
    pub fn on_data(&mut self, pkt: &Packet, seq: u64, sim: &mut Simulator, net: &mut dyn NetApi) {
        let now = sim.now();
        let before = self.receiver.next_expected();
        let receipt = self.receiver.on_data(seq);
        debug_assert!(receipt.ack >= before);
        trace!(flow = %self.name, seq, ack = receipt.ack, dup = receipt.duplicate, "接收端收到数据");

        let metrics = net.metrics_mut();
        metrics.record_packet_delay(now, self.id, now.saturating_sub(pkt.created_at));
        if receipt.newly_delivered > 0 {
            metrics.record_flow_rate(now, self.id, receipt.newly_delivered * self.packet_bits);
        }

        let ack = net.make_data_packet(
            self.dst,
            self.src,
            pkt.created_at,
            self.ack_bits,
            DataSegment {
                flow: self.id,
                seq: receipt.ack,
                ack: true,
            },
        );
        self.receiver.note_ack_sent();
        net.send_from_host(self.dst, ack, sim);
    }

    /// 源主机收到 ACK
    pub fn on_ack(&mut self, pkt: &Packet, ack: u64, sim: &mut Simulator, net: &mut dyn NetApi) {
        if self.is_done() {
            return;
        }
        let info = AckInfo {
            ack,
            sent_at: pkt.created_at,
        };
        let mut cx = self.ctx(sim, net);
        self.tla.on_ack(&mut self.sender, info, &mut cx);
        let now = cx.now();
        self.check_done(now);
    }

    /// RTO 定时器；过期（已被替换）的定时器直接忽略
    pub fn on_timeout(&mut self, handle: EventHandle, sim: &mut Simulator, net: &mut dyn NetApi) {
        if !self.sender.is_current_timer(handle) {
            trace!(flow = %self.name, ?handle, "过期的 RTO 定时器，忽略");
            return;
        }
        if self.is_done() || self.sender.in_flight().is_empty() {
            self.sender.clear_timer();
            return;
        }
        self.sender.stats.timeouts += 1;
        debug!(
            flow = %self.name,
            first_unacked = self.sender.cum_ack(),
            rto = ?self.sender.rtt.rto(),
            "⏰ RTO 超时"
        );
        let mut cx = self.ctx(sim, net);
        self.tla.on_timeout(&mut self.sender, &mut cx);
    }

    pub fn on_vegas_timeout(&mut self, handle: EventHandle, sim: &mut Simulator, net: &mut dyn NetApi) {
        if self.is_done() {
            return;
        }
        let mut cx = self.ctx(sim, net);
        self.tla.on_vegas_timeout(&mut self.sender, handle, &mut cx);
    }
}

/// 全部流，按 FlowId 索引
#[derive(Debug, Default)]
pub struct FlowTable {
    flows: BTreeMap<FlowId, Flow>,
}

impl FlowTable {
    pub fn next_id(&self) -> FlowId {
        FlowId(self.flows.len())
    }

    pub fn insert(&mut self, flow: Flow) {
        self.flows.insert(flow.id, flow);
    }

    pub fn get(&self, id: FlowId) -> Option<&Flow> {
        self.flows.get(&id)
    }

    pub fn get_mut(&mut self, id: FlowId) -> Option<&mut Flow> {
        self.flows.get_mut(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Flow> {
        self.flows.values()
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    pub fn all_done(&self) -> bool {
        self.flows.values().all(Flow::is_done)
    }
}
