//! 传输层看到的网络接口
//!
//! 流与 TLA 只通过这个 trait 发包和记录度量，测试里可以换成不做传输的替身。

use crate::metrics::MetricsRecorder;
use crate::sim::{SimTime, Simulator};

use super::{DataSegment, NodeId, Packet};

/// 传输层所需的最小网络 API
pub trait NetApi {
    fn make_data_packet(
        &mut self,
        src: NodeId,
        dst: NodeId,
        created_at: SimTime,
        size_bits: u64,
        seg: DataSegment,
    ) -> Packet;

    /// 把 packet 交给主机唯一的出链路
    fn send_from_host(&mut self, host: NodeId, pkt: Packet, sim: &mut Simulator);

    fn metrics_mut(&mut self) -> &mut MetricsRecorder;
}

impl NetApi for super::Network {
    fn make_data_packet(
        &mut self,
        src: NodeId,
        dst: NodeId,
        created_at: SimTime,
        size_bits: u64,
        seg: DataSegment,
    ) -> Packet {
        super::Network::make_data_packet(self, src, dst, created_at, size_bits, seg)
    }

    fn send_from_host(&mut self, host: NodeId, pkt: Packet, sim: &mut Simulator) {
        super::Network::send_from_host(self, host, pkt, sim)
    }

    fn metrics_mut(&mut self) -> &mut MetricsRecorder {
        &mut self.metrics
    }
}
