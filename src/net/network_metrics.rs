//! 网络层的度量采集

use crate::metrics::{MetricFlowInfo, MetricKind, MetricLinkInfo, MetricNodeInfo, MetricNodeKind};
use crate::sim::SimTime;

use super::{LinkId, Network};

impl Network {
    pub(crate) fn record_occupancy(&mut self, link: LinkId, now: SimTime) {
        let q = &self.links()[link.0].queue;
        let (bits, packets) = (q.bits(), q.len());
        self.metrics.record_buffer_occupancy(now, link, bits, packets);
    }

    /// 记录拓扑与流的名字（t=0 的 meta 事件）
    pub fn emit_metrics_meta(&mut self) {
        let nodes = (0..self.node_count())
            .map(|id| {
                let node = super::NodeId(id);
                MetricNodeInfo {
                    id,
                    name: self.node_name(node).to_string(),
                    kind: if self.node(node).is_router() {
                        MetricNodeKind::Router
                    } else {
                        MetricNodeKind::Host
                    },
                }
            })
            .collect::<Vec<_>>();
        let links = self
            .links()
            .iter()
            .map(|l| MetricLinkInfo {
                id: l.id.0,
                name: l.name.clone(),
                from: l.from.0,
                to: l.to.0,
                rate_bps: l.rate_bps,
                latency_ns: l.latency.0,
                buffer_bits: l.queue.capacity_bits(),
            })
            .collect::<Vec<_>>();
        let flows = self
            .flows
            .iter()
            .map(|f| MetricFlowInfo {
                id: f.id.0,
                name: f.name.clone(),
                src: f.src.0,
                dst: f.dst.0,
                tla: f.tla_name().to_string(),
                packets: f.packet_count(),
            })
            .collect::<Vec<_>>();
        self.metrics
            .push(SimTime::ZERO, MetricKind::Meta { nodes, links, flows });
    }
}
