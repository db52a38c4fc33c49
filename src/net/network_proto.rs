//! 网络与流（传输层）之间的衔接：注册流、启动流、把到达主机的 packet 分派给流。

use tracing::{debug, info};

use super::network::DropRule;
use super::{FlowId, NetApi, Network, NodeId, Packet};
use crate::proto::{Flow, FlowTable, TlaSpec};
use crate::sim::{Event, EventHandle, SimTime, Simulator};

impl Network {
    /// 暂时取出流表，使流的处理函数可以同时拿到 `&mut Network`
    pub(crate) fn with_flows<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut dyn NetApi, &mut FlowTable) -> R,
    {
        let mut flows = std::mem::take(&mut self.flows);
        let result = f(self, &mut flows);
        self.flows = flows;
        result
    }

    /// 注册一条流，并挂到源/目的主机上
    pub fn add_flow(
        &mut self,
        name: impl Into<String>,
        src: NodeId,
        dst: NodeId,
        total_bits: u64,
        start_at: SimTime,
        tla: &TlaSpec,
    ) -> FlowId {
        let id = self.flows.next_id();
        let flow = Flow::new(id, name, src, dst, total_bits, start_at, tla, &self.transport);
        info!(
            flow = %flow.name,
            src = %self.node_name(src),
            dst = %self.node_name(dst),
            packets = flow.packet_count(),
            tla = flow.tla_name(),
            "注册流"
        );
        self.flows.insert(flow);
        for host in [src, dst] {
            self.host_mut(host)
                .unwrap_or_else(|| panic!("flow endpoint {host:?} is not a host"))
                .add_flow(id);
        }
        id
    }

    /// 为所有流调度 `FlowStart` 事件
    pub fn schedule_flow_starts(&self, sim: &mut Simulator) {
        for flow in self.flows.iter() {
            sim.schedule(flow.start_at, Event::FlowStart { flow: flow.id });
        }
    }

    fn flow_mut<'a>(flows: &'a mut FlowTable, id: FlowId) -> &'a mut Flow {
        flows
            .get_mut(id)
            .unwrap_or_else(|| panic!("unknown flow {id:?}"))
    }

    pub fn start_flow(&mut self, flow: FlowId, sim: &mut Simulator) {
        self.with_flows(|net, flows| Self::flow_mut(flows, flow).on_start(sim, net));
    }

    pub fn on_flow_timeout(&mut self, flow: FlowId, handle: EventHandle, sim: &mut Simulator) {
        self.with_flows(|net, flows| Self::flow_mut(flows, flow).on_timeout(handle, sim, net));
    }

    pub fn on_vegas_timeout(&mut self, flow: FlowId, handle: EventHandle, sim: &mut Simulator) {
        self.with_flows(|net, flows| Self::flow_mut(flows, flow).on_vegas_timeout(handle, sim, net));
    }

    /// 把到达主机的数据/ACK 分派给所属流。
    ///
    /// 数据按 (src, dst) 正向匹配，ACK 按反向匹配；找不到属于内部一致性错误。
    pub fn dispatch_to_flow(&mut self, host: NodeId, host_flows: &[FlowId], pkt: Packet, sim: &mut Simulator) {
        let Some(seg) = pkt.data().copied() else {
            return;
        };
        let owner = host_flows.iter().copied().find(|&id| {
            let Some(f) = self.flows.get(id) else {
                return false;
            };
            let (src, dst) = if seg.ack { (f.dst, f.src) } else { (f.src, f.dst) };
            id == seg.flow && pkt.src == src && pkt.dst == dst
        });
        let Some(owner) = owner else {
            panic!(
                "host {} received {} for flow {:?} it does not own ({:?} -> {:?})",
                self.node_name(host),
                if seg.ack { "an ack" } else { "data" },
                seg.flow,
                pkt.src,
                pkt.dst
            );
        };

        if seg.ack {
            self.stats.acks_delivered += 1;
        } else {
            self.stats.delivered_pkts += 1;
            self.stats.delivered_bits += pkt.size_bits;
        }
        self.with_flows(|net, flows| {
            let flow = Self::flow_mut(flows, owner);
            if seg.ack {
                flow.on_ack(&pkt, seg.seq, sim, net);
            } else {
                flow.on_data(&pkt, seg.seq, sim, net);
            }
        });
    }

    /// 在源主机出口丢弃该流下一个序号为 `seq` 的数据 packet
    pub fn drop_next_data(&mut self, flow: FlowId, seq: u64) {
        debug!(?flow, seq, "注入丢包规则（数据）");
        self.drop_rules.push(DropRule { flow, seq, ack: false });
    }

    /// 在目的主机出口丢弃该流下一个确认号为 `ack` 的 ACK
    pub fn drop_next_ack(&mut self, flow: FlowId, ack: u64) {
        debug!(?flow, ack, "注入丢包规则（ACK）");
        self.drop_rules.push(DropRule { flow, seq: ack, ack: true });
    }

    pub(crate) fn take_drop_rule(&mut self, pkt: &Packet) -> bool {
        let Some(seg) = pkt.data() else {
            return false;
        };
        let hit = self
            .drop_rules
            .iter()
            .position(|r| r.flow == seg.flow && r.seq == seg.seq && r.ack == seg.ack);
        match hit {
            Some(i) => {
                self.drop_rules.remove(i);
                true
            }
            None => false,
        }
    }
}
