//! 网络拓扑管理
//!
//! 持有节点、单向链路、流表与统计信息，负责链路的排队/传输、
//! 数据包交付以及路由器定时器的驱动。

use std::collections::HashMap;

use super::id::{FlowId, LinkId, NodeId};
use super::link::Link;
use super::node::{Host, Node};
use super::packet::{DataSegment, Packet, Payload, RoutingUpdate};
use super::router::Router;
use super::routing::RoutingConfig;
use super::stats::Stats;
use crate::metrics::MetricsRecorder;
use crate::proto::{FlowTable, TransportConfig};
use crate::sim::{Event, SimTime, Simulator};
use tracing::{debug, info, trace, warn};

/// 在发送主机出口丢弃下一个匹配的 packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DropRule {
    pub flow: FlowId,
    pub seq: u64,
    pub ack: bool,
}

/// 网络拓扑
#[derive(Debug, Default)]
pub struct Network {
    nodes: Vec<Option<Box<dyn Node>>>,
    node_names: Vec<String>,
    links: Vec<Link>,
    edges: HashMap<(NodeId, NodeId), LinkId>,
    /// 主机唯一的出链路（节点被取出处理时仍可查询）
    host_links: HashMap<NodeId, LinkId>,
    hosts: Vec<NodeId>,
    routers: Vec<NodeId>,
    next_pkt_id: u64,
    routing: RoutingConfig,
    pub(crate) drop_rules: Vec<DropRule>,
    pub transport: TransportConfig,
    pub flows: FlowTable,
    pub stats: Stats,
    pub metrics: MetricsRecorder,
}

impl Network {
    pub fn new(routing: RoutingConfig, transport: TransportConfig) -> Self {
        Self {
            routing,
            transport,
            ..Self::default()
        }
    }

    /// 添加主机节点
    pub fn add_host(&mut self, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        let name = name.into();
        self.node_names.push(name.clone());
        self.nodes.push(Some(Box::new(Host::new(id, name))));
        self.hosts.push(id);
        id
    }

    /// 添加路由器节点
    pub fn add_router(&mut self, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        let name = name.into();
        self.node_names.push(name.clone());
        self.nodes.push(Some(Box::new(Router::new(id, name))));
        self.routers.push(id);
        id
    }

    /// 连接两个节点（创建单向链路）
    pub fn connect(
        &mut self,
        from: NodeId,
        to: NodeId,
        name: impl Into<String>,
        latency: SimTime,
        rate_bps: u64,
        buffer_bits: u64,
    ) -> LinkId {
        let id = LinkId(self.links.len());
        let name = name.into();
        debug!(link = %name, ?from, ?to, ?latency, rate_bps, buffer_bits, "创建单向链路");
        self.links
            .push(Link::new(id, name, from, to, latency, rate_bps, buffer_bits));
        self.edges.insert((from, to), id);

        let peer_is_router = self.node(to).is_router();
        let mut node = self.nodes[from.0].take().expect("node exists");
        if !node.is_router() {
            self.host_links.insert(from, id);
        }
        node.attach_link(id, to, peer_is_router, self);
        self.nodes[from.0] = Some(node);
        id
    }

    /// 创建一条物理链路：`<name>a` 为 a→b，`<name>b` 为 b→a
    pub fn connect_duplex(
        &mut self,
        a: NodeId,
        b: NodeId,
        name: &str,
        latency: SimTime,
        rate_bps: u64,
        buffer_bits: u64,
    ) -> (LinkId, LinkId) {
        let ab = self.connect(a, b, format!("{name}a"), latency, rate_bps, buffer_bits);
        let ba = self.connect(b, a, format!("{name}b"), latency, rate_bps, buffer_bits);
        (ab, ba)
    }

    pub fn node(&self, id: NodeId) -> &dyn Node {
        self.nodes[id.0]
            .as_deref()
            .unwrap_or_else(|| panic!("node {id:?} is checked out"))
    }

    pub fn node_name(&self, id: NodeId) -> &str {
        &self.node_names[id.0]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn host(&self, id: NodeId) -> Option<&Host> {
        self.node(id).as_host()
    }

    pub(crate) fn host_mut(&mut self, id: NodeId) -> Option<&mut Host> {
        self.nodes[id.0].as_deref_mut().and_then(|n| n.as_host_mut())
    }

    pub fn router(&self, id: NodeId) -> Option<&Router> {
        self.node(id).as_router()
    }

    pub fn hosts(&self) -> &[NodeId] {
        &self.hosts
    }

    pub fn routers(&self) -> &[NodeId] {
        &self.routers
    }

    pub fn link(&self, id: LinkId) -> &Link {
        &self.links[id.0]
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn link_between(&self, from: NodeId, to: NodeId) -> Option<LinkId> {
        self.edges.get(&(from, to)).copied()
    }

    pub fn host_link(&self, host: NodeId) -> Option<LinkId> {
        self.host_links.get(&host).copied()
    }

    pub fn routing_config(&self) -> &RoutingConfig {
        &self.routing
    }

    pub fn set_routing_config(&mut self, cfg: RoutingConfig) {
        self.routing = cfg;
    }

    /// 路由器是否继续周期通告：没有流，或仍有流未完成
    pub fn routing_active(&self) -> bool {
        self.flows.is_empty() || !self.flows.all_done()
    }

    fn next_packet_id(&mut self) -> u64 {
        let id = self.next_pkt_id;
        self.next_pkt_id = self.next_pkt_id.wrapping_add(1);
        id
    }

    /// 创建数据或 ACK packet
    pub fn make_data_packet(
        &mut self,
        src: NodeId,
        dst: NodeId,
        created_at: SimTime,
        size_bits: u64,
        seg: DataSegment,
    ) -> Packet {
        Packet {
            id: self.next_packet_id(),
            src,
            dst,
            created_at,
            size_bits,
            payload: Payload::Data(seg),
        }
    }

    /// 创建路由通告 packet（只发给直接相邻的路由器）
    pub fn make_routing_packet(
        &mut self,
        src: NodeId,
        dst: NodeId,
        created_at: SimTime,
        update: RoutingUpdate,
    ) -> Packet {
        Packet {
            id: self.next_packet_id(),
            src,
            dst,
            created_at,
            size_bits: self.routing.packet_bits,
            payload: Payload::Routing(update),
        }
    }

    /// 把 packet 交给链路：空闲则立即发送，忙则进入缓冲区（满则丢弃）
    #[tracing::instrument(skip(self, pkt, sim), fields(pkt_id = pkt.id, link = ?link))]
    pub fn link_add(&mut self, link: LinkId, pkt: Packet, sim: &mut Simulator) {
        let now = sim.now();
        if !self.links[link.0].busy {
            self.transmit(link, pkt, sim);
            return;
        }

        let l = &mut self.links[link.0];
        match l.queue.enqueue(pkt) {
            Ok(()) => {
                trace!(q_bits = l.queue.bits(), q_len = l.queue.len(), "链路忙，packet 入队");
                self.record_occupancy(link, now);
            }
            Err(pkt) => {
                debug!(
                    q_bits = l.queue.bits(),
                    cap_bits = l.queue.capacity_bits(),
                    pkt_bits = pkt.size_bits,
                    "🗑️  缓冲区已满，丢弃 packet"
                );
                self.record_occupancy(link, now);
                self.note_drop(link, now);
            }
        }
    }

    fn transmit(&mut self, link: LinkId, pkt: Packet, sim: &mut Simulator) {
        let now = sim.now();
        let l = &mut self.links[link.0];
        debug_assert!(!l.busy, "link {} already transmitting", l.name);
        l.busy = true;
        let tx = l.tx_time(pkt.size_bits);
        let arrive = now.saturating_add(l.latency).saturating_add(tx);
        let to = l.to;
        let bits = pkt.size_bits;
        trace!(link = %l.name, ?tx, ?arrive, "开始传输");

        sim.schedule(arrive, Event::PacketReceipt { to, link, pkt });
        sim.schedule(now.saturating_add(tx), Event::LinkAvailable { link });
        self.metrics.record_link_rate(now, link, bits, tx);
    }

    /// 链路完成一次序列化：空闲下来，若缓冲区非空则发送队首 packet
    pub fn on_link_available(&mut self, link: LinkId, sim: &mut Simulator) {
        let l = &mut self.links[link.0];
        l.busy = false;
        let Some(pkt) = l.queue.dequeue() else {
            return;
        };
        self.record_occupancy(link, sim.now());
        self.transmit(link, pkt, sim);
    }

    pub(crate) fn note_drop(&mut self, link: LinkId, now: SimTime) {
        self.stats.dropped_pkts += 1;
        self.metrics.record_packet_loss(now, link);
    }

    /// 将数据包交付给节点处理
    #[tracing::instrument(skip(self, pkt, sim), fields(pkt_id = pkt.id, to = ?to))]
    pub fn deliver(&mut self, to: NodeId, link: LinkId, pkt: Packet, sim: &mut Simulator) {
        trace!("📬 将数据包交付给节点处理");

        // 暂时把节点取出来，避免 &mut self 与 &mut node 的重叠借用。
        let mut node = self.nodes[to.0].take().expect("node exists");
        node.on_packet(pkt, link, sim, self);
        self.nodes[to.0] = Some(node);
    }

    /// 从主机的唯一出链路发送；先检查是否命中丢包注入规则
    pub fn send_from_host(&mut self, host: NodeId, pkt: Packet, sim: &mut Simulator) {
        let Some(link) = self.host_link(host) else {
            warn!(?host, pkt_id = pkt.id, "主机没有出链路，丢弃 packet");
            return;
        };
        if self.take_drop_rule(&pkt) {
            debug!(?host, pkt_id = pkt.id, "💥 按注入规则丢弃 packet");
            self.stats.injected_drops += 1;
            self.note_drop(link, sim.now());
            return;
        }
        self.link_add(link, pkt, sim);
    }

    /// 路由器开始工作：用全部主机地址初始化路由表，并立即通告一次
    pub fn start_routing(&mut self, sim: &mut Simulator) {
        let hosts = self.hosts.clone();
        for &r in &self.routers.clone() {
            let mut node = self.nodes[r.0].take().expect("node exists");
            node.initialize(&hosts, self);
            self.nodes[r.0] = Some(node);
            sim.schedule(sim.now(), Event::RoutingTableOutdated { router: r });
        }
        info!(routers = self.routers.len(), hosts = hosts.len(), "🧭 路由器已初始化");
    }

    pub fn on_routing_table_outdated(&mut self, router: NodeId, sim: &mut Simulator) {
        let mut node = self.nodes[router.0].take().expect("node exists");
        node.on_routing_table_outdated(sim, self);
        self.nodes[router.0] = Some(node);
    }
}
