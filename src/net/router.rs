//! 路由器
//!
//! 路由器维护距离向量路由表，周期性向相邻路由器发送通告请求；
//! 收到请求立即回送自己的路由表（响应），收到响应则松弛本地表。
//! 数据包按表查下一跳转发，查不到时走默认网关（第一条出链路）。

use super::id::{LinkId, NodeId};
use super::network::Network;
use super::node::Node;
use super::packet::{Packet, Payload, RoutingUpdate};
use super::routing::{RouteMetric, RoutingTable};
use crate::sim::{Event, SimTime, Simulator};
use tracing::{debug, info, trace, warn};

/// 路由器的一条出链路
#[derive(Debug, Clone)]
pub struct Port {
    pub link: LinkId,
    pub peer: NodeId,
    pub peer_is_router: bool,
    pub latency: SimTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterState {
    Uninitialized,
    Active,
}

#[derive(Debug)]
pub struct Router {
    id: NodeId,
    name: String,
    ports: Vec<Port>,
    table: RoutingTable,
    state: RouterState,
    adverts_sent: u64,
    updates_applied: u64,
}

impl Router {
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ports: Vec::new(),
            table: RoutingTable::new(),
            state: RouterState::Uninitialized,
            adverts_sent: 0,
            updates_applied: 0,
        }
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn state(&self) -> RouterState {
        self.state
    }

    pub fn adverts_sent(&self) -> u64 {
        self.adverts_sent
    }

    pub fn updates_applied(&self) -> u64 {
        self.updates_applied
    }

    /// 默认网关：第一条出链路的对端；没有出链路时为自身
    pub fn default_gateway(&self) -> NodeId {
        self.ports.first().map(|p| p.peer).unwrap_or(self.id)
    }

    fn port_to(&self, peer: NodeId) -> Option<&Port> {
        self.ports.iter().find(|p| p.peer == peer)
    }

    /// 为数据包选择出链路
    pub fn map_route(&self, pkt: &Packet) -> Option<LinkId> {
        let next_hop = self
            .table
            .get(pkt.dst)
            .map(|r| r.next_hop)
            .unwrap_or_else(|| self.default_gateway());
        self.port_to(next_hop)
            .or_else(|| self.ports.first())
            .map(|p| p.link)
    }

    /// 向所有相邻路由器（不含主机）发送路由表通告
    fn advertise(&mut self, sim: &mut Simulator, net: &mut Network) {
        let snapshot = self.table.snapshot();
        let now = sim.now();
        for port in self.ports.iter().filter(|p| p.peer_is_router) {
            let pkt = net.make_routing_packet(
                self.id,
                port.peer,
                now,
                RoutingUpdate {
                    table: snapshot.clone(),
                    ack: false,
                },
            );
            trace!(router = %self.name, peer = ?port.peer, "发送路由通告请求");
            net.link_add(port.link, pkt, sim);
            self.adverts_sent += 1;
        }
    }

    fn respond(&mut self, request: &Packet, sim: &mut Simulator, net: &mut Network) {
        let Some(port) = self.port_to(request.src) else {
            warn!(router = %self.name, from = ?request.src, "没有回到请求方的链路，忽略路由请求");
            return;
        };
        let link = port.link;
        let pkt = net.make_routing_packet(
            self.id,
            request.src,
            request.created_at,
            RoutingUpdate {
                table: self.table.snapshot(),
                ack: true,
            },
        );
        net.link_add(link, pkt, sim);
        self.adverts_sent += 1;
    }

    fn update_table(&mut self, response: &Packet, advert: &RoutingUpdate, now: SimTime, net: &Network) {
        let edge_cost = match net.routing_config().metric {
            RouteMetric::HopCount => 1.0,
            RouteMetric::Delay => now.saturating_sub(response.created_at).0 as f64 / 2.0,
        };
        let changed = self.table.relax(response.src, &advert.table, edge_cost);
        self.updates_applied += 1;
        if changed > 0 {
            debug!(router = %self.name, from = ?response.src, changed, edge_cost, "路由表已更新");
        }
    }
}

impl Node for Router {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_router(&self) -> bool {
        true
    }

    fn attach_link(&mut self, link: LinkId, peer: NodeId, peer_is_router: bool, net: &Network) {
        let latency = net.link(link).latency;
        self.ports.push(Port {
            link,
            peer,
            peer_is_router,
            latency,
        });
    }

    fn initialize(&mut self, hosts: &[NodeId], net: &Network) {
        let metric = net.routing_config().metric;
        let attached: Vec<(NodeId, f64)> = self
            .ports
            .iter()
            .filter(|p| !p.peer_is_router && hosts.contains(&p.peer))
            .map(|p| {
                let cost = match metric {
                    RouteMetric::HopCount => 1.0,
                    RouteMetric::Delay => p.latency.0 as f64,
                };
                (p.peer, cost)
            })
            .collect();
        self.table.initialize(hosts, self.default_gateway(), &attached);
        self.state = RouterState::Active;
        info!(router = %self.name, routes = self.table.len(), "路由表已初始化");
    }

    #[tracing::instrument(skip(self, sim, net), fields(node_name = %self.name(), node_id = ?self.id(), pkt_id = pkt.id))]
    fn on_packet(&mut self, pkt: Packet, link: LinkId, sim: &mut Simulator, net: &mut Network) {
        debug!("🔀 Router 处理数据包");
        trace!(src = ?pkt.src, dst = ?pkt.dst, ?link, "数据包信息");

        match &pkt.payload {
            Payload::Data(_) => match self.map_route(&pkt) {
                Some(out) => net.link_add(out, pkt, sim),
                None => warn!(router = %self.name, "路由器没有出链路，丢弃数据包"),
            },
            Payload::Routing(upd) if !upd.ack => self.respond(&pkt, sim, net),
            Payload::Routing(upd) => self.update_table(&pkt, upd, sim.now(), net),
        }
    }

    fn on_routing_table_outdated(&mut self, sim: &mut Simulator, net: &mut Network) {
        if self.state == RouterState::Uninitialized {
            debug!(router = %self.name, "路由器尚未初始化，跳过通告");
            return;
        }
        self.advertise(sim, net);
        if net.routing_active() {
            let interval = net.routing_config().interval();
            sim.schedule_in(interval, Event::RoutingTableOutdated { router: self.id });
        } else {
            debug!(router = %self.name, "所有流已完成，停止周期通告");
        }
    }

    fn as_router(&self) -> Option<&Router> {
        Some(self)
    }
}
