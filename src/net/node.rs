//! 节点类型
//!
//! 定义网络节点 trait 与主机实现。路由器见 `router.rs`。

use super::id::{FlowId, LinkId, NodeId};
use super::network::Network;
use super::packet::Packet;
use crate::sim::Simulator;
use tracing::{debug, trace, warn};

/// 节点接口
pub trait Node: Send + std::fmt::Debug {
    /// 获取节点标识符（即地址）
    fn id(&self) -> NodeId;

    /// 获取节点名称
    fn name(&self) -> &str;

    /// 是否为路由器（路由通告只发给路由器邻居）
    fn is_router(&self) -> bool {
        false
    }

    /// 新建一条以本节点为源的出链路
    fn attach_link(&mut self, link: LinkId, peer: NodeId, peer_is_router: bool, net: &Network);

    /// 处理经由 `link` 到达的数据包
    fn on_packet(&mut self, pkt: Packet, link: LinkId, sim: &mut Simulator, net: &mut Network);

    /// 路由表过期定时器；只有路由器关心
    fn on_routing_table_outdated(&mut self, _sim: &mut Simulator, _net: &mut Network) {}

    /// 在已知全部主机地址后初始化（路由器据此建表）
    fn initialize(&mut self, _hosts: &[NodeId], _net: &Network) {}

    fn as_host(&self) -> Option<&Host> {
        None
    }

    fn as_host_mut(&mut self) -> Option<&mut Host> {
        None
    }

    fn as_router(&self) -> Option<&super::router::Router> {
        None
    }
}

/// 主机节点：只有一条出链路，承载若干流（作为源或目的）。
#[derive(Debug)]
pub struct Host {
    id: NodeId,
    name: String,
    link: Option<LinkId>,
    flows: Vec<FlowId>,
}

impl Host {
    /// 创建新主机
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            link: None,
            flows: Vec::new(),
        }
    }

    pub fn link(&self) -> Option<LinkId> {
        self.link
    }

    pub fn flows(&self) -> &[FlowId] {
        &self.flows
    }

    pub(crate) fn add_flow(&mut self, flow: FlowId) {
        if !self.flows.contains(&flow) {
            self.flows.push(flow);
        }
    }
}

impl Node for Host {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn attach_link(&mut self, link: LinkId, peer: NodeId, _peer_is_router: bool, _net: &Network) {
        if let Some(old) = self.link {
            warn!(host = %self.name, ?old, new = ?link, ?peer, "主机只有一条出链路，替换旧链路");
        }
        self.link = Some(link);
    }

    #[tracing::instrument(skip(self, sim, net), fields(node_name = %self.name(), node_id = ?self.id(), pkt_id = pkt.id))]
    fn on_packet(&mut self, pkt: Packet, link: LinkId, sim: &mut Simulator, net: &mut Network) {
        debug!("🖥️  Host 处理数据包");
        trace!(src = ?pkt.src, dst = ?pkt.dst, ?link, "数据包信息");

        if pkt.dst != self.id || pkt.is_routing() {
            // 主机不转发，也不参与路由协议
            debug!("不是发给本主机的数据，丢弃");
            return;
        }
        net.dispatch_to_flow(self.id, &self.flows, pkt, sim);
    }

    fn as_host(&self) -> Option<&Host> {
        Some(self)
    }

    fn as_host_mut(&mut self) -> Option<&mut Host> {
        Some(self)
    }
}
