//! 网络世界实现
//!
//! 持有网络拓扑，并按事件类型把事件分派给对应组件的处理函数。

use std::collections::BTreeMap;

use tracing::trace;

use super::network::Network;
use crate::sim::{Event, EventHandle, EventKind, Simulator, World};

/// 一个默认的网络世界实现：持有 Network。
#[derive(Debug, Default)]
pub struct NetWorld {
    pub net: Network,
    /// 已处理的事件数（按类型）
    pub event_counts: BTreeMap<EventKind, u64>,
}

impl NetWorld {
    pub fn new(net: Network) -> Self {
        Self {
            net,
            event_counts: BTreeMap::new(),
        }
    }

    pub fn count(&self, kind: EventKind) -> u64 {
        self.event_counts.get(&kind).copied().unwrap_or(0)
    }
}

impl World for NetWorld {
    fn handle(&mut self, handle: EventHandle, ev: Event, sim: &mut Simulator) {
        *self.event_counts.entry(ev.kind()).or_insert(0) += 1;
        trace!(?handle, kind = %ev.kind(), "分派事件");
        match ev {
            Event::FlowStart { flow } => self.net.start_flow(flow, sim),
            Event::LinkAvailable { link } => self.net.on_link_available(link, sim),
            Event::PacketReceipt { to, link, pkt } => self.net.deliver(to, link, pkt, sim),
            Event::PacketTimeOut { flow } => self.net.on_flow_timeout(flow, handle, sim),
            Event::RoutingTableOutdated { router } => self.net.on_routing_table_outdated(router, sim),
            Event::VegasTimeOut { flow } => self.net.on_vegas_timeout(flow, handle, sim),
        }
    }
}
