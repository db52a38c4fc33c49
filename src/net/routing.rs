//! 距离向量路由表
//!
//! 每个路由器维护 目的主机 -> (代价, 下一跳)。收到邻居的通告后做 Bellman-Ford 松弛：
//! - 新目的地：无条件采纳；
//! - 现有路由的下一跳就是通告者：总是采纳（即使变差），以跟踪动态边代价；
//! - 否则仅在严格更便宜时采纳。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::id::NodeId;
use crate::sim::SimTime;

/// 路由条目。不可达时 `cost` 为正无穷。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub cost: f64,
    pub next_hop: NodeId,
}

impl Route {
    pub fn unreachable(next_hop: NodeId) -> Self {
        Self {
            cost: f64::INFINITY,
            next_hop,
        }
    }

    pub fn is_reachable(&self) -> bool {
        self.cost.is_finite()
    }
}

/// 边代价的度量方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteMetric {
    /// 每跳代价为 1
    #[default]
    HopCount,
    /// 代价为时延（纳秒）：直连主机取链路传播时延，邻居边取请求/响应往返时间的一半
    Delay,
}

/// 路由协议参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub metric: RouteMetric,
    /// 周期性通告间隔（毫秒）
    pub interval_ms: f64,
    /// 路由通告 packet 大小（比特）
    pub packet_bits: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            metric: RouteMetric::HopCount,
            interval_ms: 20.0,
            packet_bits: crate::queue::DEFAULT_PACKET_BITS,
        }
    }
}

impl RoutingConfig {
    pub fn interval(&self) -> SimTime {
        SimTime::from_millis_f64(self.interval_ms)
    }
}

#[derive(Debug, Default, Clone)]
pub struct RoutingTable {
    routes: BTreeMap<NodeId, Route>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 初始化：所有已知主机默认 (∞, 默认网关)，直连主机取给定代价。
    pub fn initialize(
        &mut self,
        hosts: &[NodeId],
        default_gateway: NodeId,
        attached: &[(NodeId, f64)],
    ) {
        self.routes.clear();
        for &h in hosts {
            self.routes.insert(h, Route::unreachable(default_gateway));
        }
        for &(h, cost) in attached {
            self.routes.insert(h, Route { cost, next_hop: h });
        }
    }

    pub fn get(&self, dst: NodeId) -> Option<&Route> {
        self.routes.get(&dst)
    }

    pub fn insert(&mut self, dst: NodeId, route: Route) {
        self.routes.insert(dst, route);
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &Route)> {
        self.routes.iter()
    }

    /// 通告用快照
    pub fn snapshot(&self) -> BTreeMap<NodeId, Route> {
        self.routes.clone()
    }

    /// 用邻居 `from` 的通告松弛本地路由表，返回发生变化的条目数。
    pub fn relax(&mut self, from: NodeId, advert: &BTreeMap<NodeId, Route>, edge_cost: f64) -> usize {
        let mut changed = 0;
        for (&dst, adv) in advert {
            let candidate = Route {
                cost: adv.cost + edge_cost,
                next_hop: from,
            };
            let adopt = match self.routes.get(&dst) {
                None => true,
                Some(cur) if cur.next_hop == from => cur.cost != candidate.cost,
                Some(cur) => candidate.cost < cur.cost,
            };
            if adopt {
                self.routes.insert(dst, candidate);
                changed += 1;
            }
        }
        changed
    }
}
