//! 网络模拟模块
//!
//! 此模块包含网络模拟的核心组件：节点（主机/路由器）、单向链路、数据包、
//! 距离向量路由以及驱动它们的网络世界。

// 子模块声明
mod id;
mod packet;
mod api;
mod node;
mod router;
mod routing;
mod link;
mod stats;
mod network;
mod network_metrics;
mod network_proto;
mod net_world;

// 重新导出公共接口
pub use id::{FlowId, LinkId, NodeId};
pub use packet::{DataSegment, Packet, Payload, RoutingUpdate};
pub use api::NetApi;
pub use node::{Host, Node};
pub use router::{Port, Router, RouterState};
pub use routing::{Route, RouteMetric, RoutingConfig, RoutingTable};
pub use link::Link;
pub use stats::Stats;
pub use network::Network;
pub use net_world::NetWorld;
