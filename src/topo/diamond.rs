//! 菱形拓扑构建
//!
//! 拓扑结构（用例 1）：
//! ```text
//!            R2
//!          /    \
//! H1 - R1        R4 - H2
//!          \    /
//!            R3
//! ```

use super::LinkOpts;
use crate::net::{NetWorld, NodeId};

#[derive(Debug, Clone)]
pub struct DiamondOpts {
    pub host_link: LinkOpts,
    pub core_link: LinkOpts,
}

impl Default for DiamondOpts {
    fn default() -> Self {
        Self {
            host_link: LinkOpts::mbps(12.5, 10.0, 64.0),
            core_link: LinkOpts::mbps(10.0, 10.0, 64.0),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DiamondTopo {
    pub h1: NodeId,
    pub h2: NodeId,
    pub routers: [NodeId; 4],
}

pub fn build_diamond(world: &mut NetWorld, opts: &DiamondOpts) -> DiamondTopo {
    let net = &mut world.net;
    let h1 = net.add_host("H1");
    let h2 = net.add_host("H2");
    let r = [
        net.add_router("R1"),
        net.add_router("R2"),
        net.add_router("R3"),
        net.add_router("R4"),
    ];

    let (hl, cl) = (opts.host_link, opts.core_link);
    net.connect_duplex(h1, r[0], "L0", hl.latency, hl.rate_bps, hl.buffer_bits);
    net.connect_duplex(r[0], r[1], "L1", cl.latency, cl.rate_bps, cl.buffer_bits);
    net.connect_duplex(r[0], r[2], "L2", cl.latency, cl.rate_bps, cl.buffer_bits);
    net.connect_duplex(r[1], r[3], "L3", cl.latency, cl.rate_bps, cl.buffer_bits);
    net.connect_duplex(r[2], r[3], "L4", cl.latency, cl.rate_bps, cl.buffer_bits);
    net.connect_duplex(r[3], h2, "L5", hl.latency, hl.rate_bps, hl.buffer_bits);

    DiamondTopo { h1, h2, routers: r }
}
