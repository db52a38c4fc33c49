//! 单链路拓扑构建
//!
//! 拓扑结构：H1 <-> H2（用例 0）

use super::LinkOpts;
use crate::net::{LinkId, NetWorld, NodeId};

#[derive(Debug, Clone)]
pub struct SingleLinkOpts {
    pub link: LinkOpts,
}

impl Default for SingleLinkOpts {
    fn default() -> Self {
        Self {
            link: LinkOpts::mbps(10.0, 10.0, 64.0),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SingleLinkTopo {
    pub h1: NodeId,
    pub h2: NodeId,
    /// H1 -> H2
    pub forward: LinkId,
    /// H2 -> H1
    pub reverse: LinkId,
}

pub fn build_single_link(world: &mut NetWorld, opts: &SingleLinkOpts) -> SingleLinkTopo {
    let h1 = world.net.add_host("H1");
    let h2 = world.net.add_host("H2");
    let l = opts.link;
    let (forward, reverse) = world
        .net
        .connect_duplex(h1, h2, "L1", l.latency, l.rate_bps, l.buffer_bits);
    SingleLinkTopo {
        h1,
        h2,
        forward,
        reverse,
    }
}
