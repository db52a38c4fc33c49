//! 链式拓扑构建
//!
//! 拓扑结构（用例 2）：R1 - R2 - R3 - R4 串联；
//! S1、S2 接 R1，T2 接 R2，S3 接 R3，T1、T3 接 R4。

use super::LinkOpts;
use crate::net::{NetWorld, NodeId};

#[derive(Debug, Clone)]
pub struct ChainOpts {
    pub host_link: LinkOpts,
    pub core_link: LinkOpts,
}

impl Default for ChainOpts {
    fn default() -> Self {
        Self {
            host_link: LinkOpts::mbps(12.5, 10.0, 128.0),
            core_link: LinkOpts::mbps(10.0, 10.0, 128.0),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChainTopo {
    /// S1, S2, S3
    pub sources: [NodeId; 3],
    /// T1, T2, T3
    pub sinks: [NodeId; 3],
    pub routers: [NodeId; 4],
}

pub fn build_chain(world: &mut NetWorld, opts: &ChainOpts) -> ChainTopo {
    let net = &mut world.net;
    let sources = [net.add_host("S1"), net.add_host("S2"), net.add_host("S3")];
    let sinks = [net.add_host("T1"), net.add_host("T2"), net.add_host("T3")];
    let r = [
        net.add_router("R1"),
        net.add_router("R2"),
        net.add_router("R3"),
        net.add_router("R4"),
    ];

    let (hl, cl) = (opts.host_link, opts.core_link);
    for (i, pair) in r.windows(2).enumerate() {
        let name = format!("L{}", i + 1);
        net.connect_duplex(pair[0], pair[1], &name, cl.latency, cl.rate_bps, cl.buffer_bits);
    }
    let access = [
        (sources[0], r[0], "LS1"),
        (sources[1], r[0], "LS2"),
        (sources[2], r[2], "LS3"),
        (sinks[0], r[3], "LT1"),
        (sinks[1], r[1], "LT2"),
        (sinks[2], r[3], "LT3"),
    ];
    for (host, router, name) in access {
        net.connect_duplex(host, router, name, hl.latency, hl.rate_bps, hl.buffer_bits);
    }

    ChainTopo {
        sources,
        sinks,
        routers: r,
    }
}
