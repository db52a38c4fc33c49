//! 仿真控制器
//!
//! 把校验过的用例配置装配成 `NetWorld` + `Simulator`，运行，并汇总每条流的结果。

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::config::{CaseSpec, ConfigError};
use crate::net::{NetWorld, Network, NodeId};
use crate::proto::{CcMode, SenderStats};
use crate::sim::{SimTime, Simulator};

/// 单条流的运行结果
#[derive(Debug, Clone, Serialize)]
pub struct FlowSummary {
    pub name: String,
    pub tla: String,
    pub packets: u64,
    pub acked: u64,
    pub done: bool,
    pub done_ms: Option<f64>,
    pub window: f64,
    pub mode: CcMode,
    pub rto_ms: f64,
    pub sender: SenderStats,
    pub acks_sent: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub end_ms: f64,
    pub events: u64,
    pub dropped_pkts: u64,
    pub flows: Vec<FlowSummary>,
}

pub struct Controller {
    pub world: NetWorld,
    pub sim: Simulator,
}

impl Controller {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let spec = CaseSpec::from_path(path)?;
        Self::from_case(&spec)
    }

    /// 校验配置并装配网络；路由器在 t=0 初始化，流在各自的开始时间启动
    pub fn from_case(spec: &CaseSpec) -> Result<Self, ConfigError> {
        spec.validate()?;
        let mut net = Network::new(spec.routing.clone(), spec.transport.clone());

        let mut ids: HashMap<&str, NodeId> = HashMap::new();
        for name in &spec.hosts {
            ids.insert(name, net.add_host(name.as_str()));
        }
        for name in &spec.routers {
            ids.insert(name, net.add_router(name.as_str()));
        }
        for link in &spec.links {
            let (a, b) = link.endpoints()?;
            net.connect_duplex(
                ids[a],
                ids[b],
                &link.name,
                link.latency()?,
                link.rate_bps()?,
                link.buffer_bits()?,
            );
        }
        for flow in &spec.flows {
            let (src, dst) = flow.endpoints()?;
            net.add_flow(
                flow.name.as_str(),
                ids[src],
                ids[dst],
                flow.total_bits()?,
                flow.start_at()?,
                &flow.tla,
            );
        }
        info!(
            hosts = spec.hosts.len(),
            routers = spec.routers.len(),
            links = spec.links.len(),
            flows = spec.flows.len(),
            "用例装配完成"
        );
        Ok(Self::from_network(net))
    }

    /// 用已构建好的网络启动：记录 meta、初始化路由、调度流
    pub fn from_network(net: Network) -> Self {
        let mut world = NetWorld::new(net);
        let mut sim = Simulator::default();
        world.net.emit_metrics_meta();
        world.net.start_routing(&mut sim);
        world.net.schedule_flow_starts(&mut sim);
        Self { world, sim }
    }

    /// 运行到事件耗尽，或到 `until`（含）为止
    pub fn run(&mut self, until: Option<SimTime>) {
        match until {
            Some(t) => self.sim.run_until(t, &mut self.world),
            None => self.sim.run(&mut self.world),
        }
    }

    pub fn summary(&self) -> RunSummary {
        let net = &self.world.net;
        let flows = net
            .flows
            .iter()
            .map(|f| {
                let s = f.sender();
                FlowSummary {
                    name: f.name.clone(),
                    tla: f.tla_name().to_string(),
                    packets: f.packet_count(),
                    acked: s.cum_ack(),
                    done: f.is_done(),
                    done_ms: f.done_at().map(SimTime::as_millis_f64),
                    window: s.window(),
                    mode: s.mode,
                    rto_ms: s.rtt.rto().as_millis_f64(),
                    sender: s.stats,
                    acks_sent: f.receiver().acks_sent(),
                }
            })
            .collect();
        RunSummary {
            end_ms: self.sim.now().as_millis_f64(),
            events: self.sim.executed(),
            dropped_pkts: net.stats.dropped_pkts,
            flows,
        }
    }
}
