use serde::{Deserialize, Serialize};

use crate::net::{FlowId, LinkId};
use crate::sim::SimTime;

/// 度量事件类型
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricKind {
    /// 拓扑元信息（t=0 的第一条事件）
    Meta {
        nodes: Vec<MetricNodeInfo>,
        links: Vec<MetricLinkInfo>,
        flows: Vec<MetricFlowInfo>,
    },
    /// 链路缓冲区占用（入队/出队后采样）
    BufferOccupancy { link: usize, bits: u64, packets: usize },
    /// 目的端新交付的按序数据量
    FlowRate { flow: usize, bits: u64 },
    /// 链路开始传输一个 packet，占用 `busy_ns`
    LinkRate { link: usize, bits: u64, busy_ns: u64 },
    /// 数据 packet 的端到端时延
    PacketDelay { flow: usize, delay_ns: u64 },
    /// 缓冲区溢出（或人为注入）的丢包
    PacketLoss { link: usize },
    /// 发送窗口（packet 数）
    WindowSize { flow: usize, window: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricNodeKind {
    Host,
    Router,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricNodeInfo {
    pub id: usize,
    pub name: String,
    pub kind: MetricNodeKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricLinkInfo {
    pub id: usize,
    pub name: String,
    pub from: usize,
    pub to: usize,
    /// 单向链路速率（bps）
    pub rate_bps: u64,
    /// 单向传播时延（ns）
    pub latency_ns: u64,
    /// 缓冲区容量（bits）
    pub buffer_bits: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricFlowInfo {
    pub id: usize,
    pub name: String,
    pub src: usize,
    pub dst: usize,
    pub tla: String,
    pub packets: u64,
}

/// 一条带时间戳的度量事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricEvent {
    /// 仿真时间（纳秒，和 `SimTime.0` 同口径）
    pub t_ns: u64,
    #[serde(flatten)]
    pub kind: MetricKind,
}

/// 事件收集器（存内存，仿真结束后写 JSON 文件）
#[derive(Debug, Default)]
pub struct MetricsRecorder {
    pub events: Vec<MetricEvent>,
}

impl MetricsRecorder {
    pub fn push(&mut self, at: SimTime, kind: MetricKind) {
        self.events.push(MetricEvent { t_ns: at.0, kind });
    }

    pub fn record_buffer_occupancy(&mut self, at: SimTime, link: LinkId, bits: u64, packets: usize) {
        self.push(at, MetricKind::BufferOccupancy { link: link.0, bits, packets });
    }

    pub fn record_flow_rate(&mut self, at: SimTime, flow: FlowId, bits: u64) {
        self.push(at, MetricKind::FlowRate { flow: flow.0, bits });
    }

    pub fn record_link_rate(&mut self, at: SimTime, link: LinkId, bits: u64, busy: SimTime) {
        self.push(at, MetricKind::LinkRate { link: link.0, bits, busy_ns: busy.0 });
    }

    pub fn record_packet_delay(&mut self, at: SimTime, flow: FlowId, delay: SimTime) {
        self.push(at, MetricKind::PacketDelay { flow: flow.0, delay_ns: delay.0 });
    }

    pub fn record_packet_loss(&mut self, at: SimTime, link: LinkId) {
        self.push(at, MetricKind::PacketLoss { link: link.0 });
    }

    pub fn record_window_size(&mut self, at: SimTime, flow: FlowId, window: f64) {
        self.push(at, MetricKind::WindowSize { flow: flow.0, window });
    }

    /// 丢包次数；`link` 为 `None` 时统计全部链路
    pub fn packet_losses(&self, link: Option<LinkId>) -> usize {
        self.events
            .iter()
            .filter(|e| match e.kind {
                MetricKind::PacketLoss { link: l } => link.is_none_or(|want| want.0 == l),
                _ => false,
            })
            .count()
    }

    /// 某条链路上每次传输占用的 `[start, end)` 区间
    pub fn link_busy_intervals(&self, link: LinkId) -> Vec<(u64, u64)> {
        self.events
            .iter()
            .filter_map(|e| match e.kind {
                MetricKind::LinkRate { link: l, busy_ns, .. } if l == link.0 => {
                    Some((e.t_ns, e.t_ns + busy_ns))
                }
                _ => None,
            })
            .collect()
    }

    pub fn buffer_series(&self, link: LinkId) -> Vec<(u64, u64)> {
        self.events
            .iter()
            .filter_map(|e| match e.kind {
                MetricKind::BufferOccupancy { link: l, bits, .. } if l == link.0 => Some((e.t_ns, bits)),
                _ => None,
            })
            .collect()
    }

    pub fn window_series(&self, flow: FlowId) -> Vec<(u64, f64)> {
        self.events
            .iter()
            .filter_map(|e| match e.kind {
                MetricKind::WindowSize { flow: f, window } if f == flow.0 => Some((e.t_ns, window)),
                _ => None,
            })
            .collect()
    }

    pub fn packet_delays(&self, flow: FlowId) -> Vec<(u64, u64)> {
        self.events
            .iter()
            .filter_map(|e| match e.kind {
                MetricKind::PacketDelay { flow: f, delay_ns } if f == flow.0 => Some((e.t_ns, delay_ns)),
                _ => None,
            })
            .collect()
    }

    /// 目的端累计交付的 bits
    pub fn delivered_bits(&self, flow: FlowId) -> u64 {
        self.events
            .iter()
            .filter_map(|e| match e.kind {
                MetricKind::FlowRate { flow: f, bits } if f == flow.0 => Some(bits),
                _ => None,
            })
            .sum()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.events)
    }
}
