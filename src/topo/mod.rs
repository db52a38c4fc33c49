//! 拓扑构建
//!
//! 课程实验中的三个标准用例，直接构建到 `NetWorld` 上（不经过配置文件）。

pub mod chain;
pub mod diamond;
pub mod single_link;

use crate::sim::SimTime;

/// 一条物理链路的参数
#[derive(Debug, Clone, Copy)]
pub struct LinkOpts {
    pub rate_bps: u64,
    pub latency: SimTime,
    pub buffer_bits: u64,
}

impl LinkOpts {
    pub fn mbps(rate_mbps: f64, delay_ms: f64, buffer_kb: f64) -> Self {
        Self {
            rate_bps: (rate_mbps * 1e6).round() as u64,
            latency: SimTime::from_millis_f64(delay_ms),
            buffer_bits: (buffer_kb * 8000.0).round() as u64,
        }
    }
}
