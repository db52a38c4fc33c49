//! 统计信息
//!
//! 定义网络仿真统计数据结构。

use serde::Serialize;

/// 网络统计信息
#[derive(Debug, Default, Clone, Serialize)]
pub struct Stats {
    /// 交付给目的主机的数据 packet（含重复）
    pub delivered_pkts: u64,
    pub delivered_bits: u64,
    /// 交付给源主机的 ACK
    pub acks_delivered: u64,
    /// 缓冲区溢出与注入丢包的总和
    pub dropped_pkts: u64,
    pub injected_drops: u64,
}
