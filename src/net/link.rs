//! 链路类型
//!
//! 定义单向网络链路及其传输时延计算。一条物理链路由两条方向相反的 `Link` 表示。

use super::id::{LinkId, NodeId};
use crate::queue::{Buffer, PacketQueue};
use crate::sim::SimTime;

/// 单向网络链路
#[derive(Debug)]
pub struct Link {
    pub id: LinkId,
    pub name: String,
    pub from: NodeId,
    pub to: NodeId,
    pub latency: SimTime,
    pub rate_bps: u64,
    /// 是否有 packet 正在序列化发送；同一时刻至多一个
    pub busy: bool,
    /// 发送端缓冲区（链路忙时到达的 packet 在此排队）
    pub queue: Box<dyn PacketQueue>,
}

impl Link {
    /// 创建新链路
    pub fn new(
        id: LinkId,
        name: impl Into<String>,
        from: NodeId,
        to: NodeId,
        latency: SimTime,
        rate_bps: u64,
        buffer_bits: u64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            from,
            to,
            latency,
            rate_bps,
            busy: false,
            queue: Box::new(Buffer::new(buffer_bits)),
        }
    }

    /// 计算传输指定比特数所需的时间
    pub fn tx_time(&self, bits: u64) -> SimTime {
        // ceil(bits / bps) 秒 -> 纳秒
        if self.rate_bps == 0 {
            return SimTime(u64::MAX / 4);
        }
        let nanos = ((bits as u128).saturating_mul(1_000_000_000u128)
            + (self.rate_bps as u128 - 1))
            / self.rate_bps as u128;
        SimTime(nanos.min(u64::MAX as u128) as u64)
    }
}
