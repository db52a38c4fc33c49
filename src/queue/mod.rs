//! 队列策略（Queue disciplines）
//!
//! 链路发送端的有界缓冲区。目前只有尾丢弃的 FIFO `Buffer`。

use crate::net::Packet;

mod drop_tail;

pub use drop_tail::Buffer;

/// 原始实验中所有 packet 的默认大小（比特）
pub const DEFAULT_PACKET_BITS: u64 = 8192;

/// 以“packet 个数”表示的缓冲区容量换算为比特
pub fn bits_from_pkts(pkts: u64) -> u64 {
    pkts.saturating_mul(DEFAULT_PACKET_BITS)
}

/// Packet 队列抽象
pub trait PacketQueue: std::fmt::Debug + Send {
    /// 入队：成功返回 Ok；若被丢弃则返回 Err(pkt)，占用量保持不变
    fn enqueue(&mut self, pkt: Packet) -> Result<(), Packet>;
    /// 出队：按队列策略返回下一个 packet
    fn dequeue(&mut self) -> Option<Packet>;

    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn bits(&self) -> u64;
    fn capacity_bits(&self) -> u64;
}
