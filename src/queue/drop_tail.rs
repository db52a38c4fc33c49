//! DropTail（尾丢弃）缓冲区
//!
//! 当剩余容量不足以放下整个 packet 时，直接丢弃新到达的 packet，绝不部分存储。

use std::collections::VecDeque;

use crate::net::Packet;

use super::PacketQueue;

#[derive(Debug)]
pub struct Buffer {
    capacity_bits: u64,
    cur_bits: u64,
    q: VecDeque<Packet>,
}

impl Buffer {
    pub fn new(capacity_bits: u64) -> Self {
        Self {
            capacity_bits,
            cur_bits: 0,
            q: VecDeque::new(),
        }
    }
}

impl PacketQueue for Buffer {
    fn enqueue(&mut self, pkt: Packet) -> Result<(), Packet> {
        let sz = pkt.size_bits;
        if self.cur_bits.saturating_add(sz) > self.capacity_bits {
            return Err(pkt);
        }
        self.cur_bits = self.cur_bits.saturating_add(sz);
        self.q.push_back(pkt);
        Ok(())
    }

    fn dequeue(&mut self) -> Option<Packet> {
        let pkt = self.q.pop_front()?;
        self.cur_bits = self.cur_bits.saturating_sub(pkt.size_bits);
        Some(pkt)
    }

    fn len(&self) -> usize {
        self.q.len()
    }

    fn bits(&self) -> u64 {
        self.cur_bits
    }

    fn capacity_bits(&self) -> u64 {
        self.capacity_bits
    }
}
