//! 接收端：累计确认 + 乱序缓存

use std::collections::BTreeSet;

/// 一次数据到达的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt {
    /// 要回送的累计 ACK（期望的下一个序号）
    pub ack: u64,
    /// 本次新变为按序可交付的 packet 数
    pub newly_delivered: u64,
    /// 是否为已经收过的重复 packet
    pub duplicate: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Receiver {
    next_expected: u64,
    out_of_order: BTreeSet<u64>,
    acks_sent: u64,
}

impl Receiver {
    pub fn next_expected(&self) -> u64 {
        self.next_expected
    }

    pub fn buffered(&self) -> usize {
        self.out_of_order.len()
    }

    pub fn acks_sent(&self) -> u64 {
        self.acks_sent
    }

    pub(crate) fn note_ack_sent(&mut self) {
        self.acks_sent += 1;
    }

    pub fn on_data(&mut self, seq: u64) -> Receipt {
        if seq < self.next_expected {
            return Receipt {
                ack: self.next_expected,
                newly_delivered: 0,
                duplicate: true,
            };
        }
        if seq > self.next_expected {
            let fresh = self.out_of_order.insert(seq);
            return Receipt {
                ack: self.next_expected,
                newly_delivered: 0,
                duplicate: !fresh,
            };
        }

        let before = self.next_expected;
        self.next_expected += 1;
        while self.out_of_order.remove(&self.next_expected) {
            self.next_expected += 1;
        }
        Receipt {
            ack: self.next_expected,
            newly_delivered: self.next_expected - before,
            duplicate: false,
        }
    }
}
