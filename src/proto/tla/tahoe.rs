//! TCP Tahoe：慢启动 + 拥塞避免，可选快速重传 / 快速恢复。
//!
//! 两者同时开启时快速恢复优先（它本身包含对缺失 packet 的重传）。

use super::{Tla, aimd_on_ack};
use crate::proto::sender::{AckInfo, FlowCtx, SenderState};

#[derive(Debug, Clone)]
pub struct Tahoe {
    fast_retransmit: bool,
    fast_recovery: bool,
}

impl Tahoe {
    pub fn new(fast_retransmit: bool, fast_recovery: bool) -> Self {
        Self {
            fast_retransmit,
            fast_recovery,
        }
    }
}

impl Tla for Tahoe {
    fn name(&self) -> &'static str {
        if self.fast_recovery { "reno" } else { "tahoe" }
    }

    fn on_ack(&mut self, s: &mut SenderState, ack: AckInfo, cx: &mut FlowCtx<'_>) {
        aimd_on_ack(s, ack, self.fast_retransmit, self.fast_recovery, true, cx);
    }
}
