//! GoBackN：固定窗口，超时后从第一个未确认 packet 全部重发。

use super::{DUP_ACK_THRESHOLD, Tla};
use crate::proto::sender::{AckClass, AckInfo, FlowCtx, SenderState};

#[derive(Debug, Clone)]
pub struct GoBackN {
    window: u32,
    fast_retransmit: bool,
}

impl GoBackN {
    pub fn new(window: u32, fast_retransmit: bool) -> Self {
        Self {
            window: window.max(1),
            fast_retransmit,
        }
    }
}

impl Tla for GoBackN {
    fn name(&self) -> &'static str {
        if self.fast_retransmit {
            "fast_retransmit"
        } else {
            "go_back_n"
        }
    }

    fn initial_window(&self) -> f64 {
        self.window as f64
    }

    fn on_ack(&mut self, s: &mut SenderState, ack: AckInfo, cx: &mut FlowCtx<'_>) {
        s.sample_rtt(&ack, cx.now());
        match s.classify(ack.ack) {
            AckClass::Stale => return,
            AckClass::Duplicate(n) => {
                if self.fast_retransmit && n == DUP_ACK_THRESHOLD {
                    s.stats.fast_retransmits += 1;
                    s.retransmit_missing(cx);
                }
            }
            AckClass::New => {
                s.acknowledge(ack.ack, cx);
            }
        }
        s.send_new_packets(cx);
    }

    fn on_timeout(&mut self, s: &mut SenderState, cx: &mut FlowCtx<'_>) {
        s.restart(true, false, cx);
    }
}
