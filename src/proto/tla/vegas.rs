//! TCP Vegas：基于时延的拥塞控制
//!
//! 每个 RTT 由独立定时器比较期望吞吐 `W/base_rtt` 与实际吞吐 `W/srtt`，
//! 差值 `diff = W·(1 - base_rtt/srtt)`（单位：packet）：
//! - `diff < alpha`：W += 1
//! - `diff > beta`：W -= 1
//! - 其余保持不变
//!
//! 规则在慢启动与拥塞避免阶段都生效（快速恢复期间暂停）；
//! 慢启动阶段若 `diff > beta`，在减窗的同时结束慢启动（`ssthresh` 取减后的 W）。

use tracing::debug;

use super::{Tla, aimd_on_ack};
use crate::proto::sender::{AckInfo, CcMode, FlowCtx, SenderState};
use crate::sim::{EventHandle, SimTime};

#[derive(Debug, Clone)]
pub struct Vegas {
    alpha: f64,
    beta: f64,
    fast_retransmit: bool,
    timer: Option<EventHandle>,
}

impl Vegas {
    pub fn new(alpha: f64, beta: f64, fast_retransmit: bool) -> Self {
        Self {
            alpha,
            beta: beta.max(alpha),
            fast_retransmit,
            timer: None,
        }
    }

    fn arm(&mut self, s: &SenderState, cx: &mut FlowCtx<'_>) {
        let Some(srtt) = s.rtt.srtt() else {
            return;
        };
        let period = srtt.max(SimTime(1));
        self.timer = Some(cx.schedule_vegas_timer(period));
    }

    /// 期望与实际吞吐之差（packet）
    pub fn diff(window: f64, base_rtt: SimTime, srtt: SimTime) -> f64 {
        if srtt.0 == 0 {
            return 0.0;
        }
        window * (1.0 - base_rtt.0 as f64 / srtt.0 as f64)
    }
}

impl Tla for Vegas {
    fn name(&self) -> &'static str {
        "vegas"
    }

    fn on_ack(&mut self, s: &mut SenderState, ack: AckInfo, cx: &mut FlowCtx<'_>) {
        aimd_on_ack(s, ack, self.fast_retransmit, false, false, cx);
        if self.timer.is_none() && !s.is_complete() {
            self.arm(s, cx);
        }
    }

    fn on_vegas_timeout(&mut self, s: &mut SenderState, handle: EventHandle, cx: &mut FlowCtx<'_>) {
        if self.timer != Some(handle) {
            return;
        }
        self.timer = None;
        if s.is_complete() {
            return;
        }
        if let (Some(base), Some(srtt)) = (s.rtt.min_rtt(), s.rtt.srtt()) {
            let diff = Self::diff(s.window(), base, srtt);
            if s.mode != CcMode::FastRecovery {
                if diff < self.alpha {
                    let w = s.window() + 1.0;
                    s.set_window(w, cx);
                    s.send_new_packets(cx);
                } else if diff > self.beta {
                    let w = s.window() - 1.0;
                    s.set_window(w, cx);
                    if s.mode == CcMode::SlowStart {
                        s.ssthresh = s.window();
                        s.mode = CcMode::CongestionAvoidance;
                    }
                }
            }
            debug!(flow = ?cx.flow, diff, window = s.window(), mode = ?s.mode, "Vegas 调整窗口");
        }
        self.arm(s, cx);
    }
}
