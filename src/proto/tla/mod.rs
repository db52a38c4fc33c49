//! 传输层算法（TLA）
//!
//! 所有算法共享 [`SenderState`] 中的序号/窗口簿记与 RTT 估计，
//! 只在收到 ACK、RTO 超时和（可选的）Vegas 定时器上表现不同。

mod go_back_n;
mod tahoe;
mod vegas;

pub use go_back_n::GoBackN;
pub use tahoe::Tahoe;
pub use vegas::Vegas;

use serde::{Deserialize, Serialize};

use super::sender::{AckClass, AckInfo, CcMode, FlowCtx, SenderState};
use crate::sim::EventHandle;

/// 重复 ACK 阈值：原始 ACK 之外再收到 3 个相同 ACK（共 4 个）
pub const DUP_ACK_THRESHOLD: u32 = 3;

pub trait Tla: std::fmt::Debug + Send {
    fn name(&self) -> &'static str;

    /// 流开始时的初始窗口
    fn initial_window(&self) -> f64 {
        1.0
    }

    fn on_flow_start(&mut self, s: &mut SenderState, cx: &mut FlowCtx<'_>) {
        let w = s.window();
        s.set_window(w, cx);
        s.send_new_packets(cx);
    }

    fn on_ack(&mut self, s: &mut SenderState, ack: AckInfo, cx: &mut FlowCtx<'_>);

    /// RTO 超时；调用方已确认定时器仍有效且仍有在途 packet
    fn on_timeout(&mut self, s: &mut SenderState, cx: &mut FlowCtx<'_>) {
        s.restart(true, true, cx);
    }

    fn on_vegas_timeout(&mut self, _s: &mut SenderState, _handle: EventHandle, _cx: &mut FlowCtx<'_>) {}
}

/// AIMD 类算法（Tahoe、Vegas）共用的 ACK 处理。
///
/// `grow_in_ca` 为假时，拥塞避免阶段不按 ACK 增长窗口（交给 Vegas 定时器）。
pub(crate) fn aimd_on_ack(
    s: &mut SenderState,
    ack: AckInfo,
    fast_retransmit: bool,
    fast_recovery: bool,
    grow_in_ca: bool,
    cx: &mut FlowCtx<'_>,
) {
    let fresh = s.sample_rtt(&ack, cx.now());
    match s.classify(ack.ack) {
        AckClass::Stale => {}
        AckClass::Duplicate(n) => {
            if fast_recovery {
                if n == DUP_ACK_THRESHOLD && s.mode != CcMode::FastRecovery {
                    s.enter_fast_recovery(cx);
                } else if n > DUP_ACK_THRESHOLD && s.mode == CcMode::FastRecovery {
                    s.inflate(cx);
                }
            } else if fast_retransmit && n == DUP_ACK_THRESHOLD {
                s.stats.fast_retransmits += 1;
                s.restart(false, true, cx);
            }
        }
        AckClass::New => {
            if s.mode == CcMode::FastRecovery {
                s.exit_fast_recovery(cx);
            } else if fresh && (s.mode == CcMode::SlowStart || grow_in_ca) {
                s.grow(cx);
            }
            s.acknowledge(ack.ack, cx);
            s.send_new_packets(cx);
        }
    }
}

fn default_gbn_window() -> u32 {
    8
}

fn default_true() -> bool {
    true
}

fn default_vegas_alpha() -> f64 {
    1.0
}

fn default_vegas_beta() -> f64 {
    3.0
}

/// 配置中选择 TLA 的描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TlaSpec {
    GoBackN {
        #[serde(default = "default_gbn_window")]
        window: u32,
        #[serde(default)]
        fast_retransmit: bool,
    },
    /// 开启快速重传的 GoBackN
    FastRetransmit {
        #[serde(default = "default_gbn_window")]
        window: u32,
    },
    Tahoe {
        #[serde(default = "default_true")]
        fast_retransmit: bool,
        #[serde(default)]
        fast_recovery: bool,
    },
    Vegas {
        #[serde(default = "default_vegas_alpha")]
        alpha: f64,
        #[serde(default = "default_vegas_beta")]
        beta: f64,
        #[serde(default = "default_true")]
        fast_retransmit: bool,
    },
}

impl Default for TlaSpec {
    fn default() -> Self {
        TlaSpec::Tahoe {
            fast_retransmit: true,
            fast_recovery: false,
        }
    }
}

impl TlaSpec {
    pub fn build(&self) -> Box<dyn Tla> {
        match *self {
            TlaSpec::GoBackN { window, fast_retransmit } => Box::new(GoBackN::new(window, fast_retransmit)),
            TlaSpec::FastRetransmit { window } => Box::new(GoBackN::new(window, true)),
            TlaSpec::Tahoe { fast_retransmit, fast_recovery } => {
                Box::new(Tahoe::new(fast_retransmit, fast_recovery))
            }
            TlaSpec::Vegas { alpha, beta, fast_retransmit } => Box::new(Vegas::new(alpha, beta, fast_retransmit)),
        }
    }
}
