//! 传输层
//!
//! 每条流（Flow）由一个发送端、一个接收端和一个可插拔的传输层算法（TLA）组成。
//! 发送端的窗口/在途集合/RTO 定时器等簿记在 `sender`，各 TLA 只决定对 ACK 与超时的反应。

mod flow;
mod receiver;
mod rtt;
mod sender;
pub mod tla;

pub use flow::{Flow, FlowTable, TransportConfig};
pub use receiver::{Receipt, Receiver};
pub use rtt::RttEstimator;
pub use sender::{AckClass, AckInfo, CcMode, FlowCtx, SenderState, SenderStats};
pub use tla::{Tla, TlaSpec};
