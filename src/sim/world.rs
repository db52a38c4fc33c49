//! 世界 trait
//!
//! 定义仿真世界接口。

use super::event::{Event, EventHandle};
use super::simulator::Simulator;

/// 仿真世界：由业务层实现（例如网络拓扑/统计等）。
///
/// 仿真器把每个到期事件连同它自己的句柄交给 `handle`，由实现者分派。
pub trait World {
    fn handle(&mut self, handle: EventHandle, ev: Event, sim: &mut Simulator);
    fn on_tick(&mut self, _sim: &mut Simulator) {}
}
