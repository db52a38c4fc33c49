//! 仿真度量记录
//!
//! 网络在关键时刻（入队/出队、开始传输、丢包、收到数据、窗口变化）写入带时间戳的
//! 结构化事件；仿真结束后可整体导出为 JSON，或直接在测试中查询。

mod types;

pub use types::{
    MetricEvent, MetricKind, MetricLinkInfo, MetricNodeInfo, MetricNodeKind, MetricsRecorder,
    MetricFlowInfo,
};
