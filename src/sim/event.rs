//! 仿真事件
//!
//! 事件是一个带标签的枚举：每个变体只携带定位目标组件所需的最小负载，
//! 由 `World::handle` 按 `EventKind` 分派到对应组件的处理函数。

use crate::net::{FlowId, LinkId, NodeId, Packet};
use std::fmt;

/// 已调度事件的句柄（即 FIFO 决胜用的序列号）。
///
/// 定时器类事件的处理函数用它判断自己是否仍是“当前”定时器。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventHandle(pub u64);

/// 仿真事件
#[derive(Debug)]
pub enum Event {
    /// 流开始发送
    FlowStart { flow: FlowId },
    /// 链路完成一次序列化发送，可以发送缓冲区中的下一个 packet
    LinkAvailable { link: LinkId },
    /// packet 经由 `link` 到达节点 `to`
    PacketReceipt {
        to: NodeId,
        link: LinkId,
        pkt: Packet,
    },
    /// 流的重传定时器到期（可能已过期失效）
    PacketTimeOut { flow: FlowId },
    /// 路由器周期性广播路由表
    RoutingTableOutdated { router: NodeId },
    /// Vegas 每 RTT 一次的窗口调整定时器
    VegasTimeOut { flow: FlowId },
}

/// 事件类别（分派表的键）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    FlowStart,
    LinkAvailable,
    PacketReceipt,
    PacketTimeOut,
    RoutingTableOutdated,
    VegasTimeOut,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::FlowStart { .. } => EventKind::FlowStart,
            Event::LinkAvailable { .. } => EventKind::LinkAvailable,
            Event::PacketReceipt { .. } => EventKind::PacketReceipt,
            Event::PacketTimeOut { .. } => EventKind::PacketTimeOut,
            Event::RoutingTableOutdated { .. } => EventKind::RoutingTableOutdated,
            Event::VegasTimeOut { .. } => EventKind::VegasTimeOut,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::FlowStart => "FlowStart",
            EventKind::LinkAvailable => "LinkAvailable",
            EventKind::PacketReceipt => "PacketReceipt",
            EventKind::PacketTimeOut => "PacketTimeOut",
            EventKind::RoutingTableOutdated => "RoutingTableOutdated",
            EventKind::VegasTimeOut => "VegasTimeOut",
        };
        f.write_str(s)
    }
}
