//! 数据包类型
//!
//! packet 是抽象记录（源、目的、时间戳、比特数），不做任何字节级编码。

use std::collections::BTreeMap;

use super::id::{FlowId, NodeId};
use super::routing::Route;
use crate::sim::SimTime;

/// 网络数据包
#[derive(Debug, Clone)]
pub struct Packet {
    pub id: u64,
    pub src: NodeId,
    pub dst: NodeId,
    /// 创建时间；ACK 与路由响应沿用被应答 packet 的时间戳，便于发送方测量 RTT
    pub created_at: SimTime,
    pub size_bits: u64,
    pub payload: Payload,
}

/// packet 负载
#[derive(Debug, Clone)]
pub enum Payload {
    /// 流数据或其确认
    Data(DataSegment),
    /// 距离向量路由通告
    Routing(RoutingUpdate),
}

/// 数据段：`ack == true` 时 `seq` 是接收方期望的下一个序号（累计确认）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataSegment {
    pub flow: FlowId,
    pub seq: u64,
    pub ack: bool,
}

/// 路由表快照；`ack == false` 为请求，`ack == true` 为响应。
#[derive(Debug, Clone)]
pub struct RoutingUpdate {
    pub table: BTreeMap<NodeId, Route>,
    pub ack: bool,
}

impl Packet {
    /// 若为数据段则返回之
    pub fn data(&self) -> Option<&DataSegment> {
        match &self.payload {
            Payload::Data(seg) => Some(seg),
            Payload::Routing(_) => None,
        }
    }

    pub fn is_ack(&self) -> bool {
        match &self.payload {
            Payload::Data(seg) => seg.ack,
            Payload::Routing(upd) => upd.ack,
        }
    }

    pub fn is_routing(&self) -> bool {
        matches!(self.payload, Payload::Routing(_))
    }

    pub fn flow(&self) -> Option<FlowId> {
        self.data().map(|seg| seg.flow)
    }
}
