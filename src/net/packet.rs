//! 数据包类型
//!
//! 密封的 tagged union：流数据包、累计 ACK、静态/动态路由包。
//! 身份（相等与哈希）由全局唯一的字符串 id 决定。

use super::id::NodeId;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// 流数据包的载荷大小（1 KB）。
pub const FLOW_PACKET_SIZE: u64 = 1024;
/// ACK 包大小。
pub const ACK_PACKET_SIZE: u64 = 64;

/// 网络数据包
#[derive(Debug, Clone)]
pub enum Packet {
    Flow(FlowPacket),
    Ack(AckPacket),
    StaticRouting(RoutingPacket),
    DynamicRouting(RoutingPacket),
}

/// 流数据包：`id = "<flowId>.<seq>"`，序号从 0 开始。
#[derive(Debug, Clone)]
pub struct FlowPacket {
    pub flow_id: String,
    pub seq: u64,
    pub size_bytes: u64,
    pub src: NodeId,
    pub dest: NodeId,
}

impl FlowPacket {
    pub fn id(&self) -> String {
        format!("{}.{}", self.flow_id, self.seq)
    }
}

/// 累计 ACK：request_number 是接收端下一个期待的序号。
#[derive(Debug, Clone)]
pub struct AckPacket {
    pub flow_id: String,
    pub request_number: u64,
    /// 触发本 ACK 的流数据包 id（RTT 采样用）。
    pub trigger_id: String,
    pub src: NodeId,
    pub dest: NodeId,
}

impl AckPacket {
    pub fn id(&self) -> String {
        format!("{}.{}", self.flow_id, self.request_number)
    }
}

/// 路由包：携带发送方的开销表（不含发送方自身条目）。
/// id 来自 Network 持有的单调计数器（静态 "SR.n"，动态 "DR.n"）。
#[derive(Debug, Clone)]
pub struct RoutingPacket {
    pub index: u64,
    pub src: NodeId,
    pub dest: NodeId,
    pub cost_table: BTreeMap<NodeId, f64>,
}

impl Packet {
    /// 全局唯一标识符。
    pub fn id(&self) -> String {
        match self {
            Packet::Flow(p) => p.id(),
            Packet::Ack(p) => p.id(),
            Packet::StaticRouting(p) => format!("SR.{}", p.index),
            Packet::DynamicRouting(p) => format!("DR.{}", p.index),
        }
    }

    /// 序列化字节数：用于缓冲计量和吞吐统计。
    ///
    /// 路由包 = 头部（两个 64-bit 整数 + id 字符串）+ 每条表项 16 字节。
    pub fn size(&self) -> u64 {
        match self {
            Packet::Flow(p) => p.size_bytes,
            Packet::Ack(_) => ACK_PACKET_SIZE,
            Packet::StaticRouting(p) | Packet::DynamicRouting(p) => {
                2 * 8 + self.id().len() as u64 + 16 * p.cost_table.len() as u64
            }
        }
    }

    pub fn src(&self) -> NodeId {
        match self {
            Packet::Flow(p) => p.src,
            Packet::Ack(p) => p.src,
            Packet::StaticRouting(p) | Packet::DynamicRouting(p) => p.src,
        }
    }

    pub fn dest(&self) -> NodeId {
        match self {
            Packet::Flow(p) => p.dest,
            Packet::Ack(p) => p.dest,
            Packet::StaticRouting(p) | Packet::DynamicRouting(p) => p.dest,
        }
    }
}

impl PartialEq for Packet {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Packet {}

impl Hash for Packet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}
