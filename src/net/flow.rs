//! 流定义
//!
//! 一条流是主机的发送契约：从 startTime 开始，以 FLOW_PACKET_SIZE
//! 为单位把 totalBytes 送达对端。

use super::id::NodeId;
use super::packet::FLOW_PACKET_SIZE;
use crate::cc::CongestionMode;
use crate::sim::SimTime;

/// 网络流
#[derive(Debug, Clone)]
pub struct Flow {
    pub id: String,
    pub src: NodeId,
    pub dest: NodeId,
    pub amount_bytes: u64,
    pub start: SimTime,
    pub congestion: CongestionMode,
}

impl Flow {
    /// 整条流的数据包总数 ⌈totalBytes / FLOW_PACKET_SIZE⌉。
    /// 发送端 base 序号到达该值即流结束。
    pub fn packet_count(&self) -> u64 {
        self.amount_bytes.div_ceil(FLOW_PACKET_SIZE)
    }
}
