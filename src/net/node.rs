//! 节点类型
//!
//! 定义网络节点 trait；具体实现见主机（host）与路由器（router）。

use super::id::{LinkId, NodeId};
use super::network::Network;
use super::packet::Packet;
use crate::sim::Simulator;
use std::any::Any;

/// 节点接口
pub trait Node: Send {
    /// 获取节点标识符
    fn id(&self) -> NodeId;

    /// 获取节点名称
    fn name(&self) -> &str;

    /// 记录与本节点相连的链路
    fn add_link(&mut self, link: LinkId);

    /// 处理到达的数据包
    fn on_packet(&mut self, pkt: Packet, sim: &mut Simulator, net: &mut Network);

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
