//! 重传超时事件
//!
//! 超时不被取消；处理函数自行检查包是否仍未确认，已确认则为空操作。

use super::host::Host;
use super::id::NodeId;
use super::net_world::NetWorld;
use super::packet::FlowPacket;
use crate::sim::{Event, Simulator, World};

/// 事件：某个流数据包的重传超时到期。
#[derive(Debug)]
pub struct TimeoutEvent {
    pub host: NodeId,
    pub packet: FlowPacket,
}

impl Event for TimeoutEvent {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let TimeoutEvent { host, packet } = *self;
        let w = world
            .as_any_mut()
            .downcast_mut::<NetWorld>()
            .expect("world must be NetWorld");
        if let Some(h) = w.net.node_as_mut::<Host>(host) {
            h.on_timeout(packet, sim);
        }
    }
}
