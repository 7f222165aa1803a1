//! 数据包到达事件
//!
//! 包尾离开远端后触发：从线上移除该包并交给目的节点处理。

use super::id::{LinkId, NodeId};
use super::net_world::NetWorld;
use super::packet::Packet;
use crate::sim::{Event, Simulator, World};
use tracing::debug;

/// 事件：把一个 packet 交给某个节点处理。
#[derive(Debug)]
pub struct PacketArrival {
    pub link: LinkId,
    pub to: NodeId,
    pub packet: Packet,
}

impl Event for PacketArrival {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let PacketArrival { link, to, packet } = *self;
        let w = world
            .as_any_mut()
            .downcast_mut::<NetWorld>()
            .expect("world must be NetWorld");

        debug!(pkt = %packet.id(), to = ?to, now = ?sim.now(), "📨 数据包到达节点");
        w.net.link_mut(link).on_arrival(to, &packet.id());
        w.net.deliver(to, packet, sim);
    }
}
