//! 投递到链路事件
//!
//! 主机与路由器把包交给链路都经由此事件（对应发送端的排队点）。

use super::id::{LinkId, NodeId};
use super::net_world::NetWorld;
use super::packet::Packet;
use crate::sim::{Event, Simulator, World};
use tracing::debug;

/// 事件：`origin` 把一个 packet 交给链路发送。
#[derive(Debug)]
pub struct SendToLink {
    pub link: LinkId,
    pub origin: NodeId,
    pub packet: Packet,
}

impl Event for SendToLink {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let SendToLink {
            link,
            origin,
            packet,
        } = *self;
        let w = world
            .as_any_mut()
            .downcast_mut::<NetWorld>()
            .expect("world must be NetWorld");
        let now = sim.now();
        debug!(pkt = %packet.id(), origin = ?origin, "🚚 交付链路");
        w.net.link_mut(link).send(now, packet, origin, false, sim);
    }
}
