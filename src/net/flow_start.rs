//! 流启动事件

use super::host::Host;
use super::id::NodeId;
use super::net_world::NetWorld;
use crate::sim::{Event, Simulator, World};

/// 事件：在流的起始时刻唤醒发送端主机。
#[derive(Debug)]
pub struct FlowStart {
    pub host: NodeId,
}

impl Event for FlowStart {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let FlowStart { host } = *self;
        let w = world
            .as_any_mut()
            .downcast_mut::<NetWorld>()
            .expect("world must be NetWorld");
        if let Some(h) = w.net.node_as_mut::<Host>(host) {
            h.on_flow_start(sim);
        }
    }
}
