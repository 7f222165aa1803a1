//! 链路释放事件
//!
//! 一次发送会调度两个该事件：包尾离开本端时释放同方向，
//! 包尾离开远端时释放反方向。释放后若该方向缓冲非空则续发队头。

use super::id::LinkId;
use super::link::Direction;
use super::net_world::NetWorld;
use crate::sim::{Event, Simulator, World};

/// 事件：链路朝 `dir` 方向空闲，尝试发送该方向缓冲的下一个 packet。
#[derive(Debug)]
pub struct LinkFree {
    pub link: LinkId,
    pub dir: Direction,
    /// 触发本事件的包 id；从反方向的在线集合中移除它。
    pub packet_id: String,
}

impl Event for LinkFree {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let LinkFree {
            link,
            dir,
            packet_id,
        } = *self;
        let w = world
            .as_any_mut()
            .downcast_mut::<NetWorld>()
            .expect("world must be NetWorld");
        let now = sim.now();
        w.net.link_mut(link).on_free(now, dir, &packet_id, sim);
    }
}
