//! 网络世界
//!
//! 把拓扑挂到调度器的 World 接口上。各网络事件
//! （SendToLink、PacketArrival、LinkFree 等）执行时
//! 先下转型到这里，再通过 `net` 操作主机、路由器和链路。

use super::network::Network;
use crate::sim::World;
use std::any::Any;

/// 网络仿真的世界：全部状态就是拓扑本身。
#[derive(Default)]
pub struct NetWorld {
    pub net: Network,
}

impl std::fmt::Debug for NetWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetWorld").finish_non_exhaustive()
    }
}

impl World for NetWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
