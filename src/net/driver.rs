//! 网络驱动
//!
//! 以 0.001 ms 的固定步长推进时间并逐拍调用调度器，
//! 直到一次性事件队列清空或操作者请求中断。

use super::net_world::NetWorld;
use crate::sim::{SimTime, Simulator};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// 启动并运行整个仿真。
///
/// `stop` 是操作者中断旗标：置位后循环在下一拍退出，
/// 已收集的遥测仍然可以落盘。
pub fn run(world: &mut NetWorld, sim: &mut Simulator, stop: &AtomicBool) {
    world.net.bring_up(sim);
    info!("▶️  网络仿真开始");

    let mut t = sim.now();
    let mut ticks: u64 = 0;
    loop {
        if stop.load(Ordering::Relaxed) {
            info!(now = ?sim.now(), "🛑 操作者中断，仿真提前结束");
            break;
        }
        t = t.saturating_add(SimTime::TICK);
        ticks += 1;
        if !sim.step(t, world) {
            break;
        }
    }

    info!(final_time = ?sim.now(), ticks, "✅ 网络仿真结束");
}
