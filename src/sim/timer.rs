//! 周期定时器
//!
//! 周期事件放在独立的小顶堆里，与一次性事件分开管理：
//! 每次触发后按 firedTime + interval 重新入堆，长周期定时器不会漂移。

use super::simulator::Simulator;
use super::time::SimTime;
use super::world::World;
use std::cmp::Ordering;

/// 周期事件：按固定间隔反复触发，触发时不消耗自身。
pub trait PeriodicEvent: Send + 'static {
    fn fire(&mut self, sim: &mut Simulator, world: &mut dyn World);
}

/// 定时器表项。
pub(crate) struct Timer {
    pub(crate) next_at: SimTime,
    pub(crate) interval: SimTime,
    pub(crate) seq: u64,
    pub(crate) ev: Box<dyn PeriodicEvent>,
}

impl Ord for Timer {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.next_at.cmp(&other.next_at) {
            Ordering::Equal => self.seq.cmp(&other.seq),
            ord => ord,
        }
        .reverse()
    }
}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        self.next_at == other.next_at && self.seq == other.seq
    }
}

impl Eq for Timer {}
