//! 仿真器
//!
//! 定义事件驱动仿真器，维护当前时间、一次性事件队列、周期定时器表，
//! 以及按执行顺序收集的遥测样本。

use super::event::Event;
use super::scheduled_event::ScheduledEvent;
use super::time::SimTime;
use super::timer::{PeriodicEvent, Timer};
use super::world::World;
use crate::telemetry::{MetricSample, Telemetry};
use std::collections::BinaryHeap;
use tracing::{debug, info, trace};

/// 事件驱动仿真器：维护当前时间与事件队列。
#[derive(Default)]
pub struct Simulator {
    now: SimTime,
    next_seq: u64,
    q: BinaryHeap<ScheduledEvent>,
    timers: BinaryHeap<Timer>,
    telemetry: Telemetry,
}

impl Simulator {
    /// 获取当前仿真时间
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// 调度事件在指定时间执行
    #[tracing::instrument(skip(self, ev), fields(event_type = std::any::type_name::<E>(), schedule_at = ?at))]
    pub fn schedule<E: Event>(&mut self, at: SimTime, ev: E) {
        let seq = self.next_seq;
        trace!(now = ?self.now, seq, "调度事件");

        self.next_seq = self.next_seq.wrapping_add(1);
        self.q.push(ScheduledEvent {
            at,
            seq,
            ev: Box::new(ev),
        });
    }

    /// 注册周期定时器：首次在 now + interval 触发，之后每 interval 一次。
    ///
    /// 间隔小于仿真步长属于配置错误，直接终止。
    pub fn add_timer<E: PeriodicEvent>(&mut self, now: SimTime, interval: SimTime, ev: E) {
        assert!(
            interval >= SimTime::TICK,
            "timer interval {:?} is below the simulation tick {:?}",
            interval,
            SimTime::TICK
        );
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        debug!(first_at = ?now.saturating_add(interval), ?interval, "注册周期定时器");
        self.timers.push(Timer {
            next_at: now.saturating_add(interval),
            interval,
            seq,
            ev: Box::new(ev),
        });
    }

    /// 记录一个遥测样本（只追加，不影响仿真状态）。
    pub fn record(&mut self, sample: MetricSample) {
        self.telemetry.push(sample);
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    pub fn take_telemetry(&mut self) -> Telemetry {
        std::mem::take(&mut self.telemetry)
    }

    /// 单步推进：执行所有 time <= until 的一次性事件（按时间、再按插入顺序），
    /// 然后触发所有到期的定时器并按 firedTime + interval 重新武装。
    ///
    /// 返回 true 当且仅当一次性队列中仍有事件。
    pub fn step(&mut self, until: SimTime, world: &mut dyn World) -> bool {
        while let Some(top) = self.q.peek() {
            if top.at > until {
                break;
            }
            let item = self.q.pop().expect("peek then pop");
            self.now = item.at;
            item.ev.execute(self, world);
            world.on_tick(self);
        }

        // 定时器在同一拍的一次性事件之后触发。
        while let Some(top) = self.timers.peek() {
            if top.next_at > until {
                break;
            }
            let mut timer = self.timers.pop().expect("peek then pop");
            self.now = timer.next_at;
            timer.ev.fire(self, world);
            timer.next_at = timer.next_at.saturating_add(timer.interval);
            self.timers.push(timer);
        }

        self.now = self.now.max(until);
        !self.q.is_empty()
    }

    /// 运行直到一次性事件队列为空或到达 `until`（不触发定时器，测试用）。
    pub fn run_until(&mut self, until: SimTime, world: &mut dyn World) {
        while let Some(top) = self.q.peek() {
            if top.at > until {
                break;
            }
            let item = self.q.pop().expect("peek then pop");
            self.now = item.at;
            item.ev.execute(self, world);
            world.on_tick(self);
        }
        self.now = self.now.max(until);
    }

    /// 运行所有一次性事件直到队列为空。
    #[tracing::instrument(skip(self, world))]
    pub fn run(&mut self, world: &mut dyn World) {
        info!("▶️  开始运行仿真");
        debug!(now = ?self.now, queue_size = self.q.len(), "初始状态");

        let mut event_count = 0u64;
        while let Some(item) = self.q.pop() {
            event_count += 1;
            self.now = item.at;
            item.ev.execute(self, world);
            world.on_tick(self);
        }

        info!(
            total_events = event_count,
            final_time = ?self.now,
            "✅ 仿真完成"
        );
    }
}
