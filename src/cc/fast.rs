//! FAST TCP
//!
//! 基于时延：按 cwnd ← (rttMin / rtt)·cwnd + α 周期性调窗。
//! 在拿到第一个 RTT 样本之前不更新窗口（避免除零）。

use super::{CongestionControl, WindowCtx};
use crate::net::{AckPacket, FlowPacket};
use crate::sim::{SimTime, Simulator};
use std::collections::HashMap;
use tracing::debug;

const INITIAL_CWND: f64 = 1.0;
const ALPHA: f64 = 15.0;
/// 两次窗口更新之间的最小间隔。
const UPDATE_INTERVAL: SimTime = SimTime(200_000_000);

#[derive(Debug)]
pub struct FastTcp {
    /// 包 id -> 发送时刻
    sent_at: HashMap<String, SimTime>,
    latest_rtt_ms: Option<f64>,
    rtt_min_ms: Option<f64>,
    last_update: Option<SimTime>,
}

impl FastTcp {
    pub fn new() -> Self {
        Self {
            sent_at: HashMap::new(),
            latest_rtt_ms: None,
            rtt_min_ms: None,
            last_update: None,
        }
    }
}

impl Default for FastTcp {
    fn default() -> Self {
        Self::new()
    }
}

impl CongestionControl for FastTcp {
    fn initial_cwnd(&self) -> f64 {
        INITIAL_CWND
    }

    fn handle_send(&mut self, packet: &FlowPacket, now: SimTime) {
        self.sent_at.insert(packet.id(), now);
    }

    fn handle_receive(
        &mut self,
        ack: &AckPacket,
        now: SimTime,
        win: &mut WindowCtx<'_>,
        sim: &mut Simulator,
    ) {
        if let Some(&sent) = self.sent_at.get(&ack.trigger_id) {
            let rtt_ms = now.saturating_sub(sent).as_millis_f64();
            self.latest_rtt_ms = Some(rtt_ms);
            self.rtt_min_ms = Some(match self.rtt_min_ms {
                Some(m) => m.min(rtt_ms),
                None => rtt_ms,
            });
        }

        let (Some(latest), Some(rtt_min)) = (self.latest_rtt_ms, self.rtt_min_ms) else {
            return;
        };
        if latest <= 0.0 {
            return;
        }
        let due = match self.last_update {
            None => true,
            Some(t) => now.saturating_sub(t) > UPDATE_INTERVAL,
        };
        if due {
            let cwnd = rtt_min / latest * win.cwnd() + ALPHA;
            debug!(flow = win.flow_id, rtt_min, latest, cwnd, "FAST 调窗");
            win.set_window(now, cwnd, sim);
            self.last_update = Some(now);
        }
    }

    fn handle_timeout(
        &mut self,
        _packet: &FlowPacket,
        _now: SimTime,
        _win: &mut WindowCtx<'_>,
        _sim: &mut Simulator,
    ) {
    }
}
