//! TCP Tahoe
//!
//! 慢启动 + 拥塞避免；超时回到慢启动并把窗口重置为初值。

use super::{CongestionControl, TIMEOUT_TOLERANCE, WindowCtx};
use crate::net::{AckPacket, FlowPacket};
use crate::sim::{SimTime, Simulator};
use tracing::{info, warn};

pub(crate) const INITIAL_CWND: f64 = 2.0;
pub(crate) const INITIAL_SSTHRESH: f64 = 1e10;

#[derive(Debug)]
pub struct TcpTahoe {
    /// 是否处于慢启动
    ss: bool,
    ssthresh: f64,
    last_drop: Option<SimTime>,
}

impl TcpTahoe {
    pub fn new() -> Self {
        Self {
            ss: true,
            ssthresh: INITIAL_SSTHRESH,
            last_drop: None,
        }
    }

    fn outside_tolerance(last_drop: Option<SimTime>, now: SimTime) -> bool {
        match last_drop {
            None => true,
            Some(t) => now.saturating_sub(t) > TIMEOUT_TOLERANCE,
        }
    }

    /// 慢启动 / 拥塞避免的窗口增长，Tahoe 与 Reno 共用。
    pub(crate) fn grow(
        ss: &mut bool,
        ssthresh: f64,
        rn: u64,
        now: SimTime,
        win: &mut WindowCtx<'_>,
        sim: &mut Simulator,
    ) {
        let cwnd = win.cwnd();
        if *ss {
            win.set_window(now, cwnd + 1.0, sim);
            if win.cwnd() >= ssthresh {
                *ss = false;
                info!(flow = win.flow_id, "慢启动结束，进入拥塞避免");
            }
        } else if rn > win.sb {
            // 拥塞避免阶段每个 RTT 增长 1，按 +1/cwnd 摊到确认上
            win.set_window(now, cwnd + 1.0 / cwnd, sim);
        }
    }
}

impl Default for TcpTahoe {
    fn default() -> Self {
        Self::new()
    }
}

impl CongestionControl for TcpTahoe {
    fn initial_cwnd(&self) -> f64 {
        INITIAL_CWND
    }

    fn handle_send(&mut self, _packet: &FlowPacket, _now: SimTime) {}

    fn handle_receive(
        &mut self,
        ack: &AckPacket,
        now: SimTime,
        win: &mut WindowCtx<'_>,
        sim: &mut Simulator,
    ) {
        Self::grow(
            &mut self.ss,
            self.ssthresh,
            ack.request_number,
            now,
            win,
            sim,
        );
    }

    fn handle_timeout(
        &mut self,
        _packet: &FlowPacket,
        now: SimTime,
        win: &mut WindowCtx<'_>,
        sim: &mut Simulator,
    ) {
        if !Self::outside_tolerance(self.last_drop, now) {
            return;
        }
        self.ss = true;
        self.ssthresh = (win.cwnd() / 2.0).max(INITIAL_CWND);
        win.set_window(now, INITIAL_CWND, sim);
        self.last_drop = Some(now);
        warn!(flow = win.flow_id, ssthresh = self.ssthresh, "超时，回到慢启动");
    }
}
