//! TCP Reno
//!
//! 在 Tahoe 的基础上增加快速重传：连续重复 ACK 时把窗口减半到
//! ssthresh，而不是重置到初值。

use super::tahoe::{INITIAL_CWND, INITIAL_SSTHRESH, TcpTahoe};
use super::{CongestionControl, TIMEOUT_TOLERANCE, WindowCtx};
use crate::net::{AckPacket, FlowPacket};
use crate::sim::{SimTime, Simulator};
use std::collections::VecDeque;
use tracing::warn;

/// 判定重复 ACK 所需的连续相同 request number 个数。
const MAX_DUPLICATES: usize = 4;

#[derive(Debug)]
pub struct TcpReno {
    ss: bool,
    ssthresh: f64,
    last_drop: Option<SimTime>,
    /// 最近 N 个收到的 request number
    last_req_nums: VecDeque<u64>,
}

impl TcpReno {
    pub fn new() -> Self {
        Self {
            ss: true,
            ssthresh: INITIAL_SSTHRESH,
            last_drop: None,
            last_req_nums: VecDeque::new(),
        }
    }

    fn outside_tolerance(&self, now: SimTime) -> bool {
        match self.last_drop {
            None => true,
            Some(t) => now.saturating_sub(t) > TIMEOUT_TOLERANCE,
        }
    }
}

impl Default for TcpReno {
    fn default() -> Self {
        Self::new()
    }
}

impl CongestionControl for TcpReno {
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
        let rn = ack.request_number;
        self.last_req_nums.push_back(rn);
        if self.last_req_nums.len() > MAX_DUPLICATES {
            self.last_req_nums.pop_front();
        }

        if self.outside_tolerance(now)
            && self.last_req_nums.len() == MAX_DUPLICATES
            && self.last_req_nums.iter().all(|&n| n == rn)
        {
            // 快速重传：减半而非重置
            self.ssthresh = (win.cwnd() / 2.0).max(INITIAL_CWND);
            win.set_window(now, self.ssthresh, sim);
            self.last_drop = Some(now);
            warn!(flow = win.flow_id, ssthresh = self.ssthresh, "重复 ACK，窗口减半");
        }

        TcpTahoe::grow(&mut self.ss, self.ssthresh, rn, now, win, sim);
    }

    fn handle_timeout(
        &mut self,
        _packet: &FlowPacket,
        now: SimTime,
        win: &mut WindowCtx<'_>,
        sim: &mut Simulator,
    ) {
        if !self.outside_tolerance(now) {
            return;
        }
        self.ss = true;
        self.ssthresh = (win.cwnd() / 2.0).max(INITIAL_CWND);
        win.set_window(now, INITIAL_CWND, sim);
        self.last_drop = Some(now);
        warn!(flow = win.flow_id, ssthresh = self.ssthresh, "超时，回到慢启动");
    }
}
