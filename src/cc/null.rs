//! 无拥塞控制
//!
//! 窗口视为无限大，三个回调全部为空操作。

use super::{CongestionControl, WindowCtx};
use crate::net::{AckPacket, FlowPacket};
use crate::sim::{SimTime, Simulator};

const INITIAL_CWND: f64 = 1e10;

#[derive(Debug, Default)]
pub struct NullCc;

impl NullCc {
    pub fn new() -> Self {
        NullCc
    }
}

impl CongestionControl for NullCc {
    fn initial_cwnd(&self) -> f64 {
        INITIAL_CWND
    }

    fn handle_send(&mut self, _packet: &FlowPacket, _now: SimTime) {}

    fn handle_receive(
        &mut self,
        _ack: &AckPacket,
        _now: SimTime,
        _win: &mut WindowCtx<'_>,
        _sim: &mut Simulator,
    ) {
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
