//! 拥塞控制策略
//!
//! 主机持有一个策略对象；策略通过 `WindowCtx::set_window` 修改拥塞窗口，
//! 该调用同时发出 WindowSizeEvent 遥测。策略自带子状态
//! （ssthresh、慢启动标志、RTT 样本等）。

mod fast;
mod null;
mod reno;
mod tahoe;

pub use fast::FastTcp;
pub use null::NullCc;
pub use reno::TcpReno;
pub use tahoe::TcpTahoe;

use crate::net::{AckPacket, FlowPacket};
use crate::sim::{SimTime, Simulator};
use crate::telemetry::{MetricKind, MetricSample, Record};
use std::fmt;

/// 两次超时引发的拥塞反应之间的最小间隔，
/// 避免同一个 RTT 内的连环丢包反复压低窗口。
pub const TIMEOUT_TOLERANCE: SimTime = SimTime(1_000_000_000);

/// 流配置里选择的拥塞控制模式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CongestionMode {
    None,
    Tahoe,
    Reno,
    Fast,
}

impl CongestionMode {
    /// 解析拓扑文件里的取值（大小写不敏感）。
    pub fn parse(raw: &str) -> Option<CongestionMode> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "none" | "null" => Some(CongestionMode::None),
            "tahoe" => Some(CongestionMode::Tahoe),
            "reno" => Some(CongestionMode::Reno),
            "fast" => Some(CongestionMode::Fast),
            _ => None,
        }
    }

    pub fn build(self) -> Box<dyn CongestionControl> {
        match self {
            CongestionMode::None => Box::new(NullCc::new()),
            CongestionMode::Tahoe => Box::new(TcpTahoe::new()),
            CongestionMode::Reno => Box::new(TcpReno::new()),
            CongestionMode::Fast => Box::new(FastTcp::new()),
        }
    }
}

/// 主机发送窗口的可变视图，借给策略回调用。
pub struct WindowCtx<'a> {
    pub flow_id: &'a str,
    pub cwnd: &'a mut f64,
    /// 滑动窗口序号 (Sn, Sb, Sm)；策略只读。
    pub sn: u64,
    pub sb: u64,
    pub sm: u64,
}

impl WindowCtx<'_> {
    pub fn cwnd(&self) -> f64 {
        *self.cwnd
    }

    /// 更新拥塞窗口并发出 WindowSizeEvent。窗口不小于 1。
    pub fn set_window(&mut self, now: SimTime, value: f64, sim: &mut Simulator) {
        let value = value.max(1.0);
        *self.cwnd = value;
        sim.schedule(
            now,
            Record(MetricSample {
                t_ns: now.0,
                kind: MetricKind::WindowSize {
                    flow: self.flow_id.to_string(),
                    cwnd: value,
                },
            }),
        );
    }
}

/// 策略接口：对发送、ACK 到达、超时三种事件作出反应。
pub trait CongestionControl: Send + fmt::Debug {
    /// 初始拥塞窗口（packets）。
    fn initial_cwnd(&self) -> f64;

    fn handle_send(&mut self, packet: &FlowPacket, now: SimTime);

    fn handle_receive(
        &mut self,
        ack: &AckPacket,
        now: SimTime,
        win: &mut WindowCtx<'_>,
        sim: &mut Simulator,
    );

    fn handle_timeout(
        &mut self,
        packet: &FlowPacket,
        now: SimTime,
        win: &mut WindowCtx<'_>,
        sim: &mut Simulator,
    );
}
