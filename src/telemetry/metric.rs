//! 遥测样本类型
//!
//! 仿真过程中产生的度量样本。样本经由事件队列投递（与普通事件一样排序），
//! 执行时仅追加到仿真器的样本日志，绝不改变仿真状态。

use crate::sim::{Event, Simulator, World};
use serde::{Deserialize, Serialize};

/// 一条遥测样本：仿真时间戳（纳秒）+ 具体度量。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSample {
    pub t_ns: u64,
    pub kind: MetricKind,
}

/// 度量类型
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricKind {
    /// 发送端拥塞窗口（packets，实数值）
    WindowSize { flow: String, cwnd: f64 },
    /// 链路缓冲占用（packets，按 1024B 折算，可为小数）
    LinkBufferSize { link: String, packets: f64 },
    /// 链路吞吐（bits/sec）
    LinkThroughput { link: String, bps: f64 },
    /// 流吞吐（bits/sec，接收端按序接收口径）
    FlowThroughput { flow: String, bps: f64 },
    /// 丢包累计数
    PacketDrop { link: String, count: u64 },
    /// 往返时延（ms）
    Rtt { flow: String, ms: f64 },
}

impl MetricKind {
    /// 样本所属的标识符（flowId 或 linkId）。
    pub fn identifier(&self) -> &str {
        match self {
            MetricKind::WindowSize { flow, .. } => flow,
            MetricKind::LinkBufferSize { link, .. } => link,
            MetricKind::LinkThroughput { link, .. } => link,
            MetricKind::FlowThroughput { flow, .. } => flow,
            MetricKind::PacketDrop { link, .. } => link,
            MetricKind::Rtt { flow, .. } => flow,
        }
    }

    /// 绘图用的 y 值。
    pub fn y_value(&self) -> f64 {
        match self {
            MetricKind::WindowSize { cwnd, .. } => *cwnd,
            MetricKind::LinkBufferSize { packets, .. } => *packets,
            MetricKind::LinkThroughput { bps, .. } => *bps,
            MetricKind::FlowThroughput { bps, .. } => *bps,
            MetricKind::PacketDrop { count, .. } => *count as f64,
            MetricKind::Rtt { ms, .. } => *ms,
        }
    }

    pub fn family(&self) -> MetricFamily {
        match self {
            MetricKind::WindowSize { .. } => MetricFamily::WindowSize,
            MetricKind::LinkBufferSize { .. } => MetricFamily::LinkBufferSize,
            MetricKind::LinkThroughput { .. } => MetricFamily::LinkThroughput,
            MetricKind::FlowThroughput { .. } => MetricFamily::FlowThroughput,
            MetricKind::PacketDrop { .. } => MetricFamily::PacketDrop,
            MetricKind::Rtt { .. } => MetricFamily::Rtt,
        }
    }
}

/// 度量族：每族一个输出文件，带固定的图表头。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricFamily {
    WindowSize,
    LinkBufferSize,
    LinkThroughput,
    FlowThroughput,
    PacketDrop,
    Rtt,
}

impl MetricFamily {
    pub const ALL: [MetricFamily; 6] = [
        MetricFamily::WindowSize,
        MetricFamily::LinkBufferSize,
        MetricFamily::LinkThroughput,
        MetricFamily::FlowThroughput,
        MetricFamily::PacketDrop,
        MetricFamily::Rtt,
    ];

    pub fn title(self) -> &'static str {
        match self {
            MetricFamily::WindowSize => "Window Size",
            MetricFamily::LinkBufferSize => "Link Buffer Occupancy",
            MetricFamily::LinkThroughput => "Link Throughput",
            MetricFamily::FlowThroughput => "Flow Throughput",
            MetricFamily::PacketDrop => "Dropped Packets",
            MetricFamily::Rtt => "Round Trip Time",
        }
    }

    pub fn x_label(self) -> &'static str {
        "Time (ms)"
    }

    pub fn y_label(self) -> &'static str {
        match self {
            MetricFamily::WindowSize => "Window Size (packets)",
            MetricFamily::LinkBufferSize => "# Packets",
            MetricFamily::LinkThroughput => "Throughput (bps)",
            MetricFamily::FlowThroughput => "Throughput (bps)",
            MetricFamily::PacketDrop => "# Dropped",
            MetricFamily::Rtt => "RTT (ms)",
        }
    }

    pub fn graph_type(self) -> &'static str {
        match self {
            MetricFamily::PacketDrop => "Bar",
            MetricFamily::WindowSize => "Overlay",
            _ => "Subplot",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            MetricFamily::WindowSize => "window_size.csv",
            MetricFamily::LinkBufferSize => "link_buffer.csv",
            MetricFamily::LinkThroughput => "link_throughput.csv",
            MetricFamily::FlowThroughput => "flow_throughput.csv",
            MetricFamily::PacketDrop => "dropped_packets.csv",
            MetricFamily::Rtt => "rtt.csv",
        }
    }
}

/// 事件：执行时把样本追加到仿真器的遥测日志。
#[derive(Debug)]
pub struct Record(pub MetricSample);

impl Event for Record {
    fn execute(self: Box<Self>, sim: &mut Simulator, _world: &mut dyn World) {
        sim.record(self.0);
    }
}
