//! 遥测模块
//!
//! 样本类型、按执行顺序累积的样本缓冲，以及外部绘图工具消费的文件格式。

mod metric;
mod writer;

pub use metric::{MetricFamily, MetricKind, MetricSample, Record};
pub use writer::{write_reports, write_samples_json};

/// 外部绘图工具的默认分桶宽度：75 ms。
pub const BUCKET_WIDTH_MS: f64 = 75.0;

/// 按执行顺序累积的遥测缓冲。时间戳单调不减。
#[derive(Debug, Default)]
pub struct Telemetry {
    samples: Vec<MetricSample>,
}

impl Telemetry {
    pub fn push(&mut self, sample: MetricSample) {
        debug_assert!(
            self.samples.last().is_none_or(|prev| prev.t_ns <= sample.t_ns),
            "telemetry timestamps must be non-decreasing"
        );
        self.samples.push(sample);
    }

    pub fn samples(&self) -> &[MetricSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// 抽取某一度量族、某一标识符的 (ms, y) 序列。
    pub fn series(&self, family: MetricFamily, identifier: &str) -> Vec<(f64, f64)> {
        self.samples
            .iter()
            .filter(|s| s.kind.family() == family && s.kind.identifier() == identifier)
            .map(|s| (s.t_ns as f64 / 1_000_000.0, s.kind.y_value()))
            .collect()
    }

    /// 某一度量族出现过的标识符，按首次出现顺序。
    pub fn identifiers(&self, family: MetricFamily) -> Vec<String> {
        let mut ids = Vec::new();
        for s in &self.samples {
            if s.kind.family() != family {
                continue;
            }
            let id = s.kind.identifier();
            if !ids.iter().any(|existing: &String| existing == id) {
                ids.push(id.to_string());
            }
        }
        ids
    }
}

/// 按固定宽度的时间窗对 (x, y) 序列分桶并取桶内均值。
///
/// 输入 x 单调不减（遥测缓冲保证）；输出每桶一个点，x 为桶起点。
pub fn bucketed(series: &[(f64, f64)], width_ms: f64) -> Vec<(f64, f64)> {
    if series.is_empty() || width_ms <= 0.0 {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut bucket_start = (series[0].0 / width_ms).floor() * width_ms;
    let mut sum = 0.0;
    let mut n = 0usize;
    for &(x, y) in series {
        while x >= bucket_start + width_ms {
            if n > 0 {
                out.push((bucket_start, sum / n as f64));
                sum = 0.0;
                n = 0;
            }
            bucket_start += width_ms;
        }
        sum += y;
        n += 1;
    }
    if n > 0 {
        out.push((bucket_start, sum / n as f64));
    }
    out
}
