//! 遥测落盘
//!
//! 每个度量族一个文件：首行为
//! `title: …, x-label: …, y-label: …, graph-type: …`，
//! 其后按标识符分组写出 `x,y` 行。渲染是外部工具的职责。

use super::{MetricFamily, Telemetry};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing::info;

/// 把所有非空度量族写到 `dir` 下。
pub fn write_reports(telemetry: &Telemetry, dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)?;
    for family in MetricFamily::ALL {
        let ids = telemetry.identifiers(family);
        if ids.is_empty() {
            continue;
        }
        let path = dir.join(family.file_name());
        let mut out = fs::File::create(&path)?;
        writeln!(
            out,
            "title: {}, x-label: {}, y-label: {}, graph-type: {}",
            family.title(),
            family.x_label(),
            family.y_label(),
            family.graph_type()
        )?;
        for id in &ids {
            writeln!(out, "{id}")?;
            for (x, y) in telemetry.series(family, id) {
                writeln!(out, "{x},{y}")?;
            }
        }
        info!(path = %path.display(), "📈 写出遥测文件");
    }
    Ok(())
}

/// 原始样本的 JSON 转储（serde 序列化）。
pub fn write_samples_json(telemetry: &Telemetry, path: &Path) -> io::Result<()> {
    let json = serde_json::to_string_pretty(telemetry.samples())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    fs::write(path, json)
}
