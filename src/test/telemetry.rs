use crate::telemetry::{
    BUCKET_WIDTH_MS, MetricFamily, MetricKind, MetricSample, Telemetry, bucketed, write_reports,
    write_samples_json,
};
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn sample(t_ms: u64, kind: MetricKind) -> MetricSample {
    MetricSample {
        t_ns: t_ms * 1_000_000,
        kind,
    }
}

fn window(flow: &str, cwnd: f64) -> MetricKind {
    MetricKind::WindowSize {
        flow: flow.to_string(),
        cwnd,
    }
}

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "netsim-rs-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

#[test]
fn series_are_grouped_by_family_and_identifier() {
    let mut t = Telemetry::default();
    t.push(sample(0, window("F1", 2.0)));
    t.push(sample(1, window("F2", 1.0)));
    t.push(sample(
        2,
        MetricKind::Rtt {
            flow: "F1".to_string(),
            ms: 20.0,
        },
    ));
    t.push(sample(3, window("F1", 3.0)));

    assert_eq!(t.identifiers(MetricFamily::WindowSize), vec!["F1", "F2"]);
    assert_eq!(
        t.series(MetricFamily::WindowSize, "F1"),
        vec![(0.0, 2.0), (3.0, 3.0)]
    );
    assert_eq!(t.series(MetricFamily::Rtt, "F1"), vec![(2.0, 20.0)]);
    assert!(t.series(MetricFamily::PacketDrop, "L1").is_empty());
}

#[test]
fn bucketing_averages_within_windows() {
    let series = vec![(0.0, 2.0), (10.0, 4.0), (80.0, 8.0), (160.0, 1.0)];
    let buckets = bucketed(&series, BUCKET_WIDTH_MS);
    assert_eq!(buckets, vec![(0.0, 3.0), (75.0, 8.0), (150.0, 1.0)]);

    assert!(bucketed(&[], BUCKET_WIDTH_MS).is_empty());
    assert!(bucketed(&series, 0.0).is_empty());
}

#[test]
fn reports_use_the_documented_header_format() {
    let mut t = Telemetry::default();
    t.push(sample(0, window("F1", 2.0)));
    t.push(sample(75, window("F1", 3.0)));
    t.push(sample(
        80,
        MetricKind::PacketDrop {
            link: "L1".to_string(),
            count: 1,
        },
    ));

    let dir = unique_temp_dir("reports");
    write_reports(&t, &dir).expect("write reports");

    let window_file = fs::read_to_string(dir.join("window_size.csv")).expect("window file");
    let mut lines = window_file.lines();
    assert_eq!(
        lines.next(),
        Some(
            "title: Window Size, x-label: Time (ms), y-label: Window Size (packets), graph-type: Overlay"
        )
    );
    assert_eq!(lines.next(), Some("F1"));
    assert_eq!(lines.next(), Some("0,2"));
    assert_eq!(lines.next(), Some("75,3"));

    let drop_file = fs::read_to_string(dir.join("dropped_packets.csv")).expect("drop file");
    assert!(drop_file.starts_with(
        "title: Dropped Packets, x-label: Time (ms), y-label: # Dropped, graph-type: Bar"
    ));

    // 没有样本的度量族不产生文件
    assert!(!dir.join("rtt.csv").exists());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn samples_round_trip_through_json() {
    let mut t = Telemetry::default();
    t.push(sample(1, window("F1", 2.5)));

    let dir = unique_temp_dir("json");
    let path = dir.join("samples.json");
    write_samples_json(&t, &path).expect("write json");

    let raw = fs::read_to_string(&path).expect("read json");
    let parsed: Vec<MetricSample> = serde_json::from_str(&raw).expect("parse json");
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].t_ns, 1_000_000);
    match &parsed[0].kind {
        MetricKind::WindowSize { flow, cwnd } => {
            assert_eq!(flow, "F1");
            assert_eq!(*cwnd, 2.5);
        }
        other => panic!("unexpected kind: {other:?}"),
    }

    fs::remove_dir_all(&dir).ok();
}
