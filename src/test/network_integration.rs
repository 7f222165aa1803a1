use crate::cc::CongestionMode;
use crate::net::{self, Flow, Host, NetWorld, NodeId};
use crate::sim::{SimTime, Simulator};
use crate::telemetry::MetricKind;
use std::sync::atomic::AtomicBool;

fn two_host_world(buffer_bytes: u64) -> (NetWorld, NodeId, NodeId) {
    let mut world = NetWorld::default();
    let h0 = world.net.add_host("H0");
    let h1 = world.net.add_host("H1");
    world.net.connect(
        "L1",
        h0,
        h1,
        10.0,
        SimTime::from_millis(10),
        buffer_bytes,
    );
    (world, h0, h1)
}

fn flow(id: &str, src: NodeId, dest: NodeId, amount: u64, congestion: CongestionMode) -> Flow {
    Flow {
        id: id.to_string(),
        src,
        dest,
        amount_bytes: amount,
        start: SimTime::ZERO,
        congestion,
    }
}

fn run(world: &mut NetWorld) -> Simulator {
    let mut sim = Simulator::default();
    net::run(world, &mut sim, &AtomicBool::new(false));
    sim
}

fn window_samples(sim: &Simulator, flow: &str) -> Vec<f64> {
    sim.telemetry()
        .samples()
        .iter()
        .filter_map(|s| match &s.kind {
            MetricKind::WindowSize { flow: f, cwnd } if f == flow => Some(*cwnd),
            _ => None,
        })
        .collect()
}

fn drop_count(sim: &Simulator) -> usize {
    sim.telemetry()
        .samples()
        .iter()
        .filter(|s| matches!(s.kind, MetricKind::PacketDrop { .. }))
        .count()
}

/// 512 KB、无拥塞控制、10 Mbps / 10 ms / 16 KB：
/// 整条流按序送达，一个包都不丢。
#[test]
fn single_flow_without_congestion_control_delivers_exactly_and_droplessly() {
    let (mut world, h0, h1) = two_host_world(16 * 1024);
    world
        .net
        .assign_flow(flow("F1", h0, h1, 512 * 1024, CongestionMode::None));

    let sim = run(&mut world);

    {
        let receiver = world.net.node_as_mut::<Host>(h1).expect("host");
        // ⌈524288 / 1024⌉ = 512
        assert_eq!(receiver.expected_request_num("F1"), Some(512));
    }
    {
        let sender = world.net.node_as_mut::<Host>(h0).expect("host");
        assert!(sender.flow_done());
        assert_eq!(sender.awaiting_count(), 0);
    }

    let link = &world.net.links()[0];
    assert_eq!(link.dropped_count(), 0);
    assert_eq!(drop_count(&sim), 0);

    // 遥测只追加：时间戳单调不减
    let ts: Vec<u64> = sim.telemetry().samples().iter().map(|s| s.t_ns).collect();
    assert!(ts.windows(2).all(|w| w[0] <= w[1]));
}

/// 两条相向的流共享一条半双工链路：双方都完成，缓冲不超限。
#[test]
fn opposite_direction_flows_share_the_half_duplex_wire() {
    let (mut world, h0, h1) = two_host_world(1024 * 1024);
    world
        .net
        .assign_flow(flow("F1", h0, h1, 512 * 1024, CongestionMode::None));
    world
        .net
        .assign_flow(flow("F2", h1, h0, 512 * 1024, CongestionMode::None));

    let sim = run(&mut world);

    {
        let h1_node = world.net.node_as_mut::<Host>(h1).expect("host");
        assert_eq!(h1_node.expected_request_num("F1"), Some(512));
        assert!(h1_node.flow_done());
    }
    {
        let h0_node = world.net.node_as_mut::<Host>(h0).expect("host");
        assert_eq!(h0_node.expected_request_num("F2"), Some(512));
        assert!(h0_node.flow_done());
    }
    assert_eq!(drop_count(&sim), 0);
}

/// 单包缓冲挤出丢包：Tahoe 在每次（容忍间隔之外的）超时
/// 把窗口打回 2 并重新慢启动——窗口曲线呈锯齿；数据仍然一字不差送达。
#[test]
fn tahoe_sawtooth_under_heavy_loss_still_delivers_everything() {
    let (mut world, h0, h1) = two_host_world(1024);
    world
        .net
        .assign_flow(flow("F1", h0, h1, 16 * 1024, CongestionMode::Tahoe));

    let sim = run(&mut world);

    {
        let receiver = world.net.node_as_mut::<Host>(h1).expect("host");
        assert_eq!(receiver.expected_request_num("F1"), Some(16));
    }
    assert!(drop_count(&sim) > 0, "1-packet buffer must drop");

    let windows = window_samples(&sim, "F1");
    let peak_idx = windows
        .iter()
        .position(|&w| w >= 4.0)
        .expect("slow start grows past 4");
    assert!(
        windows[peak_idx..].contains(&2.0),
        "timeout resets the window back to 2"
    );
}

/// 同样的拓扑换 Reno：三重复 ACK 在超时之前把窗口减半到
/// ssthresh（而不是打回 2），锯齿更浅。
#[test]
fn reno_halves_on_duplicate_acks_instead_of_resetting() {
    let (mut world, h0, h1) = two_host_world(1024);
    world
        .net
        .assign_flow(flow("F1", h0, h1, 16 * 1024, CongestionMode::Reno));

    let sim = run(&mut world);

    {
        let receiver = world.net.node_as_mut::<Host>(h1).expect("host");
        assert_eq!(receiver.expected_request_num("F1"), Some(16));
    }

    let windows = window_samples(&sim, "F1");
    let halved = windows.windows(2).any(|w| {
        w[1] < w[0] && w[1] > 2.0 && (w[1] - (w[0] / 2.0).max(2.0)).abs() < 1e-6
    });
    assert!(halved, "expected a fast-retransmit halving event: {windows:?}");
}

/// FAST TCP 在干净链路上完成整条流。
#[test]
fn fast_tcp_flow_completes() {
    let (mut world, h0, h1) = two_host_world(64 * 1024);
    world
        .net
        .assign_flow(flow("F1", h0, h1, 64 * 1024, CongestionMode::Fast));

    let sim = run(&mut world);

    let receiver = world.net.node_as_mut::<Host>(h1).expect("host");
    assert_eq!(receiver.expected_request_num("F1"), Some(64));

    // 至少发生过一次基于 RTT 的调窗（初始 1 + α = 16 起跳）
    let windows = window_samples(&sim, "F1");
    assert!(windows.iter().any(|&w| w >= 16.0), "windows: {windows:?}");
    assert!(
        sim.telemetry()
            .samples()
            .iter()
            .any(|s| matches!(s.kind, MetricKind::Rtt { .. }))
    );
}

/// 操作者中断：旗标置位后驱动循环立刻退出，已收集的遥测保留。
#[test]
fn operator_interrupt_stops_the_run_loop() {
    let (mut world, h0, h1) = two_host_world(16 * 1024);
    world
        .net
        .assign_flow(flow("F1", h0, h1, 512 * 1024, CongestionMode::None));

    let mut sim = Simulator::default();
    let stop = AtomicBool::new(true);
    net::run(&mut world, &mut sim, &stop);

    // 一拍都没走：流还没开始
    let sender = world.net.node_as_mut::<Host>(h0).expect("host");
    assert!(!sender.flow_done());
}
