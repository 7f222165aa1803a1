use crate::net::{
    Direction, FLOW_PACKET_SIZE, FlowPacket, Host, NetWorld, NodeId, Packet, RoutingPacket,
    SendToLink,
};
use crate::sim::{SimTime, Simulator};
use crate::telemetry::MetricKind;
use std::collections::BTreeMap;

/// 10 Mbps / 10 ms / 16 KB 的双主机链路。
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

fn routing_probe(index: u64, src: NodeId, dest: NodeId) -> Packet {
    // 主机会忽略路由包，适合用来单独观察链路行为
    Packet::StaticRouting(RoutingPacket {
        index,
        src,
        dest,
        cost_table: BTreeMap::new(),
    })
}

#[test]
fn transmission_delay_is_bits_over_capacity() {
    let (world, _h0, _h1) = two_host_world(16 * 1024);
    let link = &world.net.links()[0];
    // 8 * 1024 bit / (10 Mbps = 10_000 bit/ms) = 0.8192 ms
    assert_eq!(link.tx_time(FLOW_PACKET_SIZE), SimTime(819_200));
    // 64B ACK: 512 bit / 10_000 bit/ms = 51.2 us
    assert_eq!(link.tx_time(64), SimTime(51_200));
}

#[test]
fn direction_helpers_resolve_endpoints() {
    let (world, h0, h1) = two_host_world(16 * 1024);
    let link = &world.net.links()[0];
    assert_eq!(link.direction_towards(h0), Some(Direction::ToA));
    assert_eq!(link.direction_towards(h1), Some(Direction::ToB));
    assert_eq!(link.other_end(h0), Some(h1));
    assert_eq!(link.other_end(h1), Some(h0));
    assert_eq!(link.endpoint(Direction::ToA), h0);
    assert_eq!(link.direction_towards(NodeId(99)), None);
}

#[test]
fn opposite_direction_send_queues_while_wire_is_busy() {
    let (mut world, h0, h1) = two_host_world(16 * 1024);
    let link_id = world.net.link_id("L1").expect("link registered");
    let mut sim = Simulator::default();

    sim.schedule(
        SimTime::ZERO,
        SendToLink {
            link: link_id,
            origin: h0,
            packet: routing_probe(0, h0, h1),
        },
    );
    sim.schedule(
        SimTime::ZERO,
        SendToLink {
            link: link_id,
            origin: h1,
            packet: routing_probe(1, h1, h0),
        },
    );

    // 第一拍之后：第一个包占线，反向的第二个包必须排队
    sim.run_until(SimTime::ZERO, &mut world);
    {
        let link = world.net.link(link_id);
        assert!(link.is_in_use());
        assert_eq!(link.on_wire_count(Direction::ToB), 1);
        assert_eq!(link.on_wire_count(Direction::ToA), 0);
        assert_eq!(link.buffer.len(Direction::ToA), 1);
    }

    sim.run(&mut world);
    let link = world.net.link(link_id);
    assert!(!link.is_in_use());
    assert_eq!(link.on_wire_count(Direction::ToA), 0);
    assert_eq!(link.on_wire_count(Direction::ToB), 0);
    assert_eq!(link.buffer.total_len(), 0);
    assert_eq!(link.dropped_count(), 0);

    // 两次成功上线，各有一条吞吐样本
    let throughput = sim
        .telemetry()
        .samples()
        .iter()
        .filter(|s| matches!(s.kind, MetricKind::LinkThroughput { .. }))
        .count();
    assert_eq!(throughput, 2);
}

#[test]
fn full_buffer_drops_the_newcomer_and_counts_it() {
    // 缓冲只够一个空路由包（20 字节）
    let (mut world, h0, h1) = two_host_world(20);
    let link_id = world.net.link_id("L1").expect("link registered");
    let mut sim = Simulator::default();

    for index in 0..3 {
        sim.schedule(
            SimTime::ZERO,
            SendToLink {
                link: link_id,
                origin: h0,
                packet: routing_probe(index, h0, h1),
            },
        );
    }

    sim.run(&mut world);
    let link = world.net.link(link_id);
    assert_eq!(link.dropped_count(), 1);

    let drops: Vec<u64> = sim
        .telemetry()
        .samples()
        .iter()
        .filter_map(|s| match &s.kind {
            MetricKind::PacketDrop { count, .. } => Some(*count),
            _ => None,
        })
        .collect();
    assert_eq!(drops, vec![1]);
}

#[test]
fn same_direction_packets_keep_fifo_order_through_the_buffer() {
    let (mut world, h0, h1) = two_host_world(16 * 1024);
    let link_id = world.net.link_id("L1").expect("link registered");
    let mut sim = Simulator::default();

    // 同一拍发三个流数据包：0 上线，1、2 排队；
    // 接收端按序推进说明出队保持 FIFO。
    for seq in 0..3u64 {
        sim.schedule(
            SimTime::ZERO,
            SendToLink {
                link: link_id,
                origin: h0,
                packet: Packet::Flow(FlowPacket {
                    flow_id: "F1".to_string(),
                    seq,
                    size_bytes: FLOW_PACKET_SIZE,
                    src: h0,
                    dest: h1,
                }),
            },
        );
    }

    sim.run(&mut world);
    let receiver = world.net.node_as_mut::<Host>(h1).expect("host");
    assert_eq!(receiver.expected_request_num("F1"), Some(3));
}
