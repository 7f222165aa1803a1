use crate::net::{
    FLOW_PACKET_SIZE, FlowPacket, Host, LinkId, NetWorld, NodeId, Packet, Router,
};
use crate::sim::{SimTime, Simulator};

/// 四路由器环 a–b–c–d，链路开销（rate）1,2,3,4，
/// 两个主机桩 H1↔a、H2↔c 开销均为 1。
struct Ring {
    world: NetWorld,
    h2: NodeId,
    a: NodeId,
    l_ab: LinkId,
    l_da: LinkId,
}

fn ring(dynamic: bool) -> Ring {
    let mut world = NetWorld::default();
    let h1 = world.net.add_host("H1");
    let h2 = world.net.add_host("H2");
    let a = world.net.add_router("a", dynamic);
    let b = world.net.add_router("b", dynamic);
    let c = world.net.add_router("c", dynamic);
    let d = world.net.add_router("d", dynamic);

    let delay = SimTime::from_millis(1);
    let buf = 1024 * 1024;
    let l_ab = world.net.connect("L-ab", a, b, 1.0, delay, buf);
    world.net.connect("L-bc", b, c, 2.0, delay, buf);
    world.net.connect("L-cd", c, d, 3.0, delay, buf);
    let l_da = world.net.connect("L-da", d, a, 4.0, delay, buf);
    world.net.connect("L-h1a", h1, a, 1.0, delay, buf);
    world.net.connect("L-h2c", h2, c, 1.0, delay, buf);

    Ring {
        world,
        h2,
        a,
        l_ab,
        l_da,
    }
}

#[test]
fn static_distance_vector_converges_to_shortest_paths() {
    let mut r = ring(false);
    let mut sim = Simulator::default();

    // 静态表构建 + 广播由网络就绪触发；run 跑空即收敛（广播停止）
    r.world.net.bring_up(&mut sim);
    sim.run(&mut r.world);

    let router_a = r.world.net.node_as_mut::<Router>(r.a).expect("router a");
    let table = router_a.static_table().expect("converged static table");

    // 自身条目：开销 0、无出链路
    let self_entry = table.get(&r.a).expect("self entry");
    assert_eq!(self_entry.cost, 0.0);
    assert!(self_entry.link.is_none());

    // a -> H2 走 a–b–c–H2 = 1+2+1 = 4，而不是 a–d–c–H2 = 4+3+1 = 8
    let h2_entry = table.get(&r.h2).expect("route to H2");
    assert_eq!(h2_entry.cost, 4.0);
    assert_eq!(h2_entry.link, Some(r.l_ab));

    // 广播已停止：sameData 在达到阈值后清零
    assert_eq!(router_a.same_data(), 0);
}

#[test]
fn dynamic_cost_reroutes_around_a_congested_link() {
    let mut r = ring(true);
    let mut sim = Simulator::default();

    r.world.net.bring_up(&mut sim);
    sim.run(&mut r.world);

    // 静态交换期间路由包也会排队，先清掉各链路的驻留计量
    for idx in 0..r.world.net.links().len() {
        r.world.net.link_mut(LinkId(idx)).buffer.reset_dwell();
    }

    // 人为制造 a–b 的缓冲驻留：入队后 20ms 才出队，平均驻留 10ms，
    // 动态开销 dyn(a–b) = 1 + 10 = 11 > dyn(a–d) = 4
    {
        let link = r.world.net.link_mut(r.l_ab);
        link.buffer
            .enqueue(
                Packet::Flow(FlowPacket {
                    flow_id: "probe".to_string(),
                    seq: 0,
                    size_bytes: FLOW_PACKET_SIZE,
                    src: r.a,
                    dest: r.h2,
                }),
                crate::net::Direction::ToB,
                SimTime::ZERO,
            )
            .expect("buffer empty");
        link.buffer
            .dequeue(crate::net::Direction::ToB, SimTime::from_millis(20))
            .expect("queued probe");
        assert_eq!(link.buffer.dwell_avg_ms(), 10.0);
    }

    // 触发 a 的动态表构建；邻居收到动态路由包时各自补建影子表
    {
        let mut node = r.world.net.take_node(r.a).expect("router a in place");
        node.as_any_mut()
            .downcast_mut::<Router>()
            .expect("router")
            .build_routing_table(true, &mut sim, &mut r.world.net);
        r.world.net.put_node(r.a, node);
    }
    sim.run(&mut r.world);

    let router_a = r.world.net.node_as_mut::<Router>(r.a).expect("router a");
    let table = router_a
        .dynamic_table()
        .expect("shadow table promoted after convergence");

    // 拥塞的 a–b 被绕开：a -> H2 改走 a–d–c–H2 = 4+3+1 = 8
    let h2_entry = table.get(&r.h2).expect("route to H2");
    assert_eq!(h2_entry.cost, 8.0);
    assert_eq!(h2_entry.link, Some(r.l_da));
    assert_eq!(router_a.same_data(), 0);
}

#[test]
fn forwarding_without_a_table_builds_one_and_drops_the_packet() {
    let mut world = NetWorld::default();
    let h1 = world.net.add_host("H1");
    let h2 = world.net.add_host("H2");
    let r = world.net.add_router("R", false);
    let delay = SimTime::from_millis(1);
    world.net.connect("L1", h1, r, 10.0, delay, 64 * 1024);
    world.net.connect("L2", r, h2, 10.0, delay, 64 * 1024);

    let mut sim = Simulator::default();
    // 不经过 bring_up，路由器还没有任何表
    world.net.deliver(
        r,
        Packet::Flow(FlowPacket {
            flow_id: "F1".to_string(),
            seq: 0,
            size_bytes: FLOW_PACKET_SIZE,
            src: h1,
            dest: h2,
        }),
        &mut sim,
    );
    sim.run(&mut world);

    // 包被丢弃，但构建已经完成
    {
        let router = world.net.node_as_mut::<Router>(r).expect("router");
        assert!(router.static_table().is_some());
    }
    let receiver = world.net.node_as_mut::<Host>(h2).expect("host");
    assert_eq!(receiver.expected_request_num("F1"), None);
}

#[test]
fn unknown_destination_is_dropped_without_aborting() {
    let mut world = NetWorld::default();
    let h1 = world.net.add_host("H1");
    let h2 = world.net.add_host("H2");
    let stray = world.net.add_host("H3"); // 未接入任何链路
    let r = world.net.add_router("R", false);
    let delay = SimTime::from_millis(1);
    world.net.connect("L1", h1, r, 10.0, delay, 64 * 1024);
    world.net.connect("L2", r, h2, 10.0, delay, 64 * 1024);

    let mut sim = Simulator::default();
    world.net.bring_up(&mut sim);
    sim.run(&mut world);

    world.net.deliver(
        r,
        Packet::Flow(FlowPacket {
            flow_id: "F1".to_string(),
            seq: 0,
            size_bytes: FLOW_PACKET_SIZE,
            src: h1,
            dest: stray,
        }),
        &mut sim,
    );
    sim.run(&mut world);

    let receiver = world.net.node_as_mut::<Host>(stray).expect("host");
    assert_eq!(receiver.expected_request_num("F1"), None);
}
