//! 链路类型
//!
//! 双向但半双工的链路：某一时刻线上只允许一个方向有数据。
//! 占用时新包进入目的方向的缓冲（DropTail）；
//! 一次发送会调度到达事件和两个 LinkFree 事件（见 `transmit`）。

use super::id::{LinkId, NodeId};
use super::link_free::LinkFree;
use super::packet::Packet;
use super::packet_arrival::PacketArrival;
use crate::queue::LinkBuffer;
use crate::sim::{SimTime, Simulator};
use crate::telemetry::{MetricKind, MetricSample, Record};
use tracing::{debug, info, warn};

/// 链路方向：指向端点 A 或端点 B。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ToA,
    ToB,
}

impl Direction {
    pub fn index(self) -> usize {
        match self {
            Direction::ToA => 0,
            Direction::ToB => 1,
        }
    }

    pub fn reverse(self) -> Direction {
        match self {
            Direction::ToA => Direction::ToB,
            Direction::ToB => Direction::ToA,
        }
    }
}

/// 网络链路
#[derive(Debug)]
pub struct Link {
    pub id: LinkId,
    pub name: String,
    pub node_a: NodeId,
    pub node_b: NodeId,
    /// 容量（Mbps）。同时是静态路由开销（原样作权重，越小越优）。
    pub rate_mbps: f64,
    /// 传播时延
    pub delay: SimTime,
    pub buffer: LinkBuffer,

    in_use: bool,
    current_dir: Option<Direction>,
    /// 每个方向当前在线上传播的包
    on_wire: [Vec<Packet>; 2],

    // 吞吐计：累计比特数 / 最后一个包尾离开远端的时刻
    bits_sent: u64,
    last_clear: SimTime,
    dropped: u64,
}

impl Link {
    pub fn new(
        id: LinkId,
        name: impl Into<String>,
        node_a: NodeId,
        node_b: NodeId,
        rate_mbps: f64,
        delay: SimTime,
        buffer_cap_bytes: u64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            node_a,
            node_b,
            rate_mbps,
            delay,
            buffer: LinkBuffer::new(buffer_cap_bytes),
            in_use: false,
            current_dir: None,
            on_wire: [Vec::new(), Vec::new()],
            bits_sent: 0,
            last_clear: SimTime::ZERO,
            dropped: 0,
        }
    }

    /// 传输时延：8·bytes / (容量 bits/ms)。
    pub fn tx_time(&self, bytes: u64) -> SimTime {
        if self.rate_mbps <= 0.0 {
            return SimTime(u64::MAX / 4);
        }
        // rate Mbps -> rate*1000 bits/ms；换算成纳秒即 bits*1000/rate
        let bits = (bytes * 8) as f64;
        SimTime((bits * 1_000.0 / self.rate_mbps).round() as u64)
    }

    pub fn endpoint(&self, dir: Direction) -> NodeId {
        match dir {
            Direction::ToA => self.node_a,
            Direction::ToB => self.node_b,
        }
    }

    pub fn other_end(&self, node: NodeId) -> Option<NodeId> {
        if node == self.node_a {
            Some(self.node_b)
        } else if node == self.node_b {
            Some(self.node_a)
        } else {
            None
        }
    }

    /// 朝向 `node` 的方向。
    pub fn direction_towards(&self, node: NodeId) -> Option<Direction> {
        if node == self.node_a {
            Some(Direction::ToA)
        } else if node == self.node_b {
            Some(Direction::ToB)
        } else {
            None
        }
    }

    /// 静态路由开销。
    pub fn static_cost(&self) -> f64 {
        self.rate_mbps
    }

    /// 动态路由开销：静态开销 + 平均缓冲驻留时延（ms）。
    pub fn dynamic_cost(&self) -> f64 {
        self.static_cost() + self.buffer.dwell_avg_ms()
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }

    pub fn is_in_use(&self) -> bool {
        self.in_use
    }

    pub fn on_wire_count(&self, dir: Direction) -> usize {
        self.on_wire[dir.index()].len()
    }

    /// 向 `origin` 的对端发送一个包。
    ///
    /// `from_free` 表示调用来自 LinkFreeEvent 的出队路径：
    /// 该路径已经弹出了队头，越过排队竞争检查直接上线，
    /// 以保证与乱序到达的同拍事件之间的 FIFO 语义。
    pub fn send(
        &mut self,
        now: SimTime,
        packet: Packet,
        origin: NodeId,
        from_free: bool,
        sim: &mut Simulator,
    ) {
        let Some(dest) = self.other_end(origin) else {
            warn!(link = %self.name, origin = ?origin, "发送方不是本链路端点，丢弃");
            return;
        };
        let dest_dir = self
            .direction_towards(dest)
            .expect("other_end implies endpoint");

        // 占用中，或反方向仍有包在线上（半双工）：排队
        if self.in_use || !self.on_wire[dest_dir.reverse().index()].is_empty() {
            debug!(
                link = %self.name,
                pkt = %packet.id(),
                current_dir = ?self.current_dir,
                "链路占用，进入缓冲"
            );
            self.enqueue_or_drop(now, packet, dest_dir, sim);
            return;
        }

        let packet = if !from_free && !self.buffer.is_empty(dest_dir) {
            // 与 LinkFree 的竞争：新来的包排到队尾，队头先走
            if !self.enqueue_or_drop(now, packet, dest_dir, sim) {
                return;
            }
            let head = self
                .buffer
                .dequeue(dest_dir, now)
                .expect("buffer checked non-empty");
            self.emit_buffer_size(now, sim);
            head
        } else {
            packet
        };

        self.transmit(now, packet, dest_dir, sim);
    }

    /// 包上线：调度到达与两个 LinkFree 事件。
    ///
    /// (b) 在包尾离开本端（now+tx）时触发，同方向可以续传；
    /// (c) 在包尾离开远端（now+tx+delay）时触发，反方向此后才可用。
    fn transmit(&mut self, now: SimTime, packet: Packet, dest_dir: Direction, sim: &mut Simulator) {
        let tx = self.tx_time(packet.size());
        let depart = now.saturating_add(tx);
        let arrive = depart.saturating_add(self.delay);
        let dest = self.endpoint(dest_dir);
        let pkt_id = packet.id();

        info!(
            link = %self.name,
            pkt = %pkt_id,
            dest = ?dest,
            ?arrive,
            "📤 包上线发送"
        );

        self.in_use = true;
        self.current_dir = Some(dest_dir);
        self.on_wire[dest_dir.index()].push(packet.clone());

        // 吞吐计：累计比特 / 尾部离开远端的时刻
        self.bits_sent = self.bits_sent.saturating_add(packet.size() * 8);
        self.last_clear = arrive;
        let elapsed = self.last_clear.as_secs_f64();
        if elapsed > 0.0 {
            sim.schedule(
                now,
                Record(MetricSample {
                    t_ns: now.0,
                    kind: MetricKind::LinkThroughput {
                        link: self.name.clone(),
                        bps: self.bits_sent as f64 / elapsed,
                    },
                }),
            );
        }

        sim.schedule(
            arrive,
            PacketArrival {
                link: self.id,
                to: dest,
                packet,
            },
        );
        sim.schedule(
            depart,
            LinkFree {
                link: self.id,
                dir: dest_dir,
                packet_id: pkt_id.clone(),
            },
        );
        sim.schedule(
            arrive,
            LinkFree {
                link: self.id,
                dir: dest_dir.reverse(),
                packet_id: pkt_id,
            },
        );
    }

    /// LinkFreeEvent：`dir` 是被释放（可发送）的方向。
    ///
    /// 触发它的包从反方向的在线集合移除（若到达事件尚未移除）；
    /// 只有当反方向线上已空，方向才真正空闲。
    pub fn on_free(&mut self, now: SimTime, dir: Direction, packet_id: &str, sim: &mut Simulator) {
        let opp = dir.reverse();
        if let Some(pos) = self.on_wire[opp.index()]
            .iter()
            .position(|p| p.id() == packet_id)
        {
            self.on_wire[opp.index()].remove(pos);
        }
        if !self.on_wire[opp.index()].is_empty() {
            return;
        }

        debug!(link = %self.name, ?dir, "链路空闲");
        self.in_use = false;
        self.current_dir = None;

        if let Some(head) = self.buffer.dequeue(dir, now) {
            self.emit_buffer_size(now, sim);
            let origin = self.endpoint(opp);
            self.send(now, head, origin, true, sim);
        }
    }

    /// 到达事件先于同拍的 LinkFree 执行，从线上移除该包。
    pub fn on_arrival(&mut self, to: NodeId, packet_id: &str) {
        let Some(dir) = self.direction_towards(to) else {
            return;
        };
        if let Some(pos) = self.on_wire[dir.index()]
            .iter()
            .position(|p| p.id() == packet_id)
        {
            self.on_wire[dir.index()].remove(pos);
        }
    }

    /// 入队，容量不足时丢包并记录遥测。返回是否入队成功。
    fn enqueue_or_drop(
        &mut self,
        now: SimTime,
        packet: Packet,
        dir: Direction,
        sim: &mut Simulator,
    ) -> bool {
        match self.buffer.enqueue(packet, dir, now) {
            Ok(()) => {
                self.emit_buffer_size(now, sim);
                true
            }
            Err(pkt) => {
                self.dropped = self.dropped.saturating_add(1);
                warn!(
                    link = %self.name,
                    pkt = %pkt.id(),
                    dropped = self.dropped,
                    "🗑️  缓冲已满，丢弃数据包"
                );
                sim.schedule(
                    now,
                    Record(MetricSample {
                        t_ns: now.0,
                        kind: MetricKind::PacketDrop {
                            link: self.name.clone(),
                            count: self.dropped,
                        },
                    }),
                );
                false
            }
        }
    }

    fn emit_buffer_size(&mut self, now: SimTime, sim: &mut Simulator) {
        sim.schedule(
            now,
            Record(MetricSample {
                t_ns: now.0,
                kind: MetricKind::LinkBufferSize {
                    link: self.name.clone(),
                    packets: self.buffer.bytes() as f64 / super::packet::FLOW_PACKET_SIZE as f64,
                },
            }),
        );
    }
}
