//! 主机节点
//!
//! 发送端：滑动窗口（Go-Back-N 风格累计 ACK）、重传队列、超时；
//! 接收端：每条流一个期待序号，不缓存乱序包，ACK 永远携带当前期待值。

use super::flow::Flow;
use super::id::{LinkId, NodeId};
use super::network::Network;
use super::node::Node;
use super::packet::{AckPacket, FLOW_PACKET_SIZE, FlowPacket, Packet};
use super::send_to_link::SendToLink;
use super::timeout::TimeoutEvent;
use crate::cc::{CongestionControl, WindowCtx};
use crate::sim::{SimTime, Simulator};
use crate::telemetry::{MetricKind, MetricSample, Record};
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// 重传超时。
pub const TIMEOUT_PERIOD: SimTime = SimTime(750_000_000);

/// 滑动窗口初始上界 Sm − Sb（包数）。每次累计确认按确认量外推，
/// 因此窗口宽度保持不变；实际节流由 cwnd 完成。
pub const INITIAL_WINDOW: u64 = 16;

/// 发送端每流状态。
pub(crate) struct SenderState {
    pub flow: Flow,
    /// 拥塞窗口（packets，实数值）
    pub cwnd: f64,
    /// 下一个待发序号
    pub sn: u64,
    /// 窗口基序号（最小未确认）
    pub sb: u64,
    /// 窗口上界序号
    pub sm: u64,
    /// 包 id -> 未确认的包
    pub awaiting: HashMap<String, FlowPacket>,
    /// 优先重发队列，按序号取最小
    pub retransmit: BTreeMap<u64, FlowPacket>,
    /// 见过的最大累计 request number
    pub current_request_num: u64,
    /// 包 id -> 发出时刻（RTT 采样）
    pub sent_at: HashMap<String, SimTime>,
    pub cc: Box<dyn CongestionControl>,
    pub done: bool,
}

/// 主机节点：恰好拥有一条链路；可选地拥有一条流（发送端角色）。
pub struct Host {
    id: NodeId,
    name: String,
    link: Option<LinkId>,
    sender: Option<SenderState>,
    /// 接收端角色：flowId -> 期待的下一个序号 Rn
    expected: HashMap<String, u64>,
    /// flowId -> 按序接收的累计比特数（吞吐遥测）
    accepted_bits: HashMap<String, u64>,
}

impl Host {
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            link: None,
            sender: None,
            expected: HashMap::new(),
            accepted_bits: HashMap::new(),
        }
    }

    /// 绑定流（发送端角色）。
    pub fn assign_flow(&mut self, flow: Flow) {
        let cc = flow.congestion.build();
        let sm = INITIAL_WINDOW;
        self.sender = Some(SenderState {
            cwnd: cc.initial_cwnd(),
            sn: 0,
            sb: 0,
            sm,
            awaiting: HashMap::new(),
            retransmit: BTreeMap::new(),
            current_request_num: 0,
            sent_at: HashMap::new(),
            cc,
            done: false,
            flow,
        });
    }

    pub fn flow(&self) -> Option<&Flow> {
        self.sender.as_ref().map(|s| &s.flow)
    }

    pub fn cwnd(&self) -> Option<f64> {
        self.sender.as_ref().map(|s| s.cwnd)
    }

    /// 发送端基序号（最小未确认）。
    pub fn base_seq(&self) -> Option<u64> {
        self.sender.as_ref().map(|s| s.sb)
    }

    pub fn awaiting_count(&self) -> usize {
        self.sender.as_ref().map_or(0, |s| s.awaiting.len())
    }

    /// 流是否已全部确认。
    pub fn flow_done(&self) -> bool {
        self.sender
            .as_ref()
            .is_some_and(|s| s.sb >= s.flow.packet_count())
    }

    /// 接收端对某条流的期待序号。
    pub fn expected_request_num(&self, flow_id: &str) -> Option<u64> {
        self.expected.get(flow_id).copied()
    }

    /// 流开始：发初始窗口遥测，随后填满窗口。
    pub fn on_flow_start(&mut self, sim: &mut Simulator) {
        let now = sim.now();
        let Some(s) = self.sender.as_ref() else {
            warn!(host = %self.name, "收到流启动事件但没有绑定流");
            return;
        };
        info!(host = %self.name, flow = %s.flow.id, ?now, "🚀 流启动");
        sim.schedule(
            now,
            Record(MetricSample {
                t_ns: now.0,
                kind: MetricKind::WindowSize {
                    flow: s.flow.id.clone(),
                    cwnd: s.cwnd,
                },
            }),
        );
        self.send_packets(now, sim);
    }

    /// 窗口填充循环：|awaitingAck| < cwnd 期间持续发包，
    /// 重传队列优先（取序号最小者），其次是窗口内的新序号。
    pub fn send_packets(&mut self, now: SimTime, sim: &mut Simulator) {
        let Some(link) = self.link else {
            warn!(host = %self.name, "主机未接链路，无法发送");
            return;
        };
        let host_id = self.id;
        let Some(s) = self.sender.as_mut() else {
            return;
        };

        loop {
            if (s.awaiting.len() as f64) >= s.cwnd {
                break;
            }
            let pkt = if let Some((&seq, _)) = s.retransmit.iter().next() {
                let pkt = s.retransmit.remove(&seq).expect("key from iteration");
                // 排队等待重发期间被累计确认的包直接跳过
                if pkt.seq < s.current_request_num {
                    continue;
                }
                pkt
            } else {
                if !(s.sb <= s.sn && s.sn <= s.sm) {
                    break;
                }
                if s.sn.saturating_mul(FLOW_PACKET_SIZE) >= s.flow.amount_bytes {
                    break;
                }
                let remaining = s.flow.amount_bytes - s.sn * FLOW_PACKET_SIZE;
                let pkt = FlowPacket {
                    flow_id: s.flow.id.clone(),
                    seq: s.sn,
                    size_bytes: FLOW_PACKET_SIZE.min(remaining),
                    src: host_id,
                    dest: s.flow.dest,
                };
                s.sn += 1;
                // 已在途或已被累计确认的序号跳过
                if s.awaiting.contains_key(&pkt.id()) || pkt.seq < s.current_request_num {
                    continue;
                }
                pkt
            };
            Self::dispatch_flow_packet(s, host_id, link, pkt, now, sim);
        }
    }

    fn dispatch_flow_packet(
        s: &mut SenderState,
        host: NodeId,
        link: LinkId,
        pkt: FlowPacket,
        now: SimTime,
        sim: &mut Simulator,
    ) {
        let id = pkt.id();
        debug!(flow = %s.flow.id, pkt = %id, "发送数据包");
        s.awaiting.insert(id.clone(), pkt.clone());
        s.sent_at.insert(id, now);
        s.cc.handle_send(&pkt, now);
        sim.schedule(
            now,
            SendToLink {
                link,
                origin: host,
                packet: Packet::Flow(pkt.clone()),
            },
        );
        sim.schedule(
            now.saturating_add(TIMEOUT_PERIOD),
            TimeoutEvent { host, packet: pkt },
        );
    }

    /// ACK 到达：累计清除、拥塞控制回调（看到推进前的 Sb）、窗口推进与再填充。
    fn on_ack(&mut self, ack: AckPacket, now: SimTime, sim: &mut Simulator) {
        let Some(s) = self.sender.as_mut() else {
            debug!(host = %self.name, "收到 ACK 但本机不是发送端，忽略");
            return;
        };
        if s.flow.id != ack.flow_id {
            debug!(host = %self.name, flow = %ack.flow_id, "ACK 不属于本机的流，忽略");
            return;
        }

        let req = ack.request_number;
        s.current_request_num = s.current_request_num.max(req);

        // RTT 采样：以触发包的发出时刻计
        if let Some(&sent) = s.sent_at.get(&ack.trigger_id) {
            sim.schedule(
                now,
                Record(MetricSample {
                    t_ns: now.0,
                    kind: MetricKind::Rtt {
                        flow: s.flow.id.clone(),
                        ms: now.saturating_sub(sent).as_millis_f64(),
                    },
                }),
            );
        }

        // 累计确认：清掉所有 seq < Rn 的在途包
        let acked: Vec<String> = s
            .awaiting
            .iter()
            .filter(|(_, p)| p.seq < req)
            .map(|(k, _)| k.clone())
            .collect();
        for key in acked {
            s.awaiting.remove(&key);
            s.sent_at.remove(&key);
        }
        s.retransmit.retain(|&seq, _| seq >= req);

        // 拥塞控制看到的是推进前的 Sb
        {
            let SenderState {
                flow,
                cwnd,
                cc,
                sn,
                sb,
                sm,
                ..
            } = s;
            let mut win = WindowCtx {
                flow_id: &flow.id,
                cwnd,
                sn: *sn,
                sb: *sb,
                sm: *sm,
            };
            cc.handle_receive(&ack, now, &mut win, sim);
        }

        if req > s.sb {
            let delta = req - s.sb;
            s.sb = req;
            s.sn = s.sb;
            s.sm = s.sm.saturating_add(delta);
            debug!(flow = %s.flow.id, sb = s.sb, sm = s.sm, "窗口推进");

            if s.sb >= s.flow.packet_count() {
                if !s.done {
                    s.done = true;
                    info!(host = %self.name, flow = %s.flow.id, ?now, "🏁 流传输完成");
                }
                return;
            }
            self.send_packets(now, sim);
        }
    }

    /// 接收端：按序则推进期待值；无论如何立即回 ACK（携带当前期待值）。
    fn on_flow_packet(&mut self, pkt: FlowPacket, now: SimTime, sim: &mut Simulator) {
        let Some(link) = self.link else {
            warn!(host = %self.name, "主机未接链路，无法回 ACK");
            return;
        };

        let expected = self.expected.entry(pkt.flow_id.clone()).or_insert(0);
        if pkt.seq == *expected {
            *expected += 1;
            let bits = self.accepted_bits.entry(pkt.flow_id.clone()).or_insert(0);
            *bits = bits.saturating_add(pkt.size_bytes * 8);
            let elapsed = now.as_secs_f64();
            if elapsed > 0.0 {
                sim.schedule(
                    now,
                    Record(MetricSample {
                        t_ns: now.0,
                        kind: MetricKind::FlowThroughput {
                            flow: pkt.flow_id.clone(),
                            bps: *bits as f64 / elapsed,
                        },
                    }),
                );
            }
        } else {
            debug!(
                host = %self.name,
                flow = %pkt.flow_id,
                seq = pkt.seq,
                expected = *expected,
                "乱序/重复数据包，期待值不变"
            );
        }

        let rn = *self.expected.get(&pkt.flow_id).expect("entry just touched");
        let ack = AckPacket {
            flow_id: pkt.flow_id.clone(),
            request_number: rn,
            trigger_id: pkt.id(),
            src: self.id,
            dest: pkt.src,
        };
        sim.schedule(
            now,
            SendToLink {
                link,
                origin: self.id,
                packet: Packet::Ack(ack),
            },
        );
    }

    /// 超时：已确认/已重发的包为空操作（幂等），否则移入重传队列并再填充。
    pub fn on_timeout(&mut self, pkt: FlowPacket, sim: &mut Simulator) {
        let now = sim.now();
        let Some(s) = self.sender.as_mut() else {
            return;
        };
        let id = pkt.id();
        if !s.awaiting.contains_key(&id) {
            return;
        }
        if pkt.seq < s.current_request_num {
            return;
        }
        s.awaiting.remove(&id);
        warn!(host = %self.name, pkt = %id, ?now, "⏰ 数据包超时");

        {
            let SenderState {
                flow,
                cwnd,
                cc,
                sn,
                sb,
                sm,
                ..
            } = s;
            let mut win = WindowCtx {
                flow_id: &flow.id,
                cwnd,
                sn: *sn,
                sb: *sb,
                sm: *sm,
            };
            cc.handle_timeout(&pkt, now, &mut win, sim);
        }

        s.retransmit.insert(pkt.seq, pkt);
        self.send_packets(now, sim);
    }
}

impl Node for Host {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn add_link(&mut self, link: LinkId) {
        if self.link.is_some() {
            warn!(host = %self.name, "主机只拥有一条链路，忽略多余的连接");
            return;
        }
        self.link = Some(link);
    }

    fn on_packet(&mut self, pkt: Packet, sim: &mut Simulator, _net: &mut Network) {
        let now = sim.now();
        match pkt {
            Packet::Flow(p) => self.on_flow_packet(p, now, sim),
            Packet::Ack(p) => self.on_ack(p, now, sim),
            // 路由包到达主机：忽略
            Packet::StaticRouting(_) | Packet::DynamicRouting(_) => {
                debug!(host = %self.name, "主机忽略路由包");
            }
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
