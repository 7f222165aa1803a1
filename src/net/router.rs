//! 路由器节点
//!
//! 距离向量（Bellman-Ford 式）路由：邻居交换开销表，逐跳取严格更优者。
//! 静态表用链路容量作权重；动态表在静态权重上加缓冲驻留时延快照，
//! 由周期刷新重建，收敛（连续 SAME_DATA_THRESHOLD 次无更新）后整表生效。

use super::id::{LinkId, NodeId};
use super::net_world::NetWorld;
use super::network::Network;
use super::node::Node;
use super::packet::{Packet, RoutingPacket};
use super::send_to_link::SendToLink;
use crate::sim::{PeriodicEvent, SimTime, Simulator, World};
use std::any::Any;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// 动态路由刷新周期。
pub const DYNAMIC_UPDATE_INTERVAL: SimTime = SimTime(5_000_000_000);
/// 连续无更新的交换次数达到该值后，影子动态表生效、广播停止。
pub const SAME_DATA_THRESHOLD: u32 = 2;

/// 路由表项：出链路与累计开销。自身条目开销为 0 且无链路。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteEntry {
    pub link: Option<LinkId>,
    pub cost: f64,
}

pub type RoutingTable = BTreeMap<NodeId, RouteEntry>;

/// 路由器节点：拥有一组链路。
pub struct Router {
    id: NodeId,
    name: String,
    links: Vec<LinkId>,
    dynamic_routing: bool,

    static_table: Option<RoutingTable>,
    /// 已生效的动态表
    dynamic_table: Option<RoutingTable>,
    /// 构建中的影子动态表
    shadow_table: Option<RoutingTable>,
    same_data: u32,
    /// 收敛后置位：广播停止，直到更新或下一次刷新再激活
    converged: bool,
    timer_registered: bool,
}

impl Router {
    pub fn new(id: NodeId, name: impl Into<String>, dynamic_routing: bool) -> Self {
        Self {
            id,
            name: name.into(),
            links: Vec::new(),
            dynamic_routing,
            static_table: None,
            dynamic_table: None,
            shadow_table: None,
            same_data: 0,
            converged: false,
            timer_registered: false,
        }
    }

    pub fn dynamic_routing(&self) -> bool {
        self.dynamic_routing
    }

    pub fn static_table(&self) -> Option<&RoutingTable> {
        self.static_table.as_ref()
    }

    pub fn dynamic_table(&self) -> Option<&RoutingTable> {
        self.dynamic_table.as_ref()
    }

    pub fn same_data(&self) -> u32 {
        self.same_data
    }

    /// 转发用的当前表。
    fn active_table(&self) -> Option<&RoutingTable> {
        if self.dynamic_routing {
            self.dynamic_table.as_ref()
        } else {
            self.static_table.as_ref()
        }
    }

    /// 从邻居链路初始化路由表并向所有邻居广播开销表。
    ///
    /// 动态模式写入影子表，开销取构建时刻的缓冲驻留快照，
    /// 并在首次构建时注册周期刷新定时器。
    pub fn build_routing_table(
        &mut self,
        dynamic: bool,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        let now = sim.now();
        let mut table: RoutingTable = BTreeMap::new();
        table.insert(
            self.id,
            RouteEntry {
                link: None,
                cost: 0.0,
            },
        );
        for &lid in &self.links {
            let link = net.link(lid);
            let Some(peer) = link.other_end(self.id) else {
                continue;
            };
            let cost = if dynamic {
                link.dynamic_cost()
            } else {
                link.static_cost()
            };
            let better = table.get(&peer).is_none_or(|e| cost < e.cost);
            if better {
                table.insert(
                    peer,
                    RouteEntry {
                        link: Some(lid),
                        cost,
                    },
                );
            }
        }

        debug!(router = %self.name, dynamic, entries = table.len(), "构建路由表");
        if dynamic {
            self.shadow_table = Some(table);
            if !self.timer_registered {
                sim.add_timer(
                    now,
                    DYNAMIC_UPDATE_INTERVAL,
                    RoutingRefresh { router: self.id },
                );
                self.timer_registered = true;
            }
        } else {
            self.static_table = Some(table);
        }
        self.same_data = 0;
        self.converged = false;
        self.broadcast(dynamic, now, sim, net);
    }

    /// 把（去掉自身条目的）开销表发给每个邻居。
    fn broadcast(&self, dynamic: bool, now: SimTime, sim: &mut Simulator, net: &mut Network) {
        let table = if dynamic {
            self.shadow_table.as_ref()
        } else {
            self.static_table.as_ref()
        };
        let Some(table) = table else {
            return;
        };
        let cost_table: BTreeMap<NodeId, f64> = table
            .iter()
            .filter(|&(&n, _)| n != self.id)
            .map(|(&n, e)| (n, e.cost))
            .collect();

        for &lid in &self.links {
            let Some(peer) = net.link(lid).other_end(self.id) else {
                continue;
            };
            let rp = RoutingPacket {
                index: net.next_routing_packet_index(dynamic),
                src: self.id,
                dest: peer,
                cost_table: cost_table.clone(),
            };
            let packet = if dynamic {
                Packet::DynamicRouting(rp)
            } else {
                Packet::StaticRouting(rp)
            };
            sim.schedule(
                now,
                SendToLink {
                    link: lid,
                    origin: self.id,
                    packet,
                },
            );
        }
    }

    /// 处理邻居 s 的开销表：T[n] += cost(self→s)，严格更优才更新。
    ///
    /// 有更新：清零 sameData 并重广播；无更新：计数，达到阈值后停止广播
    /// （动态模式同时把影子表转正并清零本路由器各链路的驻留计量）。
    fn on_routing_packet(
        &mut self,
        dynamic: bool,
        rp: RoutingPacket,
        sim: &mut Simulator,
        net: &mut Network,
    ) {
        let now = sim.now();
        let missing = if dynamic {
            self.shadow_table.is_none()
        } else {
            self.static_table.is_none()
        };
        if missing {
            self.build_routing_table(dynamic, sim, net);
        }

        let table = if dynamic {
            self.shadow_table.as_mut()
        } else {
            self.static_table.as_mut()
        }
        .expect("table just built");

        let Some(via) = table.get(&rp.src) else {
            debug!(router = %self.name, src = ?rp.src, "开销表来自未知邻居，忽略");
            return;
        };
        let via_cost = via.cost;
        let via_link = via.link;

        let mut updated = false;
        for (&node, &cost) in &rp.cost_table {
            let total = cost + via_cost;
            let better = table.get(&node).is_none_or(|e| total < e.cost);
            if better {
                table.insert(
                    node,
                    RouteEntry {
                        link: via_link,
                        cost: total,
                    },
                );
                updated = true;
            }
        }

        if updated {
            self.same_data = 0;
            self.converged = false;
            self.broadcast(dynamic, now, sim, net);
        } else {
            if self.converged {
                // 已经收敛：迟到的无更新包不再引发广播
                return;
            }
            self.same_data += 1;
            if self.same_data >= SAME_DATA_THRESHOLD {
                if dynamic {
                    self.dynamic_table = self.shadow_table.clone();
                    for &lid in &self.links {
                        net.link_mut(lid).buffer.reset_dwell();
                    }
                    info!(router = %self.name, ?now, "🔄 动态路由表生效");
                }
                // 收敛：广播停止，等待下一次周期刷新
                self.same_data = 0;
                self.converged = true;
            } else {
                self.broadcast(dynamic, now, sim, net);
            }
        }
    }

    /// 按当前表转发数据/ACK 包；无表则触发构建并丢弃，未知目的地丢弃。
    fn forward(&mut self, pkt: Packet, sim: &mut Simulator, net: &mut Network) {
        let now = sim.now();
        let Some(table) = self.active_table() else {
            debug!(router = %self.name, pkt = %pkt.id(), "暂无路由表，触发构建并丢弃");
            self.build_routing_table(self.dynamic_routing, sim, net);
            return;
        };
        let dest = pkt.dest();
        let Some(entry) = table.get(&dest) else {
            warn!(router = %self.name, dest = ?dest, pkt = %pkt.id(), "目的地不可达，丢弃");
            return;
        };
        let Some(link) = entry.link else {
            warn!(router = %self.name, pkt = %pkt.id(), "目的地是自身，丢弃");
            return;
        };
        debug!(router = %self.name, pkt = %pkt.id(), link = ?link, "转发");
        sim.schedule(
            now,
            SendToLink {
                link,
                origin: self.id,
                packet: pkt,
            },
        );
    }
}

impl Node for Router {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn add_link(&mut self, link: LinkId) {
        self.links.push(link);
    }

    fn on_packet(&mut self, pkt: Packet, sim: &mut Simulator, net: &mut Network) {
        match pkt {
            Packet::StaticRouting(rp) => self.on_routing_packet(false, rp, sim, net),
            Packet::DynamicRouting(rp) => self.on_routing_packet(true, rp, sim, net),
            other => self.forward(other, sim, net),
        }
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// 周期事件：重建动态路由表（重新快照链路开销并发起新一轮交换）。
#[derive(Debug)]
pub struct RoutingRefresh {
    pub router: NodeId,
}

impl PeriodicEvent for RoutingRefresh {
    fn fire(&mut self, sim: &mut Simulator, world: &mut dyn World) {
        let w = world
            .as_any_mut()
            .downcast_mut::<NetWorld>()
            .expect("world must be NetWorld");
        let Some(mut node) = w.net.take_node(self.router) else {
            return;
        };
        if let Some(r) = node.as_any_mut().downcast_mut::<Router>() {
            debug!(router = %r.name, now = ?sim.now(), "周期刷新动态路由表");
            r.build_routing_table(true, sim, &mut w.net);
        }
        w.net.put_node(self.router, node);
    }
}
