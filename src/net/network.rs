//! 网络拓扑管理
//!
//! 中心注册表：持有节点与链路，名字到 id 的映射，以及路由包计数器。
//! 组件之间只保存 id（非拥有句柄），避免循环所有权。

use super::flow::Flow;
use super::flow_start::FlowStart;
use super::host::Host;
use super::id::{LinkId, NodeId};
use super::link::Link;
use super::node::Node;
use super::packet::Packet;
use super::router::Router;
use crate::sim::{SimTime, Simulator};
use std::collections::HashMap;
use tracing::{debug, warn};

/// 网络拓扑
#[derive(Default)]
pub struct Network {
    nodes: Vec<Option<Box<dyn Node>>>,
    node_names: Vec<String>,
    links: Vec<Link>,
    name_to_node: HashMap<String, NodeId>,
    name_to_link: HashMap<String, LinkId>,
    next_static_idx: u64,
    next_dynamic_idx: u64,
}

impl Network {
    /// 添加主机节点
    pub fn add_host(&mut self, name: impl Into<String>) -> NodeId {
        let name = name.into();
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Box::new(Host::new(id, name.clone()))));
        self.node_names.push(name.clone());
        self.name_to_node.insert(name, id);
        id
    }

    /// 添加路由器节点
    pub fn add_router(&mut self, name: impl Into<String>, dynamic_routing: bool) -> NodeId {
        let name = name.into();
        let id = NodeId(self.nodes.len());
        self.nodes
            .push(Some(Box::new(Router::new(id, name.clone(), dynamic_routing))));
        self.node_names.push(name.clone());
        self.name_to_node.insert(name, id);
        id
    }

    /// 连接两个节点（创建双向半双工链路）并登记到两端。
    pub fn connect(
        &mut self,
        name: impl Into<String>,
        node_a: NodeId,
        node_b: NodeId,
        rate_mbps: f64,
        delay: SimTime,
        buffer_cap_bytes: u64,
    ) -> LinkId {
        let name = name.into();
        let id = LinkId(self.links.len());
        self.links.push(Link::new(
            id,
            name.clone(),
            node_a,
            node_b,
            rate_mbps,
            delay,
            buffer_cap_bytes,
        ));
        self.name_to_link.insert(name, id);
        for endpoint in [node_a, node_b] {
            if let Some(node) = self.nodes[endpoint.0].as_mut() {
                node.add_link(id);
            }
        }
        id
    }

    /// 把流绑定到源主机（发送端角色）。源不是主机时返回 false。
    pub fn assign_flow(&mut self, flow: Flow) -> bool {
        let src = flow.src;
        match self.node_as_mut::<Host>(src) {
            Some(host) => {
                host.assign_flow(flow);
                true
            }
            None => false,
        }
    }

    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.name_to_node.get(name).copied()
    }

    pub fn link_id(&self, name: &str) -> Option<LinkId> {
        self.name_to_link.get(name).copied()
    }

    pub fn node_name(&self, id: NodeId) -> &str {
        &self.node_names[id.0]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link(&self, id: LinkId) -> &Link {
        &self.links[id.0]
    }

    pub fn link_mut(&mut self, id: LinkId) -> &mut Link {
        &mut self.links[id.0]
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// 就地把节点下转型为具体类型（节点当前必须在槽位里）。
    pub fn node_as_mut<T: 'static>(&mut self, id: NodeId) -> Option<&mut T> {
        self.nodes.get_mut(id.0)?.as_mut()?.as_any_mut().downcast_mut()
    }

    pub(crate) fn take_node(&mut self, id: NodeId) -> Option<Box<dyn Node>> {
        self.nodes.get_mut(id.0)?.take()
    }

    pub(crate) fn put_node(&mut self, id: NodeId, node: Box<dyn Node>) {
        self.nodes[id.0] = Some(node);
    }

    /// 路由包 id 计数器（静态 "SR.n" / 动态 "DR.n"）。
    pub fn next_routing_packet_index(&mut self, dynamic: bool) -> u64 {
        let counter = if dynamic {
            &mut self.next_dynamic_idx
        } else {
            &mut self.next_static_idx
        };
        let idx = *counter;
        *counter = counter.wrapping_add(1);
        idx
    }

    /// 将数据包交付给节点处理
    #[tracing::instrument(skip(self, sim, pkt), fields(pkt_id = %pkt.id(), to = ?to))]
    pub fn deliver(&mut self, to: NodeId, pkt: Packet, sim: &mut Simulator) {
        debug!("📬 将数据包交付给节点处理");

        // 暂时把节点取出来，避免 &mut self 与 &mut node 的重叠借用。
        let Some(mut node) = self.take_node(to) else {
            warn!(to = ?to, "目的节点不存在或不在位，丢弃");
            return;
        };
        node.on_packet(pkt, sim, self);
        self.put_node(to, node);
    }

    /// 网络就绪：每个路由器发起静态路由表构建；每条流调度启动事件。
    pub fn bring_up(&mut self, sim: &mut Simulator) {
        for idx in 0..self.nodes.len() {
            let id = NodeId(idx);
            let Some(mut node) = self.take_node(id) else {
                continue;
            };
            if let Some(router) = node.as_any_mut().downcast_mut::<Router>() {
                router.build_routing_table(false, sim, self);
            } else if let Some(host) = node.as_any_mut().downcast_mut::<Host>() {
                if let Some(flow) = host.flow() {
                    debug!(host = %host.name(), flow = %flow.id, start = ?flow.start, "调度流启动");
                    sim.schedule(flow.start, FlowStart { host: id });
                }
            }
            self.put_node(id, node);
        }
    }

    /// 每条流的完成情况（CLI 摘要用）：(flowId, 已确认包数, 总包数)。
    pub fn flow_summaries(&mut self) -> Vec<(String, u64, u64)> {
        let mut out = Vec::new();
        for idx in 0..self.nodes.len() {
            if let Some(host) = self.node_as_mut::<Host>(NodeId(idx)) {
                if let (Some(flow), Some(base)) = (host.flow().cloned(), host.base_seq()) {
                    out.push((flow.id.clone(), base.min(flow.packet_count()), flow.packet_count()));
                }
            }
        }
        out
    }
}
