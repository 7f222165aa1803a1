//! XML 拓扑装载器
//!
//! 根元素名不限；在整棵树里查找 `host`、`router`、`link`、`flow` 元素。
//! 单位换算：rate Mbps，delay ms，buffer-size KB，amount MB，start s。
//! 所有装载错误都是致命的：仿真不会在坏拓扑上启动。

use crate::cc::CongestionMode;
use crate::net::{Flow, NetWorld, NodeId};
use crate::sim::SimTime;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

/// 拓扑文件错误分类。
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("读取拓扑文件失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML 解析失败: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("<{element}> 缺少属性 `{attr}`")]
    MissingAttribute {
        element: &'static str,
        attr: &'static str,
    },
    #[error("<{element}> 属性 `{attr}` 的值 `{value}` 非法")]
    BadValue {
        element: &'static str,
        attr: &'static str,
        value: String,
    },
    #[error("引用了未知节点 `{0}`")]
    UnknownNode(String),
    #[error("flow `{flow}` 的源 `{src}` 不是主机")]
    FlowSourceNotHost { flow: String, src: String },
}

fn attr<'a>(
    node: roxmltree::Node<'a, '_>,
    element: &'static str,
    name: &'static str,
) -> Result<&'a str, TopologyError> {
    node.attribute(name)
        .ok_or(TopologyError::MissingAttribute {
            element,
            attr: name,
        })
}

fn parse_attr<T: FromStr>(
    node: roxmltree::Node<'_, '_>,
    element: &'static str,
    name: &'static str,
) -> Result<T, TopologyError> {
    let raw = attr(node, element, name)?;
    raw.parse().map_err(|_| TopologyError::BadValue {
        element,
        attr: name,
        value: raw.to_string(),
    })
}

/// 从文件装载拓扑。
pub fn load_file(path: &Path) -> Result<NetWorld, TopologyError> {
    let xml = std::fs::read_to_string(path)?;
    load_str(&xml)
}

/// 从 XML 字符串装载拓扑。
pub fn load_str(xml: &str) -> Result<NetWorld, TopologyError> {
    let doc = roxmltree::Document::parse(xml)?;
    let mut world = NetWorld::default();
    let mut nodes: HashMap<String, NodeId> = HashMap::new();

    for el in doc.root().descendants().filter(|n| n.has_tag_name("host")) {
        let id = attr(el, "host", "id")?;
        let nid = world.net.add_host(id);
        nodes.insert(id.to_string(), nid);
    }

    for el in doc.root().descendants().filter(|n| n.has_tag_name("router")) {
        let id = attr(el, "router", "id")?;
        let raw = attr(el, "router", "dynamic_routing")?;
        let dynamic = match raw {
            "True" => true,
            "False" => false,
            _ => {
                return Err(TopologyError::BadValue {
                    element: "router",
                    attr: "dynamic_routing",
                    value: raw.to_string(),
                });
            }
        };
        let nid = world.net.add_router(id, dynamic);
        nodes.insert(id.to_string(), nid);
    }

    for el in doc.root().descendants().filter(|n| n.has_tag_name("link")) {
        let id = attr(el, "link", "id")?;
        let rate: f64 = parse_attr(el, "link", "rate")?;
        let delay_ms: f64 = parse_attr(el, "link", "delay")?;
        let buffer_kb: f64 = parse_attr(el, "link", "buffer-size")?;
        let node1 = attr(el, "link", "node1")?;
        let node2 = attr(el, "link", "node2")?;
        let a = *nodes
            .get(node1)
            .ok_or_else(|| TopologyError::UnknownNode(node1.to_string()))?;
        let b = *nodes
            .get(node2)
            .ok_or_else(|| TopologyError::UnknownNode(node2.to_string()))?;
        world.net.connect(
            id,
            a,
            b,
            rate,
            SimTime::from_millis_f64(delay_ms),
            (buffer_kb * 1024.0).round() as u64,
        );
    }

    for el in doc.root().descendants().filter(|n| n.has_tag_name("flow")) {
        let id = attr(el, "flow", "id")?;
        let src_name = attr(el, "flow", "src")?;
        let dest_name = attr(el, "flow", "dest")?;
        let amount_mb: f64 = parse_attr(el, "flow", "amount")?;
        let start_s: f64 = parse_attr(el, "flow", "start")?;
        let congestion = match el.attribute("congestion") {
            None => CongestionMode::None,
            Some(raw) => CongestionMode::parse(raw).ok_or_else(|| TopologyError::BadValue {
                element: "flow",
                attr: "congestion",
                value: raw.to_string(),
            })?,
        };
        let src = *nodes
            .get(src_name)
            .ok_or_else(|| TopologyError::UnknownNode(src_name.to_string()))?;
        let dest = *nodes
            .get(dest_name)
            .ok_or_else(|| TopologyError::UnknownNode(dest_name.to_string()))?;

        let flow = Flow {
            id: id.to_string(),
            src,
            dest,
            amount_bytes: (amount_mb * 1024.0 * 1024.0).round() as u64,
            start: SimTime::from_secs_f64(start_s),
            congestion,
        };
        if !world.net.assign_flow(flow) {
            return Err(TopologyError::FlowSourceNotHost {
                flow: id.to_string(),
                src: src_name.to_string(),
            });
        }
    }

    info!(
        nodes = world.net.node_count(),
        links = world.net.links().len(),
        "拓扑装载完成"
    );
    Ok(world)
}
