//! 网络模拟模块
//!
//! 此模块包含网络模拟的核心组件，如节点、链路、数据包和网络拓扑。

// 子模块声明
mod driver;
mod flow;
mod flow_start;
mod host;
mod id;
mod link;
mod link_free;
mod net_world;
mod network;
mod node;
mod packet;
mod packet_arrival;
mod router;
mod send_to_link;
mod timeout;

// 重新导出公共接口
pub use driver::run;
pub use flow::Flow;
pub use flow_start::FlowStart;
pub use host::{Host, TIMEOUT_PERIOD};
pub use id::{LinkId, NodeId};
pub use link::{Direction, Link};
pub use link_free::LinkFree;
pub use net_world::NetWorld;
pub use network::Network;
pub use node::Node;
pub use packet::{ACK_PACKET_SIZE, AckPacket, FLOW_PACKET_SIZE, FlowPacket, Packet, RoutingPacket};
pub use packet_arrival::PacketArrival;
pub use router::{
    DYNAMIC_UPDATE_INTERVAL, RouteEntry, Router, RoutingRefresh, RoutingTable,
    SAME_DATA_THRESHOLD,
};
pub use send_to_link::SendToLink;
pub use timeout::TimeoutEvent;
