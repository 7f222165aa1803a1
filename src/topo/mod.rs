//! 拓扑装载
//!
//! 从 XML 拓扑文件构建对象图（主机、路由器、链路、流）。

mod loader;

pub use loader::{TopologyError, load_file, load_str};
