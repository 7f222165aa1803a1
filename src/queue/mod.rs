//! 队列策略（Queue disciplines）
//!
//! 链路缓冲是双方向共享容量的 DropTail（尾丢弃）FIFO，
//! 并记录逐包入队时间以计量平均驻留时延。

mod link_buffer;

pub use link_buffer::LinkBuffer;
