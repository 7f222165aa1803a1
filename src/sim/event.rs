//! 事件 trait
//!
//! 网络里发生的一切——包上线、包到达、链路释放、超时、流启动——
//! 都建模为一次性事件，由调度器在指定时刻执行。

/// 一次性仿真事件。
///
/// `execute` 以 `self: Box<Self>` 按值消耗事件，事件携带的数据
/// （packet、id 等）随之移交给处理方，不需要再克隆。
pub trait Event: Send + 'static {
    fn execute(self: Box<Self>, sim: &mut super::Simulator, world: &mut dyn super::World);
}
