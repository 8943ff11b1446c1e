//! 事件 trait
//!
//! 时钟节拍、事件投递与停止请求都以事件的形式进入仿真器队列。

use super::simulator::Simulator;
use super::world::World;

/// 事件：可被调度执行。使用 `self: Box<Self>` 以便执行时取回所有权。
pub trait Event: Send + 'static {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World);
}
