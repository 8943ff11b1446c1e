//! 世界 trait
//!
//! 仿真器只认识 `World`；事件通过 `as_any_mut` 取回具体类型（如网格世界）。

use super::simulator::Simulator;
use std::any::Any;

/// 仿真世界：由业务层实现，持有所有节点状态。
pub trait World: Any {
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// 每个事件执行后调用
    fn on_tick(&mut self, _sim: &mut Simulator) {}
}
