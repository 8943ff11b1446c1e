//! 节点能力接口
//!
//! 节点是一个顺序处理事件的状态机：处理完一个事件再处理下一个，内部没有线程。
//! 需要检查点的节点再实现 [`Persist`]。

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::event::{Emit, NodeEvent};
use crate::error::CheckpointError;

/// 节点接口
pub trait NodeModel {
    /// 获取节点名称
    fn name(&self) -> &str;

    /// 收到 `End` 之后为 false，之后的事件都被忽略
    fn is_running(&self) -> bool;

    /// 处理一个事件，把要发出的消息追加到 `out`
    fn handle_event(&mut self, ev: NodeEvent, out: &mut Vec<Emit>);
}

/// 检查点接口：以结构化记录导出/导入可变状态，存储格式由调用方决定。
pub trait Persist {
    type State: Serialize + DeserializeOwned + Clone;

    fn save_state(&self) -> Self::State;

    fn load_state(&mut self, state: &Self::State) -> Result<(), CheckpointError>;
}
