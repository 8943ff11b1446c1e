//! 网格检查点记录
//!
//! 只定义结构化记录；写成什么格式（CLI 用 JSON）由调用方决定。

use serde::{Deserialize, Serialize};

use crate::pe::PeState;
use crate::router::RouterNodeState;
use crate::sim::SimTime;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshSnapshot {
    /// 恢复后执行的第一个节拍
    pub next_cycle: SimTime,
    pub mesh_size: u16,
    #[serde(default)]
    pub stopped: bool,
    pub routers: Vec<RouterNodeState>,
    pub pes: Vec<PeState>,
}
