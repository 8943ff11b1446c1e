//! 统计信息
//!
//! 汇总全网各节点计数器。

use serde::{Deserialize, Serialize};

/// 网格仿真统计信息
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshStats {
    pub generated_flits: u64,
    pub injected_flits: u64,
    pub forwarded_flits: u64,
    pub dropped_flits: u64,
    pub orphan_flits: u64,
    pub received_flits: u64,
    pub delivered_ok: u64,
    pub delivered_faulty: u64,
    pub flit_order_faults: u64,
    pub parity_errors: u64,
}
