//! 路由器
//!
//! 五个方向的输入 FIFO、LBDR 路由、按输出的信用计数与固定优先级仲裁。

mod direction;
mod engine;
mod lbdr;
mod node;

pub use direction::{DirMap, Direction};
pub use engine::{Forwarded, MAX_CREDITS, Router, RouterConfig, RouterCounters, RouterState};
pub use lbdr::{ConnectivityBits, MeshCoord, RoutingBits, lbdr_route};
pub use node::{RouterNode, RouterNodeState};
