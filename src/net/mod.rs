//! 网格仿真模块
//!
//! 此模块包含节点接口、命名事件、网格拓扑与驱动它们的时钟/投递事件。

// 子模块声明
mod checkpoint;
mod deliver;
mod event;
mod id;
mod mesh;
mod mesh_world;
mod node;
mod stats;
mod tick;

// 重新导出公共接口
pub use checkpoint::MeshSnapshot;
pub use deliver::Deliver;
pub use event::{Emit, NodeEvent, credit_event_name};
pub use id::NodeId;
pub use mesh::{Delivery, Mesh};
pub use mesh_world::MeshWorld;
pub use node::{NodeModel, Persist};
pub use stats::MeshStats;
pub use tick::{Stop, Tick};
