//! 仿真核心模块
//!
//! 此模块包含事件驱动仿真的核心组件，如仿真时间、事件、世界和仿真器，以及网格配置。

// 子模块声明
mod config;
mod event;
mod scheduled_event;
mod simulator;
mod stop;
mod time;
mod world;

// 重新导出公共接口
pub use config::{
    GeneratorSpec, MAX_MESH_SIZE, MeshSpec, RouterSpec, SCHEMA_VERSION, TrafficSpec,
};
pub use event::Event;
pub use scheduled_event::ScheduledEvent;
pub use simulator::Simulator;
pub use stop::StopToken;
pub use time::SimTime;
pub use world::World;
