//! 时钟事件
//!
//! `Tick` 是全局时钟：在时刻 t 给所有节点发 `SimTimeChanged(t)`，把它们发出的消息排成
//! 同一时刻的 [`Deliver`] 事件，然后调度 t+1 的节拍。因此节拍边界上没有在途消息。
//! `Stop` 向所有节点广播 `End`，之后不再产生节拍。

use super::deliver::Deliver;
use super::mesh_world::MeshWorld;
use crate::sim::{Event, SimTime, Simulator, World};
use tracing::{debug, info};

/// 时钟节拍；`until` 是最后一个节拍的时刻。
#[derive(Debug, Clone, Copy)]
pub struct Tick {
    pub until: SimTime,
}

impl Event for Tick {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = world
            .as_any_mut()
            .downcast_mut::<MeshWorld>()
            .expect("world must be MeshWorld");
        if w.mesh.is_stopped() {
            debug!(now = ?sim.now(), "网格已停止，丢弃节拍");
            return;
        }

        let now = sim.now();
        let deliveries = w.mesh.tick(now);
        for (to, event) in deliveries {
            sim.schedule(now, Deliver { to, event });
        }
        if now < self.until {
            sim.schedule(now.next(), *self);
        }
    }
}

/// 结束仿真：广播 `End`
#[derive(Debug, Clone, Copy, Default)]
pub struct Stop;

impl Event for Stop {
    #[tracing::instrument(skip(self, sim, world))]
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = world
            .as_any_mut()
            .downcast_mut::<MeshWorld>()
            .expect("world must be MeshWorld");
        info!(now = ?sim.now(), "⏹️  广播 End");
        w.mesh.broadcast_end();
    }
}
