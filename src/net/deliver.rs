//! 事件投递
//!
//! 把一个命名事件交给某个节点处理；节点因此发出的消息在同一时刻继续投递。

use super::event::NodeEvent;
use super::id::NodeId;
use super::mesh_world::MeshWorld;
use crate::sim::{Event, Simulator, World};
use tracing::trace;

/// 事件：把 `event` 交给节点 `to`。
#[derive(Debug)]
pub struct Deliver {
    pub to: NodeId,
    pub event: NodeEvent,
}

impl Event for Deliver {
    #[tracing::instrument(skip(self, sim, world), fields(to = %self.to, event = %self.event))]
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let Deliver { to, event } = *self;

        let w = world
            .as_any_mut()
            .downcast_mut::<MeshWorld>()
            .expect("world must be MeshWorld");

        let now = sim.now();
        for (to, event) in w.mesh.deliver(to, event) {
            sim.schedule(now, Deliver { to, event });
        }
        trace!("Deliver::execute 完成");
    }
}
