//! 路由器节点：把命名事件接到 [`Router`] 核心上

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::engine::{Router, RouterConfig, RouterState};
use crate::error::CheckpointError;
use crate::net::{Emit, NodeEvent, NodeModel, Persist};
use crate::sim::SimTime;

/// 路由器节点的检查点记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterNodeState {
    pub now: SimTime,
    pub running: bool,
    pub router: RouterState,
}

#[derive(Debug)]
pub struct RouterNode {
    name: String,
    router: Router,
    now: SimTime,
    running: bool,
}

impl RouterNode {
    pub fn new(cfg: RouterConfig) -> Self {
        Self {
            name: format!("router_{}", cfg.address),
            router: Router::new(cfg),
            now: SimTime::ZERO,
            running: true,
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    /// 一个时钟周期：仲裁一次，发出被转发的 flit，再为腾出的输入槽位返还信用。
    fn on_tick(&mut self, out: &mut Vec<Emit>) {
        if let Some(fwd) = self.router.arbitrate() {
            out.push(Emit::Flit {
                port: fwd.output,
                flit: fwd.flit,
            });
        }
        for input in self.router.drain_released() {
            out.push(Emit::Credit { port: input });
        }
    }
}

impl NodeModel for RouterNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_running(&self) -> bool {
        self.running
    }

    #[tracing::instrument(skip(self, out), fields(node = %self.name))]
    fn handle_event(&mut self, ev: NodeEvent, out: &mut Vec<Emit>) {
        if !self.running {
            debug!(event = %ev, "节点已停止，忽略事件");
            return;
        }
        match ev {
            NodeEvent::Flit { port, flit } => {
                if let Err(e) = self.router.push_flit(port, flit) {
                    debug!(error = %e, "输入 FIFO 溢出，flit 已丢弃");
                }
            }
            NodeEvent::CreditIn(dir) => self.router.increase_credit(dir),
            NodeEvent::SimTimeChanged(t) => {
                self.now = t;
                self.on_tick(out);
            }
            NodeEvent::End => {
                self.running = false;
                info!(now = %self.now, "路由器停止");
            }
        }
    }
}

impl Persist for RouterNode {
    type State = RouterNodeState;

    fn save_state(&self) -> RouterNodeState {
        RouterNodeState {
            now: self.now,
            running: self.running,
            router: self.router.state(),
        }
    }

    fn load_state(&mut self, state: &RouterNodeState) -> Result<(), CheckpointError> {
        let expected = self.router.address();
        if state.router.address != expected {
            return Err(CheckpointError::AddressMismatch {
                index: usize::from(expected),
                expected,
                found: state.router.address,
            });
        }
        self.now = state.now;
        self.running = state.running;
        self.router.restore(&state.router);
        Ok(())
    }
}
