//! 2D 网格：路由器、处理单元与它们之间的事件传递
//!
//! 每个地址有一个路由器和一个挂在其 Local 端口上的 PE。节点发出的消息按发送端口命名，
//! 这里把它交给邻居的对端端口：路由器的 East 输出到达东邻的 West 输入，
//! 信用沿反方向返回；Local 两端分别是路由器与同地址的 PE。

use tracing::{debug, info, trace, warn};

use super::checkpoint::MeshSnapshot;
use super::event::{Emit, NodeEvent};
use super::id::NodeId;
use super::node::{NodeModel, Persist};
use super::stats::MeshStats;
use crate::error::CheckpointError;
use crate::pe::ProcessingElement;
use crate::router::{Direction, MeshCoord, RouterNode};
use crate::sim::SimTime;

/// 一次待投递的事件
pub type Delivery = (NodeId, NodeEvent);

#[derive(Debug)]
pub struct Mesh {
    size: u16,
    routers: Vec<RouterNode>,
    pes: Vec<ProcessingElement>,
    stopped: bool,
}

impl Mesh {
    /// `routers` 与 `pes` 都按地址排列，长度为 `size * size`。
    pub fn new(size: u16, routers: Vec<RouterNode>, pes: Vec<ProcessingElement>) -> Self {
        debug_assert_eq!(routers.len(), usize::from(size) * usize::from(size));
        debug_assert_eq!(pes.len(), routers.len());
        info!(size, nodes = routers.len(), "🕸️  构建网格");
        Self {
            size,
            routers,
            pes,
            stopped: false,
        }
    }

    pub fn size(&self) -> u16 {
        self.size
    }

    pub fn node_count(&self) -> usize {
        self.routers.len()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn router(&self, addr: u16) -> Option<&RouterNode> {
        self.routers.get(usize::from(addr))
    }

    pub fn router_mut(&mut self, addr: u16) -> Option<&mut RouterNode> {
        self.routers.get_mut(usize::from(addr))
    }

    pub fn pe(&self, addr: u16) -> Option<&ProcessingElement> {
        self.pes.get(usize::from(addr))
    }

    pub fn pe_mut(&mut self, addr: u16) -> Option<&mut ProcessingElement> {
        self.pes.get_mut(usize::from(addr))
    }

    pub fn pes(&self) -> &[ProcessingElement] {
        &self.pes
    }

    pub fn routers(&self) -> &[RouterNode] {
        &self.routers
    }

    /// `addr` 的路由器沿 `dir` 方向连到的节点；网格边界外返回 None。
    pub fn neighbor(&self, addr: u16, dir: Direction) -> Option<NodeId> {
        let c = MeshCoord::of(addr, self.size);
        let (x, y) = match dir {
            Direction::Local => return Some(NodeId::Pe(addr)),
            Direction::North => (Some(c.x), c.y.checked_sub(1)),
            Direction::South => (Some(c.x), Some(c.y + 1)),
            Direction::West => (c.x.checked_sub(1), Some(c.y)),
            Direction::East => (Some(c.x + 1), Some(c.y)),
        };
        let (x, y) = (x?, y?);
        if x >= self.size || y >= self.size {
            return None;
        }
        Some(NodeId::Router(MeshCoord { x, y }.addr(self.size)))
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut dyn NodeModel> {
        match id {
            NodeId::Router(a) => self
                .routers
                .get_mut(usize::from(a))
                .map(|n| n as &mut dyn NodeModel),
            NodeId::Pe(a) => self
                .pes
                .get_mut(usize::from(a))
                .map(|n| n as &mut dyn NodeModel),
        }
    }

    /// 把节点发出的消息映射为接收方事件
    pub fn route_emit(&self, from: NodeId, emit: Emit) -> Option<Delivery> {
        let addr = from.address();
        match from {
            NodeId::Pe(_) => {
                let ev = match emit {
                    Emit::Flit { flit, .. } => NodeEvent::Flit {
                        port: Direction::Local,
                        flit,
                    },
                    Emit::Credit { .. } => NodeEvent::CreditIn(Direction::Local),
                };
                Some((NodeId::Router(addr), ev))
            }
            NodeId::Router(_) => {
                let (port, ev) = match emit {
                    Emit::Flit { port, flit } => (
                        port,
                        NodeEvent::Flit {
                            port: port.opposite(),
                            flit,
                        },
                    ),
                    Emit::Credit { port } => (port, NodeEvent::CreditIn(port.opposite())),
                };
                match self.neighbor(addr, port) {
                    Some(to) => Some((to, ev)),
                    None => {
                        warn!(%from, event = %emit.name(), %port, "⚠️  端口没有邻居，消息被丢弃");
                        None
                    }
                }
            }
        }
    }

    /// 让一个节点处理事件，返回它发出的消息对应的投递
    #[tracing::instrument(skip(self, to, ev), fields(to = %to, event = %ev))]
    pub fn deliver(&mut self, to: NodeId, ev: NodeEvent) -> Vec<Delivery> {
        let mut out = Vec::new();
        match self.node_mut(to) {
            Some(node) => node.handle_event(ev, &mut out),
            None => {
                warn!("目标节点不存在");
                return Vec::new();
            }
        }
        trace!(emitted = out.len(), "节点处理完成");
        out.into_iter()
            .filter_map(|emit| self.route_emit(to, emit))
            .collect()
    }

    /// 时钟节拍：先所有 PE，再所有路由器，各收到一次 `SimTimeChanged`。
    ///
    /// 返回值是本节拍产生的投递，由调用方在同一时刻交付。
    pub fn tick(&mut self, now: SimTime) -> Vec<Delivery> {
        if self.stopped {
            return Vec::new();
        }
        let mut deliveries = Vec::new();
        let ids = (0..self.size * self.size)
            .map(NodeId::Pe)
            .chain((0..self.size * self.size).map(NodeId::Router));
        for id in ids {
            deliveries.extend(self.deliver(id, NodeEvent::SimTimeChanged(now)));
        }
        trace!(now = now.0, deliveries = deliveries.len(), "节拍完成");
        deliveries
    }

    /// 向所有节点广播 `End`
    pub fn broadcast_end(&mut self) {
        let addrs = 0..self.size * self.size;
        for a in addrs {
            self.deliver(NodeId::Pe(a), NodeEvent::End);
            self.deliver(NodeId::Router(a), NodeEvent::End);
        }
        self.stopped = true;
        info!(stats = ?self.stats(), "🛑 网格停止");
    }

    pub fn stats(&self) -> MeshStats {
        let mut s = MeshStats::default();
        for pe in &self.pes {
            let c = pe.sink_counters();
            s.generated_flits += pe.generator().sent_flits();
            s.injected_flits += pe.injected_flits();
            s.received_flits += c.received_flits;
            s.delivered_ok += c.ok_packets;
            s.delivered_faulty += c.faulty_packets;
            s.flit_order_faults += c.flit_order_faults;
            s.parity_errors += c.parity_errors;
        }
        for r in &self.routers {
            let c = r.router().counters();
            s.forwarded_flits += c.forwarded_flits;
            s.dropped_flits += c.dropped_flits;
            s.orphan_flits += c.orphan_flits;
        }
        s
    }

    /// 在节拍边界导出全部节点状态；`next_cycle` 是恢复后要执行的第一个节拍。
    pub fn snapshot(&self, next_cycle: SimTime) -> MeshSnapshot {
        MeshSnapshot {
            next_cycle,
            mesh_size: self.size,
            stopped: self.stopped,
            routers: self.routers.iter().map(Persist::save_state).collect(),
            pes: self.pes.iter().map(Persist::save_state).collect(),
        }
    }

    /// 从快照恢复；网格形状或地址不一致时不修改任何节点。
    pub fn restore(&mut self, snap: &MeshSnapshot) -> Result<(), CheckpointError> {
        if snap.routers.len() != self.routers.len() {
            return Err(CheckpointError::ShapeMismatch {
                kind: "routers",
                snapshot: snap.routers.len(),
                mesh: self.routers.len(),
            });
        }
        if snap.pes.len() != self.pes.len() {
            return Err(CheckpointError::ShapeMismatch {
                kind: "processing elements",
                snapshot: snap.pes.len(),
                mesh: self.pes.len(),
            });
        }
        for (index, r) in snap.routers.iter().enumerate() {
            let expected = self.routers[index].router().address();
            if r.router.address != expected {
                return Err(CheckpointError::AddressMismatch {
                    index,
                    expected,
                    found: r.router.address,
                });
            }
        }
        for (index, p) in snap.pes.iter().enumerate() {
            let expected = self.pes[index].address();
            if p.address != expected {
                return Err(CheckpointError::AddressMismatch {
                    index,
                    expected,
                    found: p.address,
                });
            }
        }

        for (node, state) in self.routers.iter_mut().zip(&snap.routers) {
            node.load_state(state)?;
        }
        for (node, state) in self.pes.iter_mut().zip(&snap.pes) {
            node.load_state(state)?;
        }
        self.stopped = snap.stopped;
        debug!(next_cycle = snap.next_cycle.0, "从快照恢复网格");
        Ok(())
    }
}
