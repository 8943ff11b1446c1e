//! 处理单元（PE）：生成器 + 接收端，经 Local 端口挂在一个路由器上
//!
//! 生成器产出的 flit 先进入源队列，PE 持有路由器 Local 输入 FIFO 的信用，
//! 每个周期在有信用时最多注入一个 flit。路由器 Local 输出的 flit 直接交给接收端。

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use super::generator::{GeneratorConfig, GeneratorState, PacketGenerator};
use super::sink::{PacketSink, ReceivedPacket, SinkCounters, SinkState};
use crate::error::CheckpointError;
use crate::flit::Flit;
use crate::net::{Emit, NodeEvent, NodeModel, Persist};
use crate::router::{Direction, MAX_CREDITS};
use crate::sim::SimTime;

/// 每个 PE 保留的最近接收包数；更早的只体现在接收端计数器里
pub const RECENT_PACKETS: usize = 32;

/// PE 的检查点记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeState {
    pub address: u16,
    pub now: SimTime,
    pub running: bool,
    pub local_credit: u8,
    pub source: Vec<Flit>,
    pub injected_flits: u64,
    pub generator: GeneratorState,
    pub sink: SinkState,
}

#[derive(Debug)]
pub struct ProcessingElement {
    name: String,
    generator: PacketGenerator,
    sink: PacketSink,
    local_credit: u8,
    source: VecDeque<Flit>,
    injected_flits: u64,
    received: VecDeque<ReceivedPacket>,
    now: SimTime,
    running: bool,
}

impl ProcessingElement {
    pub fn new(cfg: GeneratorConfig) -> Self {
        Self {
            name: format!("pe_{}", cfg.address),
            generator: PacketGenerator::new(cfg),
            sink: PacketSink::new(cfg.address),
            local_credit: MAX_CREDITS,
            source: VecDeque::new(),
            injected_flits: 0,
            received: VecDeque::with_capacity(RECENT_PACKETS),
            now: SimTime::ZERO,
            running: true,
        }
    }

    pub fn address(&self) -> u16 {
        self.generator.address()
    }

    pub fn generator(&self) -> &PacketGenerator {
        &self.generator
    }

    pub fn sink_counters(&self) -> SinkCounters {
        self.sink.counters()
    }

    pub fn local_credit(&self) -> u8 {
        self.local_credit
    }

    pub fn backlog(&self) -> usize {
        self.source.len()
    }

    pub fn injected_flits(&self) -> u64 {
        self.injected_flits
    }

    /// 最近完整接收的包（按到达顺序，最多 [`RECENT_PACKETS`] 个）
    pub fn received(&self) -> &VecDeque<ReceivedPacket> {
        &self.received
    }

    pub fn take_received(&mut self) -> Vec<ReceivedPacket> {
        self.received.drain(..).collect()
    }

    /// 绕过注入率策略，立即把一个完整的包放进源队列
    pub fn enqueue_packet(&mut self, length: u16, dest: u16) {
        let packet = self.generator.generate_packet(length, dest);
        info!(node = %self.name, dest, flits = packet.len(), "📦 手动注入数据包");
        self.source.extend(packet);
    }

    fn on_tick(&mut self, out: &mut Vec<Emit>) {
        if let Some(flit) = self.generator.get_flit(self.now) {
            self.source.push_back(flit);
        }
        if self.local_credit == 0 {
            if !self.source.is_empty() {
                trace!(node = %self.name, backlog = self.source.len(), "Local 无信用，等待");
            }
            return;
        }
        if let Some(flit) = self.source.pop_front() {
            self.local_credit -= 1;
            self.injected_flits += 1;
            debug!(node = %self.name, %flit, credit = self.local_credit, "注入 flit");
            out.push(Emit::Flit {
                port: Direction::Local,
                flit,
            });
        }
    }
}

impl NodeModel for ProcessingElement {
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
            NodeEvent::Flit { flit, .. } => {
                if let Some(pkt) = self.sink.put_flit(flit, self.now) {
                    if self.received.len() == RECENT_PACKETS {
                        self.received.pop_front();
                    }
                    self.received.push_back(pkt);
                }
            }
            NodeEvent::CreditIn(_) => {
                self.local_credit = (self.local_credit + 1).min(MAX_CREDITS);
            }
            NodeEvent::SimTimeChanged(t) => {
                self.now = t;
                self.on_tick(out);
            }
            NodeEvent::End => {
                self.running = false;
                info!(
                    now = %self.now,
                    sent_packets = self.generator.sent_packets(),
                    ok_packets = self.sink.counters().ok_packets,
                    "PE 停止"
                );
            }
        }
    }
}

impl Persist for ProcessingElement {
    type State = PeState;

    fn save_state(&self) -> PeState {
        PeState {
            address: self.address(),
            now: self.now,
            running: self.running,
            local_credit: self.local_credit,
            source: self.source.iter().copied().collect(),
            injected_flits: self.injected_flits,
            generator: self.generator.save(),
            sink: self.sink.save(),
        }
    }

    fn load_state(&mut self, state: &PeState) -> Result<(), CheckpointError> {
        let expected = self.address();
        if state.address != expected {
            return Err(CheckpointError::AddressMismatch {
                index: usize::from(expected),
                expected,
                found: state.address,
            });
        }
        self.now = state.now;
        self.running = state.running;
        self.local_credit = state.local_credit.min(MAX_CREDITS);
        self.source = state.source.iter().copied().collect();
        self.injected_flits = state.injected_flits;
        self.generator.load(&state.generator);
        self.sink.load(&state.sink);
        self.received.clear();
        Ok(())
    }
}
