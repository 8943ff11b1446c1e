//! 路由器核心：输入缓冲、LBDR 请求、固定优先级仲裁与信用流控
//!
//! 每个仿真周期调用一次 [`Router::arbitrate`]，最多移动一个 flit。
//! 虫洞约束：某个输出的 grant 从 header 选中它开始，一直保持到同一输入的
//! TAIL 离开为止，期间其它输入的 header 不能获得该输出。

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::direction::{DirMap, Direction};
use super::lbdr::{ConnectivityBits, RoutingBits, lbdr_route};
use crate::error::{BufferOverflow, FlitError};
use crate::flit::{Flit, parse_header};
use crate::queue::{DropTailFifo, FIFO_DEPTH, FlitQueue};

/// 每个输出端口的信用上限（等于下游输入 FIFO 深度）
pub const MAX_CREDITS: u8 = FIFO_DEPTH as u8;

/// 路由器静态配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    pub address: u16,
    pub mesh_size: u16,
    pub connectivity: ConnectivityBits,
    pub routing: RoutingBits,
}

impl RouterConfig {
    /// 按网格位置推出连通位，使用 XY 路由位
    pub fn for_mesh(address: u16, mesh_size: u16) -> Self {
        Self {
            address,
            mesh_size,
            connectivity: ConnectivityBits::for_position(address, mesh_size),
            routing: RoutingBits::XY,
        }
    }
}

/// 一次成功的转发
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Forwarded {
    pub input: Direction,
    pub output: Direction,
    pub flit: Flit,
}

/// 路由器计数器
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterCounters {
    pub forwarded_flits: u64,
    pub dropped_flits: u64,
    /// 空闲输入队首出现的非 header flit（所属 header 已被丢弃），直接丢弃
    pub orphan_flits: u64,
}

/// 路由器可持久化状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterState {
    pub address: u16,
    pub queues: DirMap<Vec<Flit>>,
    pub credits: DirMap<u8>,
    pub requests: DirMap<Option<Direction>>,
    pub grants: DirMap<bool>,
    pub counters: RouterCounters,
}

#[derive(Debug)]
pub struct Router {
    cfg: RouterConfig,
    queues: DirMap<DropTailFifo>,
    /// Local 项不参与流控，恒为上限
    credits: DirMap<u8>,
    requests: DirMap<Option<Direction>>,
    grants: DirMap<bool>,
    /// 本周期腾出缓冲槽位的输入端口，由适配层转成信用返还
    released: Vec<Direction>,
    counters: RouterCounters,
}

impl Router {
    pub fn new(cfg: RouterConfig) -> Self {
        Self {
            cfg,
            queues: DirMap::from_fn(|_| DropTailFifo::new(FIFO_DEPTH)),
            credits: DirMap::from_fn(|_| MAX_CREDITS),
            requests: DirMap::default(),
            grants: DirMap::default(),
            released: Vec::new(),
            counters: RouterCounters::default(),
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.cfg
    }

    pub fn address(&self) -> u16 {
        self.cfg.address
    }

    pub fn credit(&self, dir: Direction) -> u8 {
        self.credits[dir]
    }

    pub fn grant(&self, dir: Direction) -> bool {
        self.grants[dir]
    }

    pub fn request(&self, input: Direction) -> Option<Direction> {
        self.requests[input]
    }

    pub fn queue_len(&self, input: Direction) -> usize {
        self.queues[input].len()
    }

    pub fn counters(&self) -> RouterCounters {
        self.counters
    }

    /// 把到达的 flit 放入输入 FIFO；FIFO 已满时丢弃并返回 `BufferOverflow`。
    pub fn push_flit(&mut self, port: Direction, flit: Flit) -> Result<(), BufferOverflow> {
        match self.queues[port].enqueue(flit) {
            Ok(()) => {
                trace!(router = self.cfg.address, %port, %flit, len = self.queues[port].len(), "flit 入队");
                Ok(())
            }
            Err(flit) => {
                self.counters.dropped_flits += 1;
                warn!(router = self.cfg.address, %port, %flit, "⚠️  输入 FIFO 已满，丢弃 flit");
                Err(BufferOverflow { port, flit })
            }
        }
    }

    /// 收到下游返还的信用；在上限处饱和，Local 无信用计数。
    pub fn increase_credit(&mut self, dir: Direction) {
        if dir == Direction::Local {
            return;
        }
        if self.credits[dir] < MAX_CREDITS {
            self.credits[dir] += 1;
        }
        trace!(router = self.cfg.address, %dir, credit = self.credits[dir], "信用返还");
    }

    /// 为 header 计算请求。
    ///
    /// 首选方向已被其它包占用（grant 为真）或没有可用端口时返回 `Ok(None)`，
    /// 该输入本周期保持空闲，不会改走其它方向。选中方向时置位其 grant。
    pub fn route_direction(&mut self, header: Flit) -> Result<Option<Direction>, FlitError> {
        let h = parse_header(header)?;
        let Some(dir) = lbdr_route(
            self.cfg.address,
            h.dest,
            self.cfg.mesh_size,
            self.cfg.connectivity,
            self.cfg.routing,
        ) else {
            warn!(router = self.cfg.address, dest = h.dest, "没有可达目的地址的输出端口");
            return Ok(None);
        };

        if self.grants[dir] {
            trace!(router = self.cfg.address, %dir, "输出已被占用，请求保持空闲");
            return Ok(None);
        }

        self.grants[dir] = true;
        debug!(router = self.cfg.address, dest = h.dest, src = h.src, %dir, "LBDR 请求");
        Ok(Some(dir))
    }

    fn has_credit(&self, out: Direction) -> bool {
        out == Direction::Local || self.credits[out] > 0
    }

    /// 固定优先级 N → E → W → S → L 仲裁一个周期。
    ///
    /// 第一个成功转发的输入即结束本周期；高优先级输入没有进展时才轮到下一个。
    pub fn arbitrate(&mut self) -> Option<Forwarded> {
        Direction::ALL
            .into_iter()
            .find_map(|input| self.service_input(input))
    }

    fn service_input(&mut self, input: Direction) -> Option<Forwarded> {
        let front = self.queues[input].front()?;

        if self.requests[input].is_none() {
            if !front.is_header() {
                self.queues[input].dequeue();
                self.released.push(input);
                self.counters.orphan_flits += 1;
                warn!(router = self.cfg.address, %input, flit = %front, "空闲输入队首不是 header，丢弃");
                return None;
            }
            match self.route_direction(front) {
                Ok(req) => self.requests[input] = req,
                Err(e) => {
                    warn!(router = self.cfg.address, %input, error = %e, "header 解析失败");
                    return None;
                }
            }
        }

        let out = self.requests[input]?;
        if !self.has_credit(out) {
            trace!(router = self.cfg.address, %input, %out, "下游无信用，等待");
            return None;
        }

        let flit = self.queues[input].dequeue()?;
        if out != Direction::Local {
            self.credits[out] -= 1;
        }
        self.released.push(input);
        self.counters.forwarded_flits += 1;

        if flit.is_tail() {
            self.grants[out] = false;
            self.requests[input] = None;
        }

        debug!(
            router = self.cfg.address,
            %input,
            %out,
            %flit,
            credit = self.credits[out],
            "转发 flit"
        );
        Some(Forwarded {
            input,
            output: out,
            flit,
        })
    }

    /// 取出本周期需要向上游返还信用的输入端口
    pub fn drain_released(&mut self) -> Vec<Direction> {
        std::mem::take(&mut self.released)
    }

    pub fn state(&self) -> RouterState {
        RouterState {
            address: self.cfg.address,
            queues: DirMap::from_fn(|d| self.queues[d].contents()),
            credits: self.credits.clone(),
            requests: self.requests.clone(),
            grants: self.grants.clone(),
            counters: self.counters,
        }
    }

    /// 恢复可变状态；静态配置保持不变。
    pub fn restore(&mut self, state: &RouterState) {
        for dir in Direction::ALL {
            let mut q = DropTailFifo::new(FIFO_DEPTH);
            for &flit in &state.queues[dir] {
                if q.enqueue(flit).is_err() {
                    warn!(router = self.cfg.address, %dir, %flit, "检查点中的 FIFO 超出深度，截断");
                }
            }
            self.queues[dir] = q;
        }
        self.credits = DirMap::from_fn(|d| state.credits[d].min(MAX_CREDITS));
        self.requests = state.requests.clone();
        self.grants = state.grants.clone();
        self.counters = state.counters;
        self.released.clear();
    }
}
