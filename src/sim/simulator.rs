//! 仿真器
//!
//! 定义事件驱动仿真器，维护当前时间与事件队列。

use super::event::Event;
use super::scheduled_event::ScheduledEvent;
use super::stop::StopToken;
use super::time::SimTime;
use super::world::World;
use std::collections::BinaryHeap;
use tracing::{debug, info, trace};

/// 事件驱动仿真器：维护当前时间与事件队列。
#[derive(Default)]
pub struct Simulator {
    now: SimTime,
    next_seq: u64,
    q: BinaryHeap<ScheduledEvent>,
}

impl Simulator {
    /// 从给定时间开始的仿真器（用于检查点恢复）
    pub fn starting_at(now: SimTime) -> Self {
        Self {
            now,
            ..Self::default()
        }
    }

    /// 获取当前仿真时间
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// 队列中尚未执行的事件数
    pub fn pending(&self) -> usize {
        self.q.len()
    }

    /// 调度事件在指定时间执行
    #[tracing::instrument(skip(self, ev), fields(event_type = std::any::type_name::<E>(), schedule_at = ?at))]
    pub fn schedule<E: Event>(&mut self, at: SimTime, ev: E) {
        let seq = self.next_seq;
        trace!(now = ?self.now, seq, "调度事件");

        self.next_seq = self.next_seq.wrapping_add(1);
        self.q.push(ScheduledEvent {
            at,
            seq,
            ev: Box::new(ev),
        });

        trace!(queue_size = self.q.len(), "事件已加入队列");
    }

    /// 弹出下一个不晚于 `until` 的事件
    fn pop_due(&mut self, until: SimTime) -> Option<ScheduledEvent> {
        if self.q.peek()?.at > until {
            return None;
        }
        self.q.pop()
    }

    /// 运行直到事件队列为空或到达 `until`。
    pub fn run_until(&mut self, until: SimTime, world: &mut dyn World) {
        while let Some(item) = self.pop_due(until) {
            self.now = item.at;
            item.ev.execute(self, world);
            world.on_tick(self);
        }
        self.now = self.now.max(until);
    }

    /// 与 [`Simulator::run_until`] 相同，但每个事件之后检查停止令牌。
    ///
    /// 返回 true 表示因令牌提前停止；此时时间停留在最后执行的事件上，剩余事件保留在队列中。
    #[tracing::instrument(skip(self, world, stop))]
    pub fn run_until_stopped(
        &mut self,
        until: SimTime,
        world: &mut dyn World,
        stop: &StopToken,
    ) -> bool {
        let mut event_count: u64 = 0;
        while !stop.is_stopped() {
            let Some(item) = self.pop_due(until) else {
                self.now = self.now.max(until);
                debug!(total_events = event_count, now = ?self.now, "到达结束时间");
                return false;
            };
            event_count += 1;
            self.now = item.at;
            item.ev.execute(self, world);
            world.on_tick(self);
        }
        info!(total_events = event_count, now = ?self.now, "⏹️  收到停止请求");
        true
    }

    /// 运行所有事件直到队列为空。
    #[tracing::instrument(skip(self, world))]
    pub fn run(&mut self, world: &mut dyn World) {
        info!("▶️  开始运行仿真");
        debug!(now = ?self.now, queue_size = self.q.len(), "初始状态");

        let mut event_count = 0;
        while let Some(item) = self.q.pop() {
            event_count += 1;
            self.now = item.at;

            trace!(
                event_num = event_count,
                now = ?self.now,
                seq = item.seq,
                remaining_queue = self.q.len(),
                "执行事件"
            );

            item.ev.execute(self, world);
            world.on_tick(self);
        }

        info!(
            total_events = event_count,
            final_time = ?self.now,
            "✅ 仿真完成"
        );
    }
}
