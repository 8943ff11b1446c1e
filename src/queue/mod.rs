//! 输入缓冲策略
//!
//! 路由器输入端口使用固定深度的 DropTail FIFO：满时直接丢弃新到达的 flit。

use crate::flit::Flit;

mod drop_tail;

pub use drop_tail::DropTailFifo;

/// 路由器每个输入 FIFO 的深度，也是每个输出端口的初始信用数。
pub const FIFO_DEPTH: usize = 3;

/// Flit 队列抽象
pub trait FlitQueue: std::fmt::Debug {
    /// 入队：成功返回 Ok；若被丢弃则返回 Err(flit)
    fn enqueue(&mut self, flit: Flit) -> Result<(), Flit>;
    /// 出队：按 FIFO 顺序返回下一个 flit
    fn dequeue(&mut self) -> Option<Flit>;
    /// 查看队首但不出队
    fn front(&self) -> Option<Flit>;

    fn len(&self) -> usize;
    fn capacity(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }
}
