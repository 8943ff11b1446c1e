//! DropTail（尾丢弃）FIFO
//!
//! 当队列已满时，直接丢弃新到达的 flit。

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::flit::Flit;

use super::{FIFO_DEPTH, FlitQueue};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropTailFifo {
    max_flits: usize,
    q: VecDeque<Flit>,
}

impl Default for DropTailFifo {
    fn default() -> Self {
        Self::new(FIFO_DEPTH)
    }
}

impl DropTailFifo {
    pub fn new(max_flits: usize) -> Self {
        Self {
            max_flits,
            q: VecDeque::with_capacity(max_flits),
        }
    }

    /// 队列内容（队首在前），用于检查点
    pub fn contents(&self) -> Vec<Flit> {
        self.q.iter().copied().collect()
    }
}

impl FlitQueue for DropTailFifo {
    fn enqueue(&mut self, flit: Flit) -> Result<(), Flit> {
        if self.q.len() >= self.max_flits {
            return Err(flit);
        }
        self.q.push_back(flit);
        Ok(())
    }

    fn dequeue(&mut self) -> Option<Flit> {
        self.q.pop_front()
    }

    fn front(&self) -> Option<Flit> {
        self.q.front().copied()
    }

    fn len(&self) -> usize {
        self.q.len()
    }

    fn capacity(&self) -> usize {
        self.max_flits
    }
}
