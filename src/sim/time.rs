//! 仿真时间类型
//!
//! 仿真时间以时钟周期计，所有节点共用同一时钟。

use std::fmt;
use std::ops::Add;

use serde::{Deserialize, Serialize};

/// 仿真时间（周期）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);
    pub const MAX: SimTime = SimTime(u64::MAX);

    pub fn from_cycles(cycles: u64) -> SimTime {
        SimTime(cycles)
    }

    pub fn cycles(self) -> u64 {
        self.0
    }

    /// 下一个周期，在上限处饱和
    pub fn next(self) -> SimTime {
        SimTime(self.0.saturating_add(1))
    }
}

impl Add<u64> for SimTime {
    type Output = SimTime;

    fn add(self, rhs: u64) -> SimTime {
        SimTime(self.0.saturating_add(rhs))
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}cyc", self.0)
    }
}
