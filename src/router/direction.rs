//! 方向与按方向索引的容器

use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// 路由器端口方向。声明顺序即仲裁优先级：N → E → W → S → L。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    East,
    West,
    South,
    Local,
}

impl Direction {
    /// 仲裁优先级顺序
    pub const ALL: [Direction; 5] = [
        Direction::North,
        Direction::East,
        Direction::West,
        Direction::South,
        Direction::Local,
    ];

    /// 四个网格方向（有信用计数的输出）
    pub const COMPASS: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::West,
        Direction::South,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// 对端端口；Local 的对端仍是 Local（PE 与路由器之间）
    pub const fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            Direction::South => Direction::North,
            Direction::Local => Direction::Local,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Direction::North => "North",
            Direction::East => "East",
            Direction::West => "West",
            Direction::South => "South",
            Direction::Local => "Local",
        }
    }

    pub fn from_name(name: &str) -> Option<Direction> {
        Direction::ALL.into_iter().find(|d| d.name() == name)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 按 `Direction` 索引的五元数组，替代每个方向各写一份的字段。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirMap<T>(pub [T; 5]);

impl<T> DirMap<T> {
    pub fn from_fn(f: impl FnMut(Direction) -> T) -> Self {
        DirMap(Direction::ALL.map(f))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Direction, &T)> {
        Direction::ALL.into_iter().zip(self.0.iter())
    }
}

impl<T> Index<Direction> for DirMap<T> {
    type Output = T;

    fn index(&self, dir: Direction) -> &T {
        &self.0[dir.index()]
    }
}

impl<T> IndexMut<Direction> for DirMap<T> {
    fn index_mut(&mut self, dir: Direction) -> &mut T {
        &mut self.0[dir.index()]
    }
}
