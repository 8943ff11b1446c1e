//! LBDR（logic-based distributed routing）
//!
//! 不查路由表：只比较当前节点与目的节点的网格坐标，再用每个路由器的静态
//! 连通位（哪些端口存在）和路由位（对角方向时偏向哪一维）决定输出方向。

use serde::{Deserialize, Serialize};

use super::direction::Direction;
use crate::error::ConfigError;

/// 2D 网格坐标：`x = addr % size`，`y = addr / size`。北为 y 减小，西为 x 减小。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshCoord {
    pub x: u16,
    pub y: u16,
}

impl MeshCoord {
    pub fn of(addr: u16, mesh_size: u16) -> MeshCoord {
        MeshCoord {
            x: addr % mesh_size,
            y: addr / mesh_size,
        }
    }

    pub fn addr(self, mesh_size: u16) -> u16 {
        self.y * mesh_size + self.x
    }
}

/// 解析 MSB 在前的位串（如 `"1011"`，最右边是 bit 0）。
fn parse_bit_str(field: &'static str, s: &str) -> Result<u16, ConfigError> {
    let s = s.trim();
    if s.is_empty() || s.len() > 16 {
        return Err(ConfigError::InvalidBits {
            field,
            value: s.to_string(),
        });
    }
    s.chars().try_fold(0u16, |acc, c| match c {
        '0' => Ok(acc << 1),
        '1' => Ok((acc << 1) | 1),
        _ => Err(ConfigError::InvalidBits {
            field,
            value: s.to_string(),
        }),
    })
}

/// 端口连通位：bit0=N, bit1=E, bit2=W, bit3=S。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectivityBits(pub u16);

impl ConnectivityBits {
    pub const ALL: ConnectivityBits = ConnectivityBits(0b1111);

    fn bit(dir: Direction) -> Option<u16> {
        match dir {
            Direction::North => Some(0),
            Direction::East => Some(1),
            Direction::West => Some(2),
            Direction::South => Some(3),
            Direction::Local => None,
        }
    }

    /// Local 端口总是存在
    pub fn has(self, dir: Direction) -> bool {
        match Self::bit(dir) {
            Some(b) => self.0 & (1 << b) != 0,
            None => true,
        }
    }

    pub fn with(self, dir: Direction) -> Self {
        match Self::bit(dir) {
            Some(b) => ConnectivityBits(self.0 | (1 << b)),
            None => self,
        }
    }

    /// 按网格位置推出存在的端口（边界上的端口不存在）
    pub fn for_position(addr: u16, mesh_size: u16) -> Self {
        let c = MeshCoord::of(addr, mesh_size);
        let mut bits = ConnectivityBits(0);
        if c.y > 0 {
            bits = bits.with(Direction::North);
        }
        if c.x + 1 < mesh_size {
            bits = bits.with(Direction::East);
        }
        if c.x > 0 {
            bits = bits.with(Direction::West);
        }
        if c.y + 1 < mesh_size {
            bits = bits.with(Direction::South);
        }
        bits
    }

    pub fn from_bit_str(s: &str) -> Result<Self, ConfigError> {
        parse_bit_str("connectivity_bits", s).map(ConnectivityBits)
    }
}

/// 路由（决胜）位：对角方向时选哪一维。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutingBits(pub u16);

impl RoutingBits {
    pub const NORTH_OVER_EAST: u16 = 0;
    pub const NORTH_OVER_WEST: u16 = 1;
    pub const EAST_OVER_NORTH: u16 = 2;
    pub const EAST_OVER_SOUTH: u16 = 3;
    pub const WEST_OVER_NORTH: u16 = 4;
    pub const WEST_OVER_SOUTH: u16 = 5;
    pub const SOUTH_OVER_EAST: u16 = 6;
    pub const SOUTH_OVER_WEST: u16 = 7;

    /// 先走 X 维（维序路由）
    pub const XY: RoutingBits = RoutingBits(
        (1 << Self::EAST_OVER_NORTH)
            | (1 << Self::EAST_OVER_SOUTH)
            | (1 << Self::WEST_OVER_NORTH)
            | (1 << Self::WEST_OVER_SOUTH),
    );

    /// 先走 Y 维
    pub const YX: RoutingBits = RoutingBits(
        (1 << Self::NORTH_OVER_EAST)
            | (1 << Self::NORTH_OVER_WEST)
            | (1 << Self::SOUTH_OVER_EAST)
            | (1 << Self::SOUTH_OVER_WEST),
    );

    pub fn get(self, bit: u16) -> bool {
        self.0 & (1 << bit) != 0
    }

    pub fn from_bit_str(s: &str) -> Result<Self, ConfigError> {
        parse_bit_str("routing_bits", s).map(RoutingBits)
    }
}

/// 计算 header 应去的输出方向（不考虑 grant）。
///
/// 按 N → E → W → S 的顺序取第一个满足路由条件且端口存在的方向；
/// 已到达目的地返回 Local；没有可用端口时返回 None。
pub fn lbdr_route(
    cur: u16,
    dst: u16,
    mesh_size: u16,
    conn: ConnectivityBits,
    rb: RoutingBits,
) -> Option<Direction> {
    let c = MeshCoord::of(cur, mesh_size);
    let d = MeshCoord::of(dst, mesh_size);

    let n = d.y < c.y;
    let s = c.y < d.y;
    let e = c.x < d.x;
    let w = d.x < c.x;

    if !n && !e && !w && !s {
        return Some(Direction::Local);
    }

    let wants = |dir: Direction| match dir {
        Direction::North => {
            (n && !e && !w)
                || (n && e && rb.get(RoutingBits::NORTH_OVER_EAST))
                || (n && w && rb.get(RoutingBits::NORTH_OVER_WEST))
        }
        Direction::East => {
            (e && !n && !s)
                || (e && n && rb.get(RoutingBits::EAST_OVER_NORTH))
                || (e && s && rb.get(RoutingBits::EAST_OVER_SOUTH))
        }
        Direction::West => {
            (w && !n && !s)
                || (w && n && rb.get(RoutingBits::WEST_OVER_NORTH))
                || (w && s && rb.get(RoutingBits::WEST_OVER_SOUTH))
        }
        Direction::South => {
            (s && !e && !w)
                || (s && e && rb.get(RoutingBits::SOUTH_OVER_EAST))
                || (s && w && rb.get(RoutingBits::SOUTH_OVER_WEST))
        }
        Direction::Local => false,
    };

    Direction::COMPASS
        .into_iter()
        .find(|&dir| wants(dir) && conn.has(dir))
}
