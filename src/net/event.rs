//! 节点间的命名事件
//!
//! 事件名沿用传输层约定：`North`/`East`/`West`/`South`/`Local` 携带 flit，
//! `Credit_in_<D>++` 表示信用返还，`SimTimeChanged` 为时钟节拍，`End` 请求停止。
//!
//! 命名规则：发出方按自己的端口命名（`Emit`），传输层把它交给邻居的对端端口
//! （`NodeEvent` 中的 `port` 是接收方视角）。

use std::fmt;

use crate::flit::Flit;
use crate::router::Direction;
use crate::sim::SimTime;

/// 节点收到的事件（接收方视角）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeEvent {
    /// 从 `port` 输入端到达的 flit
    Flit { port: Direction, flit: Flit },
    /// 输出端口 `port` 的下游腾出了一个缓冲槽
    CreditIn(Direction),
    SimTimeChanged(SimTime),
    End,
}

/// 节点发出的消息（发送方视角）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emit {
    /// 从自己的 `port` 输出端送出 flit
    Flit { port: Direction, flit: Flit },
    /// 从自己的 `port` 输入端向上游返还一个信用
    Credit { port: Direction },
}

fn short(dir: Direction) -> char {
    match dir {
        Direction::North => 'N',
        Direction::East => 'E',
        Direction::West => 'W',
        Direction::South => 'S',
        Direction::Local => 'L',
    }
}

fn from_short(s: &str) -> Option<Direction> {
    Direction::ALL
        .into_iter()
        .find(|&d| s.len() == 1 && s.starts_with(short(d)))
        .or_else(|| Direction::from_name(s))
}

/// 信用返还事件名，如 `Credit_in_N++`
pub fn credit_event_name(dir: Direction) -> String {
    format!("Credit_in_{}++", short(dir))
}

impl NodeEvent {
    pub fn name(&self) -> String {
        match self {
            NodeEvent::Flit { port, .. } => port.name().to_string(),
            NodeEvent::CreditIn(d) => credit_event_name(*d),
            NodeEvent::SimTimeChanged(_) => "SimTimeChanged".to_string(),
            NodeEvent::End => "End".to_string(),
        }
    }

    /// 由事件名与附带数据还原事件；flit 事件缺少 flit 数据时返回 None。
    ///
    /// 信用事件同时接受单字母（`Credit_in_N++`）和全称（`Credit_in_North++`）。
    pub fn from_name(name: &str, time: SimTime, flit: Option<Flit>) -> Option<NodeEvent> {
        match name {
            "SimTimeChanged" => Some(NodeEvent::SimTimeChanged(time)),
            "End" => Some(NodeEvent::End),
            _ => {
                if let Some(dir) = name
                    .strip_prefix("Credit_in_")
                    .and_then(|rest| rest.strip_suffix("++"))
                {
                    return from_short(dir).map(NodeEvent::CreditIn);
                }
                let port = Direction::from_name(name)?;
                flit.map(|flit| NodeEvent::Flit { port, flit })
            }
        }
    }
}

impl fmt::Display for NodeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeEvent::Flit { flit, .. } => write!(f, "{}({flit})", self.name()),
            NodeEvent::SimTimeChanged(t) => write!(f, "SimTimeChanged({})", t.0),
            _ => f.write_str(&self.name()),
        }
    }
}

impl Emit {
    pub fn name(&self) -> String {
        match self {
            Emit::Flit { port, .. } => port.name().to_string(),
            Emit::Credit { port } => credit_event_name(*port),
        }
    }
}
