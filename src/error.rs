//! 错误类型
//!
//! 编解码契约错误、缓冲区溢出、配置与检查点错误。
//! 仿真过程中的故障（乱序、校验失败）只计数和记录日志，不以错误形式上抛。

use std::path::PathBuf;

use thiserror::Error;

use crate::flit::{Flit, FlitType};
use crate::router::Direction;

/// flit 解析错误：调用方拿错了解析函数，属于编程契约违例。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FlitError {
    #[error("unexpected flit type: expected {expected:?}, found tag {found:#05b}")]
    UnexpectedFlitType { expected: FlitType, found: u8 },
}

/// 路由器输入 FIFO 已满，flit 被丢弃。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{port} input FIFO is full, dropped flit {flit}")]
pub struct BufferOverflow {
    pub port: Direction,
    pub flit: Flit,
}

/// 配置加载 / 校验错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse mesh spec: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid bit string {value:?} for {field}")]
    InvalidBits { field: &'static str, value: String },
    #[error("mesh size must be in 1..={max}, got {got}")]
    InvalidMeshSize { got: u16, max: u16 },
    #[error("address {address} is outside the {size}x{size} mesh")]
    AddressOutOfRange { address: u16, size: u16 },
    #[error("unsupported schema_version {0}")]
    UnsupportedSchema(u32),
    #[error("generator {address} sends to {destination}, which is not another node of the {nodes}-node mesh")]
    UnreachableDestination {
        address: u16,
        destination: u16,
        nodes: usize,
    },
    #[error("generator {address} picks uniformly over {got} nodes, mesh has {expected}")]
    UniformNodesMismatch {
        address: u16,
        got: u16,
        expected: usize,
    },
}

/// 检查点恢复错误
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("snapshot holds {snapshot} {kind}, mesh has {mesh}")]
    ShapeMismatch {
        kind: &'static str,
        snapshot: usize,
        mesh: usize,
    },
    #[error("snapshot entry {index} has address {found}, expected {expected}")]
    AddressMismatch {
        index: usize,
        expected: u16,
        found: u16,
    },
}
