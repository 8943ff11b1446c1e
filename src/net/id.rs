//! 标识符类型
//!
//! 网格中的每个地址对应一个路由器和一个挂在其 Local 端口上的处理单元。

use std::fmt;

/// 节点标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
    Router(u16),
    Pe(u16),
}

impl NodeId {
    pub fn address(self) -> u16 {
        match self {
            NodeId::Router(a) | NodeId::Pe(a) => a,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Router(a) => write!(f, "router_{a}"),
            NodeId::Pe(a) => write!(f, "pe_{a}"),
        }
    }
}
