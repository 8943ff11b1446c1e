//! 网格世界实现
//!
//! 定义网格仿真的世界（World）实现，持有网格。

use super::mesh::Mesh;
use crate::sim::World;
use std::any::Any;

/// 持有 [`Mesh`] 的仿真世界
#[derive(Debug)]
pub struct MeshWorld {
    pub mesh: Mesh,
}

impl MeshWorld {
    pub fn new(mesh: Mesh) -> Self {
        Self { mesh }
    }
}

impl World for MeshWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
