//! 2D 网格拓扑构建

use tracing::{debug, info};

use crate::error::ConfigError;
use crate::net::{Mesh, MeshWorld};
use crate::pe::{DestinationPolicy, ProcessingElement};
use crate::router::RouterNode;
use crate::sim::{MeshSpec, SimTime, TrafficSpec};

/// 命令行常用的网格选项
#[derive(Debug, Clone)]
pub struct MeshOpts {
    pub mesh_size: u16,
    pub pir: f64,
    pub min_packet_length: u16,
    pub max_packet_length: u16,
    pub end_time: SimTime,
    /// 为 true 时目的地址在全网均匀选择，否则固定为 1
    pub uniform_destination: bool,
    pub seed: u64,
}

impl Default for MeshOpts {
    fn default() -> Self {
        Self {
            mesh_size: 4,
            pir: 0.05,
            min_packet_length: 10,
            max_packet_length: 10,
            end_time: SimTime::MAX,
            uniform_destination: false,
            seed: 0,
        }
    }
}

impl MeshOpts {
    pub fn to_spec(&self) -> MeshSpec {
        let nodes = self.mesh_size.saturating_mul(self.mesh_size);
        let destination = if self.uniform_destination {
            DestinationPolicy::Uniform { nodes }
        } else {
            DestinationPolicy::default()
        };
        MeshSpec::uniform(
            self.mesh_size,
            TrafficSpec {
                pir: Some(self.pir),
                min_packet_length: Some(self.min_packet_length),
                max_packet_length: Some(self.max_packet_length),
                end_time: Some(self.end_time.0),
                destination: Some(destination),
                seed: Some(self.seed),
            },
        )
    }
}

/// 按配置构建网格：每个地址一个路由器和一个 PE。
pub fn build_mesh(spec: &MeshSpec) -> Result<MeshWorld, ConfigError> {
    spec.validate()?;

    let size = spec.mesh_size;
    let nodes = size * size;
    let mut routers = Vec::with_capacity(usize::from(nodes));
    let mut pes = Vec::with_capacity(usize::from(nodes));

    for addr in 0..nodes {
        let rcfg = spec.router_config(addr)?;
        debug!(
            addr,
            connectivity = format_args!("{:04b}", rcfg.connectivity.0),
            routing = format_args!("{:08b}", rcfg.routing.0),
            "配置路由器"
        );
        routers.push(RouterNode::new(rcfg));
        pes.push(ProcessingElement::new(spec.generator_config(addr)));
    }

    info!(size, nodes, "🧱 网格拓扑构建完成");
    Ok(MeshWorld::new(Mesh::new(size, routers, pes)))
}
