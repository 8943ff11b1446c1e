//! 网格配置（JSON）
//!
//! ```json
//! {
//!     "schema_version": 1,
//!     "mesh_size": 4,
//!     "defaults": { "pir": 0.05, "min_packet_length": 4, "max_packet_length": 10 },
//!     "routers": [ { "address": 5, "routing_bits": "00111100" } ],
//!     "generators": [ { "address": 0, "pir": 0, "destination": { "kind": "uniform", "nodes": 16 } } ]
//! }
//! ```
//!
//! 没有列出的路由器按网格位置推出连通位并使用 XY 路由位；位串 MSB 在前。

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::time::SimTime;
use crate::error::ConfigError;
use crate::pe::{DestinationPolicy, GeneratorConfig};
use crate::router::{ConnectivityBits, RouterConfig, RoutingBits};

pub const SCHEMA_VERSION: u32 = 1;
pub const MAX_MESH_SIZE: u16 = 128;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshSpec {
    pub schema_version: u32,
    pub mesh_size: u16,
    #[serde(default)]
    pub defaults: Option<TrafficSpec>,
    #[serde(default)]
    pub routers: Vec<RouterSpec>,
    #[serde(default)]
    pub generators: Vec<GeneratorSpec>,
}

/// 流量参数；未给出的字段沿用上一层（全局默认 → 生成器默认值）。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrafficSpec {
    #[serde(default)]
    pub pir: Option<f64>,
    #[serde(default)]
    pub min_packet_length: Option<u16>,
    #[serde(default)]
    pub max_packet_length: Option<u16>,
    /// 周期数；之后不再开始新的帧
    #[serde(default)]
    pub end_time: Option<u64>,
    #[serde(default)]
    pub destination: Option<DestinationPolicy>,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl TrafficSpec {
    fn apply(&self, cfg: &mut GeneratorConfig) {
        if let Some(pir) = self.pir {
            cfg.pir = pir;
        }
        if let Some(v) = self.min_packet_length {
            cfg.min_packet_length = v;
        }
        if let Some(v) = self.max_packet_length {
            cfg.max_packet_length = v;
        }
        if let Some(t) = self.end_time {
            cfg.end_time = SimTime(t);
        }
        if let Some(d) = self.destination {
            cfg.destination = d;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterSpec {
    pub address: u16,
    #[serde(default)]
    pub connectivity_bits: Option<String>,
    #[serde(default)]
    pub routing_bits: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorSpec {
    pub address: u16,
    #[serde(flatten)]
    pub traffic: TrafficSpec,
}

impl MeshSpec {
    /// 所有节点使用同一组流量参数的网格
    pub fn uniform(mesh_size: u16, traffic: TrafficSpec) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            mesh_size,
            defaults: Some(traffic),
            routers: Vec::new(),
            generators: Vec::new(),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let spec: MeshSpec = serde_json::from_str(raw)?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), bytes = raw.len(), "读取网格配置");
        Self::from_json_str(&raw)
    }

    pub fn node_count(&self) -> usize {
        usize::from(self.mesh_size) * usize::from(self.mesh_size)
    }

    fn check_address(&self, address: u16) -> Result<(), ConfigError> {
        if usize::from(address) >= self.node_count() {
            return Err(ConfigError::AddressOutOfRange {
                address,
                size: self.mesh_size,
            });
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(ConfigError::UnsupportedSchema(self.schema_version));
        }
        if self.mesh_size == 0 || self.mesh_size > MAX_MESH_SIZE {
            return Err(ConfigError::InvalidMeshSize {
                got: self.mesh_size,
                max: MAX_MESH_SIZE,
            });
        }
        for r in &self.routers {
            self.check_address(r.address)?;
            self.router_config(r.address)?;
        }
        for g in &self.generators {
            self.check_address(g.address)?;
        }
        for address in 0..self.mesh_size * self.mesh_size {
            self.check_destination(&self.generator_config(address))?;
        }
        Ok(())
    }

    /// 有流量的生成器必须发往网格内的另一个节点，否则包头会永远卡在路由器输入端。
    fn check_destination(&self, cfg: &GeneratorConfig) -> Result<(), ConfigError> {
        if cfg.pir == 0.0 {
            return Ok(());
        }
        let nodes = self.node_count();
        let destination = match cfg.destination {
            DestinationPolicy::Uniform { nodes: got } if usize::from(got) != nodes => {
                return Err(ConfigError::UniformNodesMismatch {
                    address: cfg.address,
                    got,
                    expected: nodes,
                });
            }
            DestinationPolicy::Uniform { .. } if nodes > 1 => return Ok(()),
            DestinationPolicy::Uniform { .. } => cfg.address.wrapping_add(1),
            fixed => fixed.fixed_target(cfg.address).unwrap_or(cfg.address),
        };
        if usize::from(destination) >= nodes || destination == cfg.address {
            return Err(ConfigError::UnreachableDestination {
                address: cfg.address,
                destination,
                nodes,
            });
        }
        Ok(())
    }

    /// 地址 `address` 的路由器配置：位置推导的默认值，再叠加显式覆盖。
    pub fn router_config(&self, address: u16) -> Result<RouterConfig, ConfigError> {
        let mut cfg = RouterConfig::for_mesh(address, self.mesh_size);
        if let Some(r) = self.routers.iter().find(|r| r.address == address) {
            if let Some(bits) = &r.connectivity_bits {
                cfg.connectivity = ConnectivityBits::from_bit_str(bits)?;
            }
            if let Some(bits) = &r.routing_bits {
                cfg.routing = RoutingBits::from_bit_str(bits)?;
            }
        }
        Ok(cfg)
    }

    /// 地址 `address` 的生成器配置。
    ///
    /// 没有显式种子时用全局种子加地址，使各节点的随机序列不同但可复现。
    pub fn generator_config(&self, address: u16) -> GeneratorConfig {
        let mut cfg = GeneratorConfig {
            address,
            ..GeneratorConfig::default()
        };
        let mut seed = None;
        if let Some(d) = &self.defaults {
            d.apply(&mut cfg);
            seed = d.seed.map(|s| s.wrapping_add(u64::from(address)));
        }
        if let Some(g) = self.generators.iter().find(|g| g.address == address) {
            g.traffic.apply(&mut cfg);
            seed = g.traffic.seed.or(seed);
        }
        cfg.seed = seed.unwrap_or(u64::from(address));
        cfg
    }
}
