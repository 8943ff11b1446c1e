//! 包生成器
//!
//! 按注入率（PIR，每周期包数）把时间切成长度为 `1/pir` 的帧，每帧发送一个包：
//!
//! ```text
//! StartupDelay --(延迟到期且未过结束时间)--> SendFlit --(发完 L 个 flit)--> WaitFrameEnd
//!      ^                                                                      |
//!      +-------------------------(帧结束，包 ID 已递增)-----------------------+
//! ```
//!
//! 每次调用 [`PacketGenerator::get_flit`] 代表一个周期，最多产出一个 flit。

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::flit::{
    ADDRESS_MASK, Flit, FlitCrc, PAYLOAD_MASK, make_body, make_first_body, make_header, make_tail,
};
use crate::sim::SimTime;

/// 首帧的启动延迟（周期）
pub const FIRST_STARTUP_DELAY: u64 = 3;
/// 后续帧的启动延迟（周期）
pub const STARTUP_DELAY: u64 = 2;
/// 最短包长：header + 首个 body + tail
pub const MIN_PACKET_LENGTH: u16 = 3;
/// PIR 不在 [0, 1] 内时使用的注入率
pub const FALLBACK_PIR: f64 = 0.01;

/// 目的地址选择策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DestinationPolicy {
    /// 固定目的地址；与自身地址相同时改用 `address + 1`
    Fixed { address: u16 },
    /// 在 `0..nodes` 中均匀选择一个非自身的地址
    Uniform { nodes: u16 },
}

impl DestinationPolicy {
    /// 固定策略下实际使用的目的地址（已处理与自身地址冲突的情况）；均匀策略返回 None
    pub fn fixed_target(self, own: u16) -> Option<u16> {
        match self {
            DestinationPolicy::Fixed { address } if address == own => {
                Some(address.wrapping_add(1) & ADDRESS_MASK)
            }
            DestinationPolicy::Fixed { address } => Some(address),
            DestinationPolicy::Uniform { .. } => None,
        }
    }
}

impl Default for DestinationPolicy {
    fn default() -> Self {
        DestinationPolicy::Fixed { address: 1 }
    }
}

/// 生成器配置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub address: u16,
    /// 每周期注入的包数，0 表示不产生流量
    pub pir: f64,
    pub min_packet_length: u16,
    pub max_packet_length: u16,
    /// 该时间之后不再开始新的帧
    pub end_time: SimTime,
    pub destination: DestinationPolicy,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            address: 0,
            pir: 0.05,
            min_packet_length: 10,
            max_packet_length: 10,
            end_time: SimTime(u64::MAX),
            destination: DestinationPolicy::default(),
            seed: 0,
        }
    }
}

/// 帧内状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationState {
    StartupDelay,
    SendFlit,
    WaitFrameEnd,
}

/// 下一个要发送的 flit 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextFlit {
    Header,
    FirstBody,
    Body,
    Tail,
}

/// 生成器可持久化的运行时状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorState {
    pub state: GenerationState,
    pub next: NextFlit,
    /// 帧内周期计数
    pub counter: u64,
    pub startup_delay: u64,
    /// 已开始的帧数（也是本帧随机数的种子序号）
    pub frames: u64,
    pub packet_id: u16,
    pub packet_length: u16,
    pub destination: u16,
    /// 当前包已发出的 flit 数
    pub sent: u16,
    pub crc: FlitCrc,
    pub sent_packets: u64,
    pub sent_flits: u64,
}

#[derive(Debug)]
pub struct PacketGenerator {
    address: u16,
    /// 0 表示停用
    frame_length: u64,
    min_len: u16,
    max_len: u16,
    end_time: SimTime,
    policy: DestinationPolicy,
    seed: u64,
    rt: GeneratorState,
}

/// splitmix64：把 (seed, 帧序号) 混成每帧独立的随机种子
fn mix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

impl PacketGenerator {
    /// 创建生成器，并对非法参数做钳位（带告警）。
    pub fn new(cfg: GeneratorConfig) -> Self {
        let address = cfg.address;

        let frame_length = if !(0.0..=1.0).contains(&cfg.pir) {
            warn!(node = address, pir = cfg.pir, fallback = FALLBACK_PIR, "⚠️  PIR 不在 0..=1 之间，改用默认值");
            (1.0 / FALLBACK_PIR) as u64
        } else if cfg.pir == 0.0 {
            warn!(node = address, "⚠️  PIR = 0，不会产生流量");
            0
        } else {
            (1.0 / cfg.pir) as u64
        };

        let (mut min_len, mut max_len) = (cfg.min_packet_length, cfg.max_packet_length);
        if min_len > max_len {
            warn!(node = address, min_len, max_len, "⚠️  最小包长大于最大包长，交换两者");
            std::mem::swap(&mut min_len, &mut max_len);
        }
        if min_len < MIN_PACKET_LENGTH {
            warn!(node = address, min_len, "⚠️  最小包长过小，改为 3");
            min_len = MIN_PACKET_LENGTH;
        }
        if frame_length > 0 && u64::from(max_len) > frame_length {
            warn!(node = address, max_len, frame_length, "⚠️  最大包长超过帧长，改为帧长");
            max_len = frame_length.min(u64::from(ADDRESS_MASK)) as u16;
        }
        if max_len < min_len {
            warn!(node = address, min_len, max_len, "⚠️  帧长小于最短包长，包会跨越帧边界");
            max_len = min_len;
        }
        max_len = max_len.min(ADDRESS_MASK);
        min_len = min_len.min(max_len);

        info!(
            node = address,
            pir = cfg.pir,
            frame_length,
            min_len,
            max_len,
            "包生成器初始化"
        );

        let mut g = Self {
            address,
            frame_length,
            min_len,
            max_len,
            end_time: cfg.end_time,
            policy: cfg.destination,
            seed: cfg.seed,
            rt: GeneratorState {
                state: GenerationState::StartupDelay,
                next: NextFlit::Header,
                counter: 0,
                startup_delay: FIRST_STARTUP_DELAY,
                frames: 0,
                packet_id: 0,
                packet_length: min_len,
                destination: 0,
                sent: 0,
                crc: FlitCrc::new(),
                sent_packets: 0,
                sent_flits: 0,
            },
        };
        g.begin_frame();
        g
    }

    pub fn address(&self) -> u16 {
        self.address
    }

    pub fn frame_length(&self) -> u64 {
        self.frame_length
    }

    pub fn packet_length_range(&self) -> (u16, u16) {
        (self.min_len, self.max_len)
    }

    pub fn state(&self) -> GenerationState {
        self.rt.state
    }

    pub fn packet_id(&self) -> u16 {
        self.rt.packet_id
    }

    pub fn sent_packets(&self) -> u64 {
        self.rt.sent_packets
    }

    pub fn sent_flits(&self) -> u64 {
        self.rt.sent_flits
    }

    fn frame_rng(&self) -> StdRng {
        StdRng::seed_from_u64(mix64(self.seed ^ mix64(self.rt.frames)))
    }

    fn pick_destination(&self, rng: &mut StdRng) -> u16 {
        match self.policy {
            DestinationPolicy::Uniform { nodes } if nodes > 1 => {
                let d = rng.random_range(0..nodes - 1);
                if d >= self.address { d + 1 } else { d }
            }
            DestinationPolicy::Uniform { .. } => self.address.wrapping_add(1) & ADDRESS_MASK,
            fixed => fixed.fixed_target(self.address).unwrap_or_default(),
        }
    }

    /// 为新帧确定包长与目的地址
    fn begin_frame(&mut self) {
        let mut rng = self.frame_rng();
        self.rt.packet_length = if self.min_len == self.max_len {
            self.min_len
        } else {
            rng.random_range(self.min_len..=self.max_len)
        };
        self.rt.destination = self.pick_destination(&mut rng);
        self.rt.next = NextFlit::Header;
        self.rt.sent = 0;
        self.rt.crc.reset();
    }

    /// 推进一个周期；返回本周期产出的 flit（等待中或已过结束时间时为 None）。
    pub fn get_flit(&mut self, time: SimTime) -> Option<Flit> {
        if self.frame_length == 0 {
            return None;
        }

        self.rt.counter += 1;

        match self.rt.state {
            GenerationState::StartupDelay => {
                if self.rt.counter >= self.rt.startup_delay && time < self.end_time {
                    self.rt.state = GenerationState::SendFlit;
                }
                None
            }
            GenerationState::SendFlit => Some(self.emit(time)),
            GenerationState::WaitFrameEnd => {
                if self.rt.counter >= self.frame_length {
                    self.rt.counter = 0;
                    self.rt.startup_delay = STARTUP_DELAY;
                    self.rt.frames += 1;
                    self.rt.state = GenerationState::StartupDelay;
                    self.begin_frame();
                }
                None
            }
        }
    }

    fn emit(&mut self, time: SimTime) -> Flit {
        let len = self.rt.packet_length;
        let flit = match self.rt.next {
            NextFlit::Header => make_header(self.rt.destination, self.address),
            NextFlit::FirstBody => make_first_body(len, self.rt.packet_id),
            NextFlit::Body => make_body(self.rt.counter as u32 & PAYLOAD_MASK),
            NextFlit::Tail => make_tail(u32::from(self.rt.crc.checksum())),
        };
        self.rt.sent += 1;
        self.rt.sent_flits += 1;

        if self.rt.next == NextFlit::Tail {
            info!(
                node = self.address,
                dst = self.rt.destination,
                id = self.rt.packet_id,
                length = len,
                counted = self.rt.sent,
                crc = format_args!("{:#06x}", self.rt.crc.checksum()),
                time = time.0,
                "📤 [S][PACKET] 发送数据包"
            );
            self.rt.packet_id = self.rt.packet_id.wrapping_add(1) & ADDRESS_MASK;
            self.rt.sent_packets += 1;
            self.rt.next = NextFlit::Header;
        } else {
            self.rt.crc.update(flit);
            self.rt.next = match self.rt.next {
                NextFlit::Header => NextFlit::FirstBody,
                _ if self.rt.sent + 1 >= len => NextFlit::Tail,
                _ => NextFlit::Body,
            };
        }

        debug!(node = self.address, %flit, sent = self.rt.sent, time = time.0, "[S] 发出 flit");

        if self.rt.sent >= len {
            self.rt.state = GenerationState::WaitFrameEnd;
        }
        flit
    }

    /// 一次性生成完整的包（计数器模式 payload），包 ID 随之递增。
    ///
    /// `length` 小于 3 时按 3 处理。
    pub fn generate_packet(&mut self, length: u16, dest: u16) -> Vec<Flit> {
        let length = length.clamp(MIN_PACKET_LENGTH, ADDRESS_MASK);
        let mut crc = FlitCrc::new();
        let mut packet = Vec::with_capacity(usize::from(length));

        packet.push(make_header(dest, self.address));
        packet.push(make_first_body(length, self.rt.packet_id));
        for i in 0..length - MIN_PACKET_LENGTH {
            packet.push(make_body(u32::from(i) + 1));
        }
        for &f in &packet {
            crc.update(f);
        }
        packet.push(make_tail(u32::from(crc.checksum())));

        debug!(node = self.address, dest, id = self.rt.packet_id, length, "生成完整数据包");
        self.rt.packet_id = self.rt.packet_id.wrapping_add(1) & ADDRESS_MASK;
        packet
    }

    pub fn save(&self) -> GeneratorState {
        self.rt.clone()
    }

    pub fn load(&mut self, state: &GeneratorState) {
        self.rt = state.clone();
    }
}
