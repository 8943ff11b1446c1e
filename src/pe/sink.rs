//! 包接收端
//!
//! 逐个接收 flit，用状态机恢复包边界，并在 TAIL 处检查长度、CRC 与奇偶校验。
//! 所有故障只计数和记录日志，不会向调用方返回错误。
//!
//! 遇到类型不符的 flit 时强制回到 `WaitHeader`，丢弃后续 flit 直到下一个 HEADER；
//! 同一段连续的乱序只记一次故障。

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::flit::{Flit, FlitCrc, FlitType, parse_first_body, parse_header, parse_tail};
use crate::sim::SimTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacketState {
    WaitHeader,
    WaitFirstBody,
    WaitTail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacketStatus {
    Ok,
    Faulty,
}

/// 一个已接收完毕的包
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedPacket {
    pub src: u16,
    pub dst: u16,
    pub id: u16,
    pub declared_length: u16,
    pub counted_length: u16,
    pub encoded_crc: u16,
    pub calculated_crc: u16,
    /// 本包内奇偶校验失败的 flit 数
    pub parity_errors: u16,
    pub time: SimTime,
    pub status: PacketStatus,
}

impl ReceivedPacket {
    pub fn crc_ok(&self) -> bool {
        self.encoded_crc == self.calculated_crc
    }

    pub fn length_ok(&self) -> bool {
        self.declared_length == self.counted_length
    }

    pub fn is_ok(&self) -> bool {
        self.status == PacketStatus::Ok
    }
}

/// 接收端计数器
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkCounters {
    pub received_flits: u64,
    pub ok_packets: u64,
    pub faulty_packets: u64,
    pub flit_order_faults: u64,
    pub parity_errors: u64,
}

/// 接收端可持久化状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkState {
    pub state: PacketState,
    pub recv_error: bool,
    pub src: u16,
    pub dst: u16,
    pub packet_id: u16,
    pub declared_length: u16,
    pub counted_length: u16,
    pub parity_errors: u16,
    pub crc: FlitCrc,
    pub counters: SinkCounters,
}

impl Default for SinkState {
    fn default() -> Self {
        Self {
            state: PacketState::WaitHeader,
            recv_error: false,
            src: 0,
            dst: 0,
            packet_id: 0,
            declared_length: 0,
            counted_length: 0,
            parity_errors: 0,
            crc: FlitCrc::new(),
            counters: SinkCounters::default(),
        }
    }
}

#[derive(Debug, Default)]
pub struct PacketSink {
    address: u16,
    rt: SinkState,
}

impl PacketSink {
    pub fn new(address: u16) -> Self {
        Self {
            address,
            rt: SinkState::default(),
        }
    }

    pub fn address(&self) -> u16 {
        self.address
    }

    pub fn state(&self) -> PacketState {
        self.rt.state
    }

    pub fn counters(&self) -> SinkCounters {
        self.rt.counters
    }

    /// 接收一个 flit；收到包尾时返回该包的检查结果。
    pub fn put_flit(&mut self, flit: Flit, time: SimTime) -> Option<ReceivedPacket> {
        let ty = flit.flit_type();
        let parity_bad = !flit.parity_ok();

        self.rt.counters.received_flits += 1;
        if parity_bad {
            self.rt.counters.parity_errors += 1;
            warn!(node = self.address, %flit, time = time.0, "[R] flit 奇偶校验错误");
        }
        self.rt.counted_length = self.rt.counted_length.wrapping_add(1);

        let mut done = None;
        match self.rt.state {
            PacketState::WaitHeader => {
                self.rt.crc.reset();
                self.rt.counted_length = 1;
                self.rt.parity_errors = 0;
                match parse_header(flit) {
                    Ok(h) => {
                        self.rt.recv_error = false;
                        self.rt.dst = h.dest;
                        self.rt.src = h.src;
                        self.rt.state = PacketState::WaitFirstBody;
                    }
                    Err(_) => self.fsm_error(ty, time),
                }
            }
            PacketState::WaitFirstBody => match parse_first_body(flit) {
                Ok(fb) => {
                    self.rt.recv_error = false;
                    self.rt.declared_length = fb.len;
                    self.rt.packet_id = fb.id;
                    self.rt.state = PacketState::WaitTail;
                }
                Err(_) => self.fsm_error(ty, time),
            },
            PacketState::WaitTail => match ty {
                Some(FlitType::Body) => {
                    self.rt.recv_error = false;
                }
                Some(FlitType::Tail) => {
                    self.rt.recv_error = false;
                    self.rt.state = PacketState::WaitHeader;
                    if parity_bad {
                        self.rt.parity_errors += 1;
                    }
                    done = Some(self.finish_packet(flit, time));
                }
                _ => self.fsm_error(ty, time),
            },
        }

        if self.rt.state != PacketState::WaitHeader {
            if parity_bad {
                self.rt.parity_errors += 1;
            }
            self.rt.crc.update(flit);
        }

        debug!(node = self.address, %flit, state = ?self.rt.state, time = time.0, "[R] 收到 flit");
        done
    }

    /// 类型不符：回到 WaitHeader，直到下一个 HEADER 之前的 flit 都被丢弃。
    fn fsm_error(&mut self, ty: Option<FlitType>, time: SimTime) {
        self.rt.state = PacketState::WaitHeader;
        if !self.rt.recv_error {
            self.rt.recv_error = true;
            self.rt.counters.flit_order_faults += 1;
            warn!(
                node = self.address,
                flit_type = ?ty,
                time = time.0,
                "❌ [R][ERROR] 检测到错误的 flit 顺序"
            );
        }
    }

    fn finish_packet(&mut self, tail: Flit, time: SimTime) -> ReceivedPacket {
        let encoded_crc = parse_tail(tail).map(|t| t.payload as u16).unwrap_or_default();
        let calculated_crc = self.rt.crc.checksum();

        let mut pkt = ReceivedPacket {
            src: self.rt.src,
            dst: self.rt.dst,
            id: self.rt.packet_id,
            declared_length: self.rt.declared_length,
            counted_length: self.rt.counted_length,
            encoded_crc,
            calculated_crc,
            parity_errors: self.rt.parity_errors,
            time,
            status: PacketStatus::Ok,
        };

        if pkt.crc_ok() && pkt.length_ok() && pkt.parity_errors == 0 {
            self.rt.counters.ok_packets += 1;
            info!(
                node = self.address,
                src = pkt.src,
                dst = pkt.dst,
                id = pkt.id,
                length = pkt.declared_length,
                counted = pkt.counted_length,
                crc = format_args!("{:#06x}", pkt.calculated_crc),
                time = time.0,
                "📥 [R][PACKET] [OK]"
            );
        } else {
            pkt.status = PacketStatus::Faulty;
            self.rt.counters.faulty_packets += 1;
            warn!(
                node = self.address,
                src = pkt.src,
                dst = pkt.dst,
                id = pkt.id,
                length = pkt.declared_length,
                counted = pkt.counted_length,
                encoded_crc = format_args!("{:#06x}", pkt.encoded_crc),
                calculated_crc = format_args!("{:#06x}", pkt.calculated_crc),
                parity_errors = pkt.parity_errors,
                time = time.0,
                "📥 [R][PACKET] [FAULTY]"
            );
        }
        pkt
    }

    pub fn save(&self) -> SinkState {
        self.rt.clone()
    }

    pub fn load(&mut self, state: &SinkState) {
        self.rt = state.clone();
    }
}
