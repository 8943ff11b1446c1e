//! Flit 位布局
//!
//! ```text
//! bit  31..29  28 ........ 15  14 ......... 1  0
//!      type    dest / length   src / pkt id    parity   (HEADER / 首个 BODY)
//!      type    payload (28 bit)                parity   (BODY / TAIL)
//! ```
//!
//! 所有字段的偏移与宽度都只在本文件定义。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FlitError;

pub const PARITY_OFFSET: u32 = 0;
pub const PAYLOAD_OFFSET: u32 = 1;
pub const PAYLOAD_WIDTH: u32 = 28;
pub const SOURCE_OFFSET: u32 = 1;
pub const PACKET_ID_OFFSET: u32 = 1;
pub const DESTINATION_OFFSET: u32 = 15;
pub const PACKET_LENGTH_OFFSET: u32 = 15;
pub const ADDRESS_WIDTH: u32 = 14;
pub const FLIT_TYPE_OFFSET: u32 = 29;
pub const FLIT_TYPE_WIDTH: u32 = 3;

/// 14-bit 字段（地址、长度、包 ID）的取值掩码
pub const ADDRESS_MASK: u16 = (1 << ADDRESS_WIDTH) - 1;
/// 28-bit payload 的取值掩码
pub const PAYLOAD_MASK: u32 = (1 << PAYLOAD_WIDTH) - 1;

/// flit 类型标签（bits 31..29）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlitType {
    Header,
    /// 首个 body flit 与普通 body flit 共用同一个标签
    Body,
    Tail,
}

impl FlitType {
    pub const fn tag(self) -> u8 {
        match self {
            FlitType::Header => 0b001,
            FlitType::Body => 0b010,
            FlitType::Tail => 0b100,
        }
    }

    pub const fn from_tag(tag: u8) -> Option<FlitType> {
        match tag {
            0b001 => Some(FlitType::Header),
            0b010 => Some(FlitType::Body),
            0b100 => Some(FlitType::Tail),
            _ => None,
        }
    }
}

/// 一个 32-bit flit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Flit(pub u32);

impl Flit {
    pub fn raw(self) -> u32 {
        self.0
    }

    /// 类型标签；未知标签返回 None
    pub fn flit_type(self) -> Option<FlitType> {
        FlitType::from_tag(self.tag())
    }

    pub fn tag(self) -> u8 {
        get_field(self.0, FLIT_TYPE_OFFSET, FLIT_TYPE_WIDTH) as u8
    }

    pub fn is_header(self) -> bool {
        self.flit_type() == Some(FlitType::Header)
    }

    pub fn is_tail(self) -> bool {
        self.flit_type() == Some(FlitType::Tail)
    }

    /// bit 0 上存储的奇偶校验位
    pub fn parity(self) -> u8 {
        get_field(self.0, PARITY_OFFSET, 1) as u8
    }

    /// 存储的校验位是否与 bits 1..31 的偶校验一致
    pub fn parity_ok(self) -> bool {
        u32::from(self.parity()) == parity_of(self.0)
    }
}

impl fmt::Display for Flit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// HEADER flit 字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderFields {
    pub dest: u16,
    pub src: u16,
    pub parity: u8,
}

/// 首个 BODY flit 字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirstBodyFields {
    pub len: u16,
    pub id: u16,
    pub parity: u8,
}

/// BODY / TAIL flit 字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadFields {
    pub payload: u32,
    pub parity: u8,
}

fn field_mask(offset: u32, width: u32) -> u32 {
    (((1u64 << width) - 1) as u32) << offset
}

fn get_field(word: u32, offset: u32, width: u32) -> u32 {
    (word & field_mask(offset, width)) >> offset
}

/// 清空目标位段后写入 value；超出宽度的高位被截掉。
fn set_field(word: u32, offset: u32, width: u32, value: u32) -> u32 {
    let mask = field_mask(offset, width);
    (word & !mask) | ((value << offset) & mask)
}

/// bits 1..31 的偶校验（即写入 bit 0 后整字 1 的个数为偶数）
pub fn parity_of(word: u32) -> u32 {
    (word & !1).count_ones() & 1
}

fn with_parity(word: u32) -> Flit {
    Flit(set_field(word, PARITY_OFFSET, 1, parity_of(word)))
}

fn with_type(word: u32, ty: FlitType) -> u32 {
    set_field(word, FLIT_TYPE_OFFSET, FLIT_TYPE_WIDTH, u32::from(ty.tag()))
}

fn expect_type(flit: Flit, expected: FlitType) -> Result<(), FlitError> {
    if flit.flit_type() == Some(expected) {
        Ok(())
    } else {
        Err(FlitError::UnexpectedFlitType {
            expected,
            found: flit.tag(),
        })
    }
}

/// 构造 HEADER flit。`dest`/`src` 需在 14 bit 以内，超出部分被截断。
pub fn make_header(dest: u16, src: u16) -> Flit {
    let mut w = with_type(0, FlitType::Header);
    w = set_field(w, DESTINATION_OFFSET, ADDRESS_WIDTH, u32::from(dest));
    w = set_field(w, SOURCE_OFFSET, ADDRESS_WIDTH, u32::from(src));
    with_parity(w)
}

/// 构造首个 BODY flit（包长度 + 包 ID），均为 14 bit。
pub fn make_first_body(len: u16, id: u16) -> Flit {
    let mut w = with_type(0, FlitType::Body);
    w = set_field(w, PACKET_LENGTH_OFFSET, ADDRESS_WIDTH, u32::from(len));
    w = set_field(w, PACKET_ID_OFFSET, ADDRESS_WIDTH, u32::from(id));
    with_parity(w)
}

/// 构造普通 BODY flit，payload 为 28 bit。
pub fn make_body(payload: u32) -> Flit {
    let w = with_type(0, FlitType::Body);
    with_parity(set_field(w, PAYLOAD_OFFSET, PAYLOAD_WIDTH, payload))
}

/// 构造 TAIL flit；checksum 零扩展进 28-bit payload。
pub fn make_tail(checksum: u32) -> Flit {
    let w = with_type(0, FlitType::Tail);
    with_parity(set_field(w, PAYLOAD_OFFSET, PAYLOAD_WIDTH, checksum))
}

pub fn parse_header(flit: Flit) -> Result<HeaderFields, FlitError> {
    expect_type(flit, FlitType::Header)?;
    Ok(HeaderFields {
        dest: get_field(flit.0, DESTINATION_OFFSET, ADDRESS_WIDTH) as u16,
        src: get_field(flit.0, SOURCE_OFFSET, ADDRESS_WIDTH) as u16,
        parity: flit.parity(),
    })
}

pub fn parse_first_body(flit: Flit) -> Result<FirstBodyFields, FlitError> {
    expect_type(flit, FlitType::Body)?;
    Ok(FirstBodyFields {
        len: get_field(flit.0, PACKET_LENGTH_OFFSET, ADDRESS_WIDTH) as u16,
        id: get_field(flit.0, PACKET_ID_OFFSET, ADDRESS_WIDTH) as u16,
        parity: flit.parity(),
    })
}

pub fn parse_body(flit: Flit) -> Result<PayloadFields, FlitError> {
    expect_type(flit, FlitType::Body)?;
    Ok(PayloadFields {
        payload: get_field(flit.0, PAYLOAD_OFFSET, PAYLOAD_WIDTH),
        parity: flit.parity(),
    })
}

pub fn parse_tail(flit: Flit) -> Result<PayloadFields, FlitError> {
    expect_type(flit, FlitType::Tail)?;
    Ok(PayloadFields {
        payload: get_field(flit.0, PAYLOAD_OFFSET, PAYLOAD_WIDTH),
        parity: flit.parity(),
    })
}
