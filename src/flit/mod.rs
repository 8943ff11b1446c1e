//! Flit 编解码模块
//!
//! 32-bit flit 的位布局、奇偶校验以及包级 CRC-16/CCITT 校验和。

// 子模块声明
mod codec;
mod crc;

// 重新导出公共接口
pub use codec::{
    FirstBodyFields, Flit, FlitType, HeaderFields, PayloadFields, make_body, make_first_body,
    make_header, make_tail, parity_of, parse_body, parse_first_body, parse_header, parse_tail,
};
pub use codec::{ADDRESS_MASK, FLIT_TYPE_OFFSET, PAYLOAD_MASK};
pub use crc::FlitCrc;
