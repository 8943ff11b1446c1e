//! 包级校验和：CRC-16/CCITT（poly 0x1021，init 0xFFFF，无反射）
//!
//! 每个 flit 按小端字节序送入 CRC。

use crc::{CRC_16_IBM_3740, Crc};
use serde::{Deserialize, Serialize};

use super::codec::Flit;

const CCITT: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// 可增量累加、可持久化的 CRC 寄存器。
///
/// 该算法无输出反射且 xorout 为 0，因此 `finalize` 的结果就是寄存器本身，
/// 可以直接作为下一轮的初值继续累加。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlitCrc {
    value: u16,
}

impl Default for FlitCrc {
    fn default() -> Self {
        Self::new()
    }
}

impl FlitCrc {
    pub fn new() -> Self {
        Self {
            value: CRC_16_IBM_3740.init,
        }
    }

    pub fn reset(&mut self) {
        self.value = CRC_16_IBM_3740.init;
    }

    pub fn update(&mut self, flit: Flit) {
        let mut digest = CCITT.digest_with_initial(self.value);
        digest.update(&flit.raw().to_le_bytes());
        self.value = digest.finalize();
    }

    pub fn checksum(&self) -> u16 {
        self.value
    }

    /// 对一串 flit 一次性计算校验和
    pub fn over<I: IntoIterator<Item = Flit>>(flits: I) -> u16 {
        let mut crc = FlitCrc::new();
        for f in flits {
            crc.update(f);
        }
        crc.checksum()
    }
}
