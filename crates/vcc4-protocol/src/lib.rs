//! # VC-C4 Protocol
//!
//! VC-C4 云台相机串口协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `constants`: 帧头/帧尾、操作码、长度限制等协议常量
//! - `units`: 角度/变焦与设备单位之间的换算（含范围钳制）
//! - `frame`: 原始帧缓冲区与帧类别
//! - `command`: 下行指令帧构建
//! - `answer`: 上行应答帧解析与错误码
//!
//! ## 编码
//!
//! 数据字段使用 ASCII 十六进制编码，每个 16 位数值固定占 4 个字符（高位在前，补零）。

pub mod answer;
pub mod command;
pub mod constants;
pub mod frame;
pub mod units;

// 重新导出常用类型
pub use answer::*;
pub use command::*;
pub use constants::*;
pub use frame::*;
pub use units::*;

use thiserror::Error;

/// 协议解析错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Malformed frame: {reason}")]
    MalformedFrame { reason: &'static str },

    #[error("Invalid frame length: expected one of {expected:?}, got {actual}")]
    InvalidLength {
        expected: &'static [usize],
        actual: usize,
    },

    #[error("Invalid hex digit: 0x{0:02X}")]
    InvalidHexDigit(u8),
}

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// 16 位数值编码为 4 个 ASCII 十六进制字符（大写，补零）
pub fn encode_hex4(value: u16) -> [u8; 4] {
    [
        HEX_DIGITS[(value >> 12) as usize & 0xF],
        HEX_DIGITS[(value >> 8) as usize & 0xF],
        HEX_DIGITS[(value >> 4) as usize & 0xF],
        HEX_DIGITS[value as usize & 0xF],
    ]
}

/// 解码单个 ASCII 十六进制字符
///
/// 与设备固件一致：小于 0x40 的字节减去 `'0'`，其余减去 `'A' - 10`。
/// 结果不在 0..=15 范围内时返回 `InvalidHexDigit`。
pub fn decode_hex_digit(byte: u8) -> Result<u8, ProtocolError> {
    let value = if byte < 0x40 {
        byte.wrapping_sub(b'0')
    } else {
        byte.wrapping_sub(b'A' - 10)
    };
    if value > 0xF {
        return Err(ProtocolError::InvalidHexDigit(byte));
    }
    Ok(value)
}

/// 解码 ASCII 十六进制字段（高位在前，最多 4 位）
pub fn decode_hex_field(digits: &[u8]) -> Result<u16, ProtocolError> {
    if digits.is_empty() || digits.len() > 4 {
        return Err(ProtocolError::MalformedFrame {
            reason: "hex field must hold 1 to 4 digits",
        });
    }
    digits
        .iter()
        .try_fold(0u16, |acc, &b| Ok((acc << 4) | decode_hex_digit(b)? as u16))
}
