//! 上行应答帧解析
//!
//! 指令应答：`FE 30 30 <err> 00 EF`（固定 6 字节）
//!
//! 请求应答：6 / 8 / 14 字节，`FE ... <err@3> ... EF`，
//! 数据字段为 ASCII 十六进制：
//! - 水平/俯仰应答（14 字节）：水平角位于 5..9，俯仰角位于 9..13
//! - 变焦应答：字段从偏移 5 开始，到帧尾之前结束（最多 4 位）
//! - 6 字节应答不携带数据（通常为错误应答）

use crate::constants::*;
use crate::frame::{FrameKind, RawFrame};
use crate::units::DevicePanTilt;
use crate::{ProtocolError, decode_hex_field};
use num_enum::{FromPrimitive, IntoPrimitive};

/// 设备错误码（应答帧偏移 3）
///
/// 每次交互的结果都显式携带错误码，不存在全局“最近错误”。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum DeviceErrorCode {
    /// 无错误
    None = 0x30,
    /// 设备忙（可重试）
    Busy = 0x31,
    /// 参数错误
    ParamError = 0x35,
    /// 模式错误
    ModeError = 0x39,
    /// 未知错误码
    #[num_enum(catch_all)]
    Unknown(u8),
}

impl DeviceErrorCode {
    /// 是否成功
    pub fn is_ok(self) -> bool {
        self == DeviceErrorCode::None
    }

    /// 是否为可重试的忙状态
    pub fn is_busy(self) -> bool {
        self == DeviceErrorCode::Busy
    }

    /// 原始字节
    pub fn as_byte(self) -> u8 {
        self.into()
    }
}

/// 已校验的应答帧
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    code: DeviceErrorCode,
    frame: RawFrame,
}

impl Answer {
    /// 校验帧结构并提取错误码
    pub fn parse(kind: FrameKind, frame: RawFrame) -> Result<Self, ProtocolError> {
        frame.validate(kind)?;
        let code = DeviceErrorCode::from(frame.as_slice()[ERROR_CODE_OFFSET]);
        Ok(Self { code, frame })
    }

    pub fn code(&self) -> DeviceErrorCode {
        self.code
    }

    /// 数据区（偏移 5 到帧尾之前）
    fn payload(&self) -> &[u8] {
        let bytes = self.frame.as_slice();
        if bytes.len() <= PAYLOAD_OFFSET + 1 {
            return &[];
        }
        &bytes[PAYLOAD_OFFSET..bytes.len() - 1]
    }

    /// 解析水平/俯仰应答（需 14 字节）
    pub fn pan_tilt(&self) -> Result<DevicePanTilt, ProtocolError> {
        let payload = self.payload();
        if payload.len() != 2 * HEX_FIELD_WIDTH {
            return Err(ProtocolError::MalformedFrame {
                reason: "pan/tilt answer must carry two 4-digit fields",
            });
        }
        Ok(DevicePanTilt {
            pan: decode_hex_field(&payload[..HEX_FIELD_WIDTH])?,
            tilt: decode_hex_field(&payload[HEX_FIELD_WIDTH..])?,
        })
    }

    /// 解析变焦应答
    pub fn zoom(&self) -> Result<u16, ProtocolError> {
        let payload = self.payload();
        if payload.is_empty() {
            return Err(ProtocolError::MalformedFrame {
                reason: "zoom answer carries no data field",
            });
        }
        let width = payload.len().min(HEX_FIELD_WIDTH);
        decode_hex_field(&payload[..width])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command_answer(code: u8) -> RawFrame {
        RawFrame::from_slice(&[0xFE, 0x30, 0x30, code, 0x00, 0xEF])
    }

    #[test]
    fn test_error_code_mapping() {
        assert_eq!(DeviceErrorCode::from(0x30), DeviceErrorCode::None);
        assert_eq!(DeviceErrorCode::from(0x31), DeviceErrorCode::Busy);
        assert_eq!(DeviceErrorCode::from(0x35), DeviceErrorCode::ParamError);
        assert_eq!(DeviceErrorCode::from(0x39), DeviceErrorCode::ModeError);
        assert_eq!(DeviceErrorCode::from(0x33), DeviceErrorCode::Unknown(0x33));
        assert_eq!(DeviceErrorCode::from(0x00), DeviceErrorCode::Unknown(0x00));
        assert_eq!(DeviceErrorCode::Unknown(0x42).as_byte(), 0x42);
        assert_eq!(DeviceErrorCode::Busy.as_byte(), 0x31);
    }

    #[test]
    fn test_command_answer_codes() {
        let cases = [
            (0x30, DeviceErrorCode::None),
            (0x31, DeviceErrorCode::Busy),
            (0x35, DeviceErrorCode::ParamError),
            (0x39, DeviceErrorCode::ModeError),
            (0x3A, DeviceErrorCode::Unknown(0x3A)),
        ];
        for (byte, expected) in cases {
            let answer = Answer::parse(FrameKind::Command, command_answer(byte)).unwrap();
            assert_eq!(answer.code(), expected);
        }
    }

    #[test]
    fn test_pan_tilt_answer() {
        let mut bytes = vec![0xFE, 0x30, 0x30, 0x30, 0x00];
        bytes.extend_from_slice(b"7FA8");
        bytes.extend_from_slice(b"8000");
        bytes.push(0xEF);
        let answer = Answer::parse(FrameKind::Request, RawFrame::from_slice(&bytes)).unwrap();
        assert!(answer.code().is_ok());
        assert_eq!(
            answer.pan_tilt().unwrap(),
            DevicePanTilt {
                pan: 0x7FA8,
                tilt: 0x8000
            }
        );
    }

    #[test]
    fn test_pan_tilt_requires_fourteen_bytes() {
        let answer = Answer::parse(FrameKind::Request, command_answer(0x30)).unwrap();
        assert!(answer.pan_tilt().is_err());
    }

    #[test]
    fn test_zoom_answer_eight_bytes() {
        let bytes = [0xFE, 0x30, 0x30, 0x30, 0x00, b'4', b'0', 0xEF];
        let answer = Answer::parse(FrameKind::Request, RawFrame::from_slice(&bytes)).unwrap();
        assert_eq!(answer.zoom().unwrap(), 0x40);
    }

    #[test]
    fn test_zoom_answer_without_payload() {
        let answer = Answer::parse(FrameKind::Request, command_answer(0x31)).unwrap();
        assert!(answer.code().is_busy());
        assert!(answer.zoom().is_err());
    }

    #[test]
    fn test_invalid_hex_in_payload() {
        let mut bytes = vec![0xFE, 0x30, 0x30, 0x30, 0x00];
        bytes.extend_from_slice(b"7FZ8");
        bytes.extend_from_slice(b"8000");
        bytes.push(0xEF);
        let answer = Answer::parse(FrameKind::Request, RawFrame::from_slice(&bytes)).unwrap();
        assert_eq!(
            answer.pan_tilt(),
            Err(ProtocolError::InvalidHexDigit(b'Z'))
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let bad_header = RawFrame::from_slice(&[0x00, 0x30, 0x30, 0x30, 0x00, 0xEF]);
        assert!(Answer::parse(FrameKind::Command, bad_header).is_err());

        let bad_len =
            RawFrame::from_slice(&[0xFE, 0x30, 0x30, 0x30, 0x00, 0x00, 0x00, 0x00, 0x00, 0xEF]);
        assert!(Answer::parse(FrameKind::Request, bad_len).is_err());
    }
}
