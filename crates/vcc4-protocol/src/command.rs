//! 下行帧构建
//!
//! 所有下行帧格式：`FF 30 30 00 <opcode> <payload...> EF`，
//! 其中 16 位数值字段固定编码为 4 个 ASCII 十六进制字符。

use crate::constants::*;
use crate::encode_hex4;
use crate::frame::{FrameBuffer, FrameKind};
use crate::units::DevicePanTilt;

/// 下行指令
///
/// 每个变体对应一个设备操作；位置/变焦参数已是设备单位（已钳制、已取反）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// 电源开关 (0xA0)
    Power(bool),
    /// 切换到主机控制模式 (0x90)
    ControlMode,
    /// 设置俯仰范围 (0x64)
    TiltRange { min: u16, max: u16 },
    /// 绝对水平/俯仰位置 (0x62)
    SetPanTilt(DevicePanTilt),
    /// 绝对变焦位置 (0xB3)
    SetZoom(u16),
    /// 查询水平/俯仰位置 (0x63)
    GetPanTilt,
    /// 查询变焦位置 (0xA4)
    GetZoom,
}

impl Command {
    /// 操作码
    pub const fn opcode(&self) -> u8 {
        match self {
            Command::Power(_) => OP_POWER,
            Command::ControlMode => OP_CONTROL_MODE,
            Command::TiltRange { .. } => OP_TILT_RANGE,
            Command::SetPanTilt(_) => OP_SET_PAN_TILT,
            Command::SetZoom(_) => OP_SET_ZOOM,
            Command::GetPanTilt => OP_GET_PAN_TILT,
            Command::GetZoom => OP_GET_ZOOM,
        }
    }

    /// 帧类别（决定长度上限与应答形状）
    pub const fn kind(&self) -> FrameKind {
        match self {
            Command::GetPanTilt | Command::GetZoom => FrameKind::Request,
            _ => FrameKind::Command,
        }
    }

    /// 操作名称（用于日志与错误信息）
    pub const fn name(&self) -> &'static str {
        match self {
            Command::Power(true) => "power_on",
            Command::Power(false) => "power_off",
            Command::ControlMode => "set_control_mode",
            Command::TiltRange { .. } => "set_default_tilt_range",
            Command::SetPanTilt(_) => "set_abs_pan_tilt",
            Command::SetZoom(_) => "set_abs_zoom",
            Command::GetPanTilt => "get_abs_pan_tilt",
            Command::GetZoom => "get_abs_zoom",
        }
    }

    /// 编码为下行字节序列
    pub fn encode(&self) -> FrameBuffer {
        let mut buf = FrameBuffer::new();
        buf.extend_from_slice(&TX_PREAMBLE);
        buf.push(self.opcode());

        match *self {
            Command::Power(on) => buf.push(if on { ARG_ON } else { ARG_OFF }),
            Command::ControlMode => buf.push(ARG_OFF),
            Command::TiltRange { min, max } => {
                buf.push(ARG_ON);
                buf.extend_from_slice(&encode_hex4(min));
                buf.extend_from_slice(&encode_hex4(max));
            },
            Command::SetPanTilt(pos) => {
                buf.extend_from_slice(&encode_hex4(pos.pan));
                buf.extend_from_slice(&encode_hex4(pos.tilt));
            },
            Command::SetZoom(zoom) => buf.extend_from_slice(&encode_hex4(zoom)),
            Command::GetPanTilt | Command::GetZoom => {},
        }

        buf.push(FOOTER);
        buf
    }
}
