//! 驱动层错误类型定义

use thiserror::Error;
use vcc4_protocol::{DeviceErrorCode, ProtocolError};
use vcc4_serial::LinkError;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 链路错误（超时、IO、未找到帧头、打开失败）
    #[error("Link error: {0}")]
    Link(#[from] LinkError),

    /// 协议解析错误（畸形帧）
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 写入失败（帧超长或链路写入出错）
    #[error("Write failed for {operation}: {source}")]
    Write {
        operation: &'static str,
        #[source]
        source: LinkError,
    },

    /// 设备忙（可重试）
    #[error("Device busy during {operation}")]
    DeviceBusy { operation: &'static str },

    /// 设备报告参数错误
    #[error("Device rejected parameters of {operation}")]
    DeviceParamError { operation: &'static str },

    /// 设备报告模式错误
    #[error("Device mode error during {operation}")]
    DeviceModeError { operation: &'static str },

    /// 设备返回未知错误码
    #[error("Unknown device error 0x{code:02X} during {operation}")]
    DeviceUnknownError { operation: &'static str, code: u8 },

    /// 设备持续忙，重试次数用尽
    #[error("Device still busy after {attempts} attempts of {operation}")]
    DeviceBusyTimeout {
        operation: &'static str,
        attempts: u32,
    },

    /// 串口上没有应答的相机
    #[error("Camera not attached: {reason}")]
    NotAttached { reason: String },

    /// 交互被取消（会话停止）
    #[error("Operation cancelled")]
    Cancelled,

    /// 会话已在运行
    #[error("Session already running")]
    SessionAlreadyRunning,

    /// 配置无效
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// 控制线程错误
    #[error("IO thread error: {0}")]
    IoThread(String),
}

impl DriverError {
    /// 将设备错误码转换为错误（`None` 返回 `None`）
    pub fn from_device(operation: &'static str, code: DeviceErrorCode) -> Option<Self> {
        match code {
            DeviceErrorCode::None => None,
            DeviceErrorCode::Busy => Some(Self::DeviceBusy { operation }),
            DeviceErrorCode::ParamError => Some(Self::DeviceParamError { operation }),
            DeviceErrorCode::ModeError => Some(Self::DeviceModeError { operation }),
            DeviceErrorCode::Unknown(code) => Some(Self::DeviceUnknownError { operation, code }),
        }
    }

    /// 是否可重试（仅设备忙）
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::DeviceBusy { .. })
    }

    /// 是否为读超时（包括扫描帧头失败）
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Link(LinkError::Timeout) | Self::Link(LinkError::NoHeaderFound { .. })
        )
    }

    /// 设备错误码（仅设备类错误）
    pub fn device_code(&self) -> Option<DeviceErrorCode> {
        match self {
            Self::DeviceBusy { .. } => Some(DeviceErrorCode::Busy),
            Self::DeviceParamError { .. } => Some(DeviceErrorCode::ParamError),
            Self::DeviceModeError { .. } => Some(DeviceErrorCode::ModeError),
            Self::DeviceUnknownError { code, .. } => Some(DeviceErrorCode::Unknown(*code)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DriverError;
    use vcc4_protocol::{DeviceErrorCode, ProtocolError};
    use vcc4_serial::LinkError;

    /// 测试 DriverError 的 Display 实现
    #[test]
    fn test_driver_error_display() {
        let msg = DriverError::Link(LinkError::Timeout).to_string();
        assert!(msg.contains("Read timeout"), "Link error message: {}", msg);

        let msg = DriverError::Protocol(ProtocolError::InvalidHexDigit(b'Z')).to_string();
        assert!(msg.contains("Invalid hex digit"), "Protocol message: {}", msg);

        let msg = DriverError::DeviceUnknownError {
            operation: "get_abs_zoom",
            code: 0x3A,
        }
        .to_string();
        assert!(msg.contains("0x3A") && msg.contains("get_abs_zoom"));

        let msg = DriverError::DeviceBusyTimeout {
            operation: "power_on",
            attempts: 10,
        }
        .to_string();
        assert!(msg.contains("10 attempts") && msg.contains("power_on"));

        let msg = DriverError::Write {
            operation: "set_abs_pan_tilt",
            source: LinkError::FrameTooLong { len: 17, max: 16 },
        }
        .to_string();
        assert!(msg.contains("set_abs_pan_tilt") && msg.contains("limit 16"));

        assert_eq!(DriverError::Cancelled.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_from_device_code() {
        assert!(DriverError::from_device("op", DeviceErrorCode::None).is_none());
        assert!(matches!(
            DriverError::from_device("op", DeviceErrorCode::Busy),
            Some(DriverError::DeviceBusy { operation: "op" })
        ));
        assert!(matches!(
            DriverError::from_device("op", DeviceErrorCode::ParamError),
            Some(DriverError::DeviceParamError { .. })
        ));
        assert!(matches!(
            DriverError::from_device("op", DeviceErrorCode::ModeError),
            Some(DriverError::DeviceModeError { .. })
        ));
        assert!(matches!(
            DriverError::from_device("op", DeviceErrorCode::Unknown(0x33)),
            Some(DriverError::DeviceUnknownError { code: 0x33, .. })
        ));
    }

    #[test]
    fn test_device_code_roundtrip() {
        for code in [
            DeviceErrorCode::Busy,
            DeviceErrorCode::ParamError,
            DeviceErrorCode::ModeError,
            DeviceErrorCode::Unknown(0x42),
        ] {
            let err = DriverError::from_device("op", code).unwrap();
            assert_eq!(err.device_code(), Some(code));
        }
        assert_eq!(DriverError::Cancelled.device_code(), None);
    }

    /// 只有设备忙可重试
    #[test]
    fn test_retryable_classification() {
        assert!(DriverError::DeviceBusy { operation: "op" }.is_retryable());
        assert!(!DriverError::DeviceParamError { operation: "op" }.is_retryable());
        assert!(!DriverError::DeviceModeError { operation: "op" }.is_retryable());
        assert!(!DriverError::Link(LinkError::Timeout).is_retryable());
        assert!(!DriverError::Protocol(ProtocolError::InvalidHexDigit(0)).is_retryable());
    }

    #[test]
    fn test_timeout_classification() {
        assert!(DriverError::Link(LinkError::Timeout).is_timeout());
        assert!(DriverError::Link(LinkError::NoHeaderFound { attempts: 8 }).is_timeout());
        assert!(!DriverError::Link(LinkError::Io(std::io::Error::other("x"))).is_timeout());
        assert!(!DriverError::Cancelled.is_timeout());
    }

    /// 测试 From 转换
    #[test]
    fn test_from_conversions() {
        let err: DriverError = LinkError::Timeout.into();
        assert!(matches!(err, DriverError::Link(LinkError::Timeout)));

        let err: DriverError = ProtocolError::InvalidHexDigit(0x47).into();
        match err {
            DriverError::Protocol(ProtocolError::InvalidHexDigit(b)) => assert_eq!(b, 0x47),
            _ => panic!("Expected Protocol variant"),
        }
    }
}
