//! # VC-C4 Serial Link Layer
//!
//! 串口链路抽象层：统一的 `LinkAdapter` 接口、带超时的逐字节读取、帧组装。
//!
//! - `reader`: 帧头扫描与帧组装（链路读取器）
//! - `serial`: 基于 `serialport` 的真实串口（feature `native`）
//! - `mock`: 脚本化的内存链路（feature `mock`，用于测试）

use std::time::Duration;
use thiserror::Error;

pub use vcc4_protocol::{FrameKind, RawFrame};

pub mod reader;

#[cfg(feature = "native")]
pub mod serial;

#[cfg(feature = "native")]
pub use serial::{SerialConfig, SerialLink};

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockHandle, MockLink};

pub use reader::{DEFAULT_HEADER_SCAN_ATTEMPTS, read_frame};

/// 默认串口设备
pub const DEFAULT_PORT: &str = "/dev/ttyS1";

/// 默认波特率
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// 链路层统一错误类型
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Read timeout")]
    Timeout,
    #[error("No frame header found after {attempts} bytes")]
    NoHeaderFound { attempts: usize },
    #[error("Frame too long: {len} bytes (limit {max})")]
    FrameTooLong { len: usize, max: usize },
    #[error("Failed to open serial port {path}: {message}")]
    Open { path: String, message: String },
    #[error("Read cancelled")]
    Cancelled,
}

impl LinkError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, LinkError::Timeout)
    }
}

/// 串口链路适配器
///
/// 半双工、逐字节读取；所有读取都受读超时约束，不会无限阻塞。
pub trait LinkAdapter {
    /// 写入完整字节序列（不会被截断）
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), LinkError>;

    /// 读取单个字节（受当前读超时约束）
    fn read_byte(&mut self) -> Result<u8, LinkError>;

    /// 设置读超时
    fn set_read_timeout(&mut self, timeout: Duration) -> Result<(), LinkError>;

    /// 当前读超时
    fn read_timeout(&self) -> Duration;

    /// 丢弃输入缓冲区中尚未读取的字节
    fn discard_input(&mut self) -> Result<(), LinkError> {
        Ok(())
    }
}

impl<T: LinkAdapter + ?Sized> LinkAdapter for Box<T> {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        (**self).write_all(bytes)
    }

    fn read_byte(&mut self) -> Result<u8, LinkError> {
        (**self).read_byte()
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> Result<(), LinkError> {
        (**self).set_read_timeout(timeout)
    }

    fn read_timeout(&self) -> Duration {
        (**self).read_timeout()
    }

    fn discard_input(&mut self) -> Result<(), LinkError> {
        (**self).discard_input()
    }
}
