//! 真实串口后端
//!
//! 基于 `serialport`：9600 波特率、8N1、原始模式、无硬件流控。
//! 读取使用带超时的就绪等待（poll），单字节读取最多阻塞一个读超时。

use crate::{DEFAULT_BAUD_RATE, DEFAULT_PORT, LinkAdapter, LinkError};
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;
use tracing::debug;

/// 串口配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// 设备路径
    pub path: String,
    /// 波特率
    pub baud_rate: u32,
    /// 初始读超时
    pub read_timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: Duration::from_secs(1),
        }
    }
}

/// 串口链路
pub struct SerialLink {
    port: Box<dyn SerialPort>,
}

impl SerialLink {
    /// 打开并配置串口，丢弃打开前残留的输入
    pub fn open(config: &SerialConfig) -> Result<Self, LinkError> {
        let port = serialport::new(&config.path, config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.read_timeout)
            .open()
            .map_err(|e| LinkError::Open {
                path: config.path.clone(),
                message: e.to_string(),
            })?;

        let mut link = Self { port };
        link.discard_input()?;

        debug!(
            "Opened serial port {} at {} baud",
            config.path, config.baud_rate
        );
        Ok(link)
    }
}

fn to_link_error(e: serialport::Error) -> LinkError {
    LinkError::Io(e.into())
}

impl LinkAdapter for SerialLink {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, LinkError> {
        let mut buf = [0u8; 1];
        match self.port.read(&mut buf) {
            Ok(1) => Ok(buf[0]),
            Ok(_) => Err(LinkError::Timeout),
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => {
                Err(LinkError::Timeout)
            },
            Err(e) => Err(LinkError::Io(e)),
        }
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> Result<(), LinkError> {
        self.port.set_timeout(timeout).map_err(to_link_error)
    }

    fn read_timeout(&self) -> Duration {
        self.port.timeout()
    }

    fn discard_input(&mut self) -> Result<(), LinkError> {
        self.port.clear(ClearBuffer::Input).map_err(to_link_error)
    }
}
