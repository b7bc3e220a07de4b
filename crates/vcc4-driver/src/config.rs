//! 会话配置
//!
//! 所有时间参数以毫秒为单位（`*_ms`），可从 TOML 文件加载：
//!
//! ```toml
//! port = "/dev/ttyUSB0"
//! cycle_interval_ms = 200
//!
//! [retry]
//! max_attempts = 5
//! ```
//!
//! 未出现的字段使用默认值。

use crate::error::DriverError;
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use vcc4_serial::DEFAULT_HEADER_SCAN_ATTEMPTS;

pub use vcc4_serial::{DEFAULT_BAUD_RATE, DEFAULT_PORT};

/// 相机会话配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// 串口设备路径
    pub port: String,
    /// 波特率
    pub baud_rate: u32,
    /// 常规读超时（毫秒）
    pub read_timeout_ms: u64,
    /// 启动探测时的读超时（毫秒）
    pub probe_timeout_ms: u64,
    /// 扫描帧头时最多读取的字节数
    pub header_scan_attempts: usize,
    /// 电源/控制模式指令写入后等待应答的时间（毫秒）
    pub settle_delay_ms: u64,
    /// 控制周期间隔（毫秒）
    pub cycle_interval_ms: u64,
    /// 停止时各复位指令之间的间隔（毫秒）
    pub teardown_delay_ms: u64,
    /// 设备忙重试策略
    pub retry: RetryConfig,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: 1000,
            probe_timeout_ms: 1000,
            header_scan_attempts: DEFAULT_HEADER_SCAN_ATTEMPTS,
            settle_delay_ms: 5000,
            cycle_interval_ms: 300,
            teardown_delay_ms: 300,
            retry: RetryConfig::default(),
        }
    }
}

/// 设备忙重试配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// 最大尝试次数（含首次）
    pub max_attempts: u32,
    /// 首次退避（毫秒）
    pub initial_backoff_ms: u64,
    /// 退避上限（毫秒）
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_backoff_ms: 100,
            max_backoff_ms: 2000,
        }
    }
}

impl CameraConfig {
    /// 从 TOML 字符串解析（不做校验）
    pub fn from_toml_str(content: &str) -> Result<Self, DriverError> {
        toml::from_str(content).map_err(|e| DriverError::Config(e.to_string()))
    }

    /// 从文件加载并校验
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, DriverError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DriverError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// 序列化为 TOML
    pub fn to_toml_string(&self) -> Result<String, DriverError> {
        toml::to_string_pretty(self).map_err(|e| DriverError::Config(e.to_string()))
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), DriverError> {
        if self.port.is_empty() {
            return Err(DriverError::Config("port must not be empty".into()));
        }
        if self.baud_rate == 0 {
            return Err(DriverError::Config("baud_rate must be positive".into()));
        }
        if self.read_timeout_ms == 0 {
            return Err(DriverError::Config("read_timeout_ms must be positive".into()));
        }
        if self.probe_timeout_ms == 0 {
            return Err(DriverError::Config("probe_timeout_ms must be positive".into()));
        }
        if self.header_scan_attempts == 0 {
            return Err(DriverError::Config(
                "header_scan_attempts must be positive".into(),
            ));
        }
        if self.cycle_interval_ms == 0 {
            return Err(DriverError::Config(
                "cycle_interval_ms must be positive".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(DriverError::Config(
                "retry.max_attempts must be positive".into(),
            ));
        }
        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return Err(DriverError::Config(
                "retry.initial_backoff_ms must not exceed retry.max_backoff_ms".into(),
            ));
        }
        Ok(())
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms)
    }

    pub fn teardown_delay(&self) -> Duration {
        Duration::from_millis(self.teardown_delay_ms)
    }

    /// 设备忙重试策略
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            initial_backoff: Duration::from_millis(self.retry.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.retry.max_backoff_ms),
        }
    }

    /// 串口配置（打开时使用探测超时）
    #[cfg(feature = "native")]
    pub fn serial_config(&self) -> vcc4_serial::SerialConfig {
        vcc4_serial::SerialConfig {
            path: self.port.clone(),
            baud_rate: self.baud_rate,
            read_timeout: self.probe_timeout(),
        }
    }
}
