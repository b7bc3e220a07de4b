//! Builder 模式实现
//!
//! 提供链式构造并启动 `PtzCamera` 的便捷方式。

use crate::camera::PtzCamera;
use crate::config::CameraConfig;
use crate::error::DriverError;
use std::time::Duration;
use vcc4_serial::LinkAdapter;

/// 相机 Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use vcc4_driver::CameraBuilder;
/// use std::time::Duration;
///
/// let camera = CameraBuilder::new()
///     .port("/dev/ttyUSB0")
///     .cycle_interval(Duration::from_millis(200))
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct CameraBuilder {
    config: CameraConfig,
}

impl CameraBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从已有配置开始
    pub fn with_config(config: CameraConfig) -> Self {
        Self { config }
    }

    /// 串口设备路径
    pub fn port(mut self, port: impl Into<String>) -> Self {
        self.config.port = port.into();
        self
    }

    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.config.baud_rate = baud_rate;
        self
    }

    /// 常规读超时
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// 启动探测时的读超时
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.config.probe_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// 电源/控制模式指令的稳定等待时间
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.config.settle_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn cycle_interval(mut self, interval: Duration) -> Self {
        self.config.cycle_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn teardown_delay(mut self, delay: Duration) -> Self {
        self.config.teardown_delay_ms = delay.as_millis() as u64;
        self
    }

    /// 设备忙重试参数
    pub fn retry(
        mut self,
        max_attempts: u32,
        initial_backoff: Duration,
        max_backoff: Duration,
    ) -> Self {
        self.config.retry.max_attempts = max_attempts;
        self.config.retry.initial_backoff_ms = initial_backoff.as_millis() as u64;
        self.config.retry.max_backoff_ms = max_backoff.as_millis() as u64;
        self
    }

    /// 当前配置
    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// 打开串口并启动会话
    #[cfg(feature = "native")]
    pub fn build(self) -> Result<PtzCamera, DriverError> {
        let mut camera = PtzCamera::new();
        camera.start_session(&self.config)?;
        Ok(camera)
    }

    /// 在给定链路上启动会话
    pub fn build_with_link(
        self,
        link: impl LinkAdapter + Send + 'static,
    ) -> Result<PtzCamera, DriverError> {
        let mut camera = PtzCamera::new();
        camera.start_session_with_link(link, &self.config)?;
        Ok(camera)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = CameraBuilder::new();
        assert_eq!(builder.config(), &CameraConfig::default());
    }

    #[test]
    fn test_builder_chain() {
        let builder = CameraBuilder::new()
            .port("/dev/ttyUSB0")
            .baud_rate(19200)
            .read_timeout(Duration::from_millis(500))
            .settle_delay(Duration::ZERO)
            .cycle_interval(Duration::from_millis(100))
            .retry(3, Duration::from_millis(10), Duration::from_millis(40));

        let config = builder.config();
        assert_eq!(config.port, "/dev/ttyUSB0");
        assert_eq!(config.baud_rate, 19200);
        assert_eq!(config.read_timeout_ms, 500);
        assert_eq!(config.settle_delay_ms, 0);
        assert_eq!(config.cycle_interval_ms, 100);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.max_backoff_ms, 40);
    }

    #[test]
    fn test_builder_with_config() {
        let config = CameraConfig {
            port: "/dev/ttyS0".into(),
            ..Default::default()
        };
        let builder = CameraBuilder::with_config(config.clone()).teardown_delay(Duration::ZERO);
        assert_eq!(builder.config().port, "/dev/ttyS0");
        assert_eq!(builder.config().teardown_delay_ms, 0);
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let (link, _handle) = vcc4_serial::MockLink::new();
        let result = CameraBuilder::new()
            .retry(0, Duration::ZERO, Duration::ZERO)
            .build_with_link(link);
        assert!(matches!(result, Err(DriverError::Config(_))));
    }
}
