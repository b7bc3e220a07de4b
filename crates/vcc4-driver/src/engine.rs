//! 协议引擎
//!
//! 每个逻辑操作对应一次“写入指令帧 → 读取应答帧”的交互：
//!
//! 1. 编码并检查长度上限（超长返回 `Write`）
//! 2. 写入链路
//! 3. 电源/控制模式指令额外等待设备稳定时间
//! 4. 读取并校验应答帧
//! 5. 按应答错误码分类（忙可重试，其余致命）
//!
//! 引擎本身不做重试，重试由调用方（`RetryPolicy` 或控制循环）决定。
//! 取消检查位于每次写入之前、扫描帧头的每次读取之前以及读取之后，写入本身不会被截断。
//! 取消后出现的读取失败一律报告为 `Cancelled`。

use crate::error::DriverError;
use crate::metrics::SessionMetrics;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, trace};
use vcc4_protocol::{
    Answer, Command, DevicePanTilt, ProtocolError, ZOOM_MAX, default_tilt_range,
};
use vcc4_serial::{DEFAULT_HEADER_SCAN_ATTEMPTS, LinkAdapter, LinkError, read_frame};

/// 引擎参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// 扫描帧头时最多读取的字节数
    pub header_scan_attempts: usize,
    /// 电源/控制模式指令写入后等待应答的时间
    pub settle_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            header_scan_attempts: DEFAULT_HEADER_SCAN_ATTEMPTS,
            settle_delay: Duration::from_secs(5),
        }
    }
}

/// 协议引擎（独占一条链路）
pub struct ProtocolEngine<L: LinkAdapter> {
    link: L,
    config: EngineConfig,
    metrics: Arc<SessionMetrics>,
    /// 运行标志，清除后交互返回 `Cancelled`
    is_running: Option<Arc<AtomicBool>>,
}

impl<L: LinkAdapter> ProtocolEngine<L> {
    pub fn new(link: L, config: EngineConfig) -> Self {
        Self {
            link,
            config,
            metrics: Arc::new(SessionMetrics::default()),
            is_running: None,
        }
    }

    /// 共享外部指标
    pub fn with_metrics(mut self, metrics: Arc<SessionMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// 绑定运行标志
    pub fn attach_running_flag(&mut self, flag: Arc<AtomicBool>) {
        self.is_running = Some(flag);
    }

    /// 解除运行标志（停止后的复位序列不受取消影响）
    pub fn detach_running_flag(&mut self) {
        self.is_running = None;
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<SessionMetrics> {
        &self.metrics
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// 取回链路
    pub fn into_link(self) -> L {
        self.link
    }

    /// 打开或关闭电源
    pub fn set_power(&mut self, on: bool) -> Result<(), DriverError> {
        self.execute(Command::Power(on)).map(|_| ())
    }

    /// 切换到主机控制模式
    pub fn set_control_mode(&mut self) -> Result<(), DriverError> {
        self.execute(Command::ControlMode).map(|_| ())
    }

    /// 设置默认俯仰范围（-30° ~ 88°）
    pub fn set_default_tilt_range(&mut self) -> Result<(), DriverError> {
        let (min, max) = default_tilt_range();
        self.execute(Command::TiltRange { min, max }).map(|_| ())
    }

    /// 绝对水平/俯仰定位（设备单位）
    pub fn set_abs_pan_tilt(&mut self, position: DevicePanTilt) -> Result<(), DriverError> {
        self.execute(Command::SetPanTilt(position)).map(|_| ())
    }

    /// 绝对变焦（设备单位，超过上限时钳制）
    pub fn set_abs_zoom(&mut self, zoom: u16) -> Result<(), DriverError> {
        self.execute(Command::SetZoom(zoom.min(ZOOM_MAX))).map(|_| ())
    }

    /// 查询当前水平/俯仰位置（设备单位）
    pub fn get_abs_pan_tilt(&mut self) -> Result<DevicePanTilt, DriverError> {
        let answer = self.execute(Command::GetPanTilt)?;
        self.decode(answer.pan_tilt())
    }

    /// 查询当前变焦（设备单位）
    pub fn get_abs_zoom(&mut self) -> Result<u16, DriverError> {
        let answer = self.execute(Command::GetZoom)?;
        self.decode(answer.zoom())
    }

    /// 执行一次交互并检查设备错误码
    fn execute(&mut self, command: Command) -> Result<Answer, DriverError> {
        let answer = self.exchange(command)?;
        let code = answer.code();
        match DriverError::from_device(command.name(), code) {
            None => Ok(answer),
            Some(err) => {
                if code.is_busy() {
                    SessionMetrics::incr(&self.metrics.busy_answers);
                } else {
                    SessionMetrics::incr(&self.metrics.device_errors);
                }
                debug!(
                    "{} answered with device code 0x{:02X}",
                    command.name(),
                    code.as_byte()
                );
                Err(err)
            },
        }
    }

    /// 写入指令帧并读取应答帧
    fn exchange(&mut self, command: Command) -> Result<Answer, DriverError> {
        self.check_cancelled()?;

        let operation = command.name();
        let kind = command.kind();
        let frame = command.encode();
        if frame.len() > kind.max_tx_len() {
            return Err(DriverError::Write {
                operation,
                source: LinkError::FrameTooLong {
                    len: frame.len(),
                    max: kind.max_tx_len(),
                },
            });
        }

        trace!("TX {}: {}", operation, hex::encode_upper(&frame));
        self.link
            .write_all(&frame)
            .map_err(|source| DriverError::Write { operation, source })?;
        SessionMetrics::incr(&self.metrics.frames_tx);

        if matches!(command, Command::Power(_) | Command::ControlMode)
            && !self.config.settle_delay.is_zero()
        {
            trace!("Waiting {:?} for {} to settle", self.config.settle_delay, operation);
            std::thread::sleep(self.config.settle_delay);
        }

        let raw = match read_frame(
            &mut self.link,
            kind,
            self.config.header_scan_attempts,
            self.is_running.as_deref(),
        ) {
            Ok(raw) => raw,
            Err(e) if matches!(e, LinkError::Cancelled) || self.is_cancelled() => {
                debug!("{} interrupted by stop: {}", operation, e);
                return Err(DriverError::Cancelled);
            },
            Err(e) => {
                if matches!(e, LinkError::Timeout | LinkError::NoHeaderFound { .. }) {
                    SessionMetrics::incr(&self.metrics.timeouts);
                }
                debug!("{} got no answer: {}", operation, e);
                return Err(e.into());
            },
        };
        trace!("RX {}: {}", operation, hex::encode_upper(raw.as_slice()));

        let answer = match Answer::parse(kind, raw) {
            Ok(answer) => answer,
            Err(e) => return Err(self.malformed(operation, e)),
        };
        SessionMetrics::incr(&self.metrics.frames_rx);

        self.check_cancelled()?;
        Ok(answer)
    }

    fn decode<T>(&mut self, result: Result<T, ProtocolError>) -> Result<T, DriverError> {
        result.map_err(|e| self.malformed("decode", e))
    }

    /// 记录畸形帧并丢弃残留输入，使下一次交互从干净的缓冲区开始
    fn malformed(&mut self, operation: &'static str, error: ProtocolError) -> DriverError {
        SessionMetrics::incr(&self.metrics.malformed_frames);
        debug!("{} received a malformed answer: {}", operation, error);
        if let Err(e) = self.link.discard_input() {
            debug!("Failed to discard input after malformed frame: {}", e);
        }
        DriverError::Protocol(error)
    }

    fn is_cancelled(&self) -> bool {
        self.is_running
            .as_ref()
            .is_some_and(|flag| !flag.load(Ordering::Acquire))
    }

    fn check_cancelled(&self) -> Result<(), DriverError> {
        if self.is_cancelled() {
            return Err(DriverError::Cancelled);
        }
        Ok(())
    }
}
