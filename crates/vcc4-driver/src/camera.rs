//! 相机句柄模块
//!
//! 对外提供 `PtzCamera`：提交目标、读取状态、启动/停止会话。
//! 控制循环运行在独立线程中，独占串口链路；停止时线程把链路交还给句柄，
//! 由句柄在同一链路上执行复位序列。

use crate::config::CameraConfig;
use crate::engine::{EngineConfig, ProtocolEngine};
use crate::error::DriverError;
use crate::metrics::MetricsSnapshot;
use crate::pipeline::{control_loop, setup_camera, teardown_camera};
use crate::state::*;
use crossbeam_channel::{Sender, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{error, info, warn};
use vcc4_serial::LinkAdapter;

/// 会话使用的链路类型
pub type BoxedLink = Box<dyn LinkAdapter + Send>;

/// 运行中的会话
struct Session {
    /// 控制线程句柄（返回引擎以便执行复位）
    thread: JoinHandle<ProtocolEngine<BoxedLink>>,
    /// 运行标志（清除后控制循环和进行中的交互尽快退出）
    is_running: Arc<AtomicBool>,
    /// 关闭通道（drop 后唤醒周期等待）
    shutdown_tx: Option<Sender<()>>,
    /// 复位序列的步骤间隔
    teardown_delay: Duration,
    /// 串口描述（日志用）
    port: String,
}

/// VC-C4 云台相机句柄
///
/// ```rust,no_run
/// use vcc4_driver::{CameraConfig, PtzCamera};
///
/// # fn main() -> Result<(), vcc4_driver::DriverError> {
/// let mut camera = PtzCamera::new();
/// camera.start_session(&CameraConfig::default())?;
/// camera.submit_command(10.0, 0.0, 0);
/// let state = camera.read_state();
/// println!("pan {:.1}°", state.pan);
/// camera.stop_session()?;
/// # Ok(())
/// # }
/// ```
pub struct PtzCamera {
    ctx: Arc<CameraContext>,
    session: Option<Session>,
}

impl PtzCamera {
    pub fn new() -> Self {
        Self {
            ctx: Arc::new(CameraContext::new()),
            session: None,
        }
    }

    /// 提交新的目标（覆盖旧目标，越界值被钳制）
    pub fn submit_command(&self, pan_deg: f64, tilt_deg: f64, zoom_units: i32) {
        self.ctx
            .command
            .store(Arc::new(PtzCommand::new(pan_deg, tilt_deg, zoom_units)));
    }

    /// 当前目标
    pub fn command(&self) -> PtzCommand {
        **self.ctx.command.load()
    }

    /// 最新观测值（无锁读取）
    pub fn read_state(&self) -> PtzState {
        **self.ctx.state.load()
    }

    pub fn status(&self) -> SessionStatus {
        self.ctx.status.get(Ordering::Acquire)
    }

    /// 控制循环是否在运行
    pub fn is_running(&self) -> bool {
        self.status().is_running()
            && self
                .session
                .as_ref()
                .is_some_and(|session| !session.thread.is_finished())
    }

    /// 导致会话终止的错误
    pub fn fault(&self) -> Option<Arc<DriverError>> {
        self.ctx.fault.load_full()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.ctx.metrics.snapshot()
    }

    /// 打开串口并启动会话
    #[cfg(feature = "native")]
    pub fn start_session(&mut self, config: &CameraConfig) -> Result<(), DriverError> {
        config.validate()?;
        let link = vcc4_serial::SerialLink::open(&config.serial_config())?;
        self.start_session_with_link(link, config)
    }

    /// 在给定链路上启动会话
    ///
    /// 初始化失败时尽力断电并释放链路。上一个会话已终止时，先执行它的复位序列。
    pub fn start_session_with_link(
        &mut self,
        link: impl LinkAdapter + Send + 'static,
        config: &CameraConfig,
    ) -> Result<(), DriverError> {
        config.validate()?;

        if self.session.is_some() {
            if self.status().is_running() {
                return Err(DriverError::SessionAlreadyRunning);
            }
            self.stop_session()?;
        }

        self.ctx.reset_for_session();

        let engine_config = EngineConfig {
            header_scan_attempts: config.header_scan_attempts,
            settle_delay: config.settle_delay(),
        };
        let mut engine = ProtocolEngine::new(Box::new(link) as BoxedLink, engine_config)
            .with_metrics(self.ctx.metrics.clone());

        info!("Starting camera session on {}", config.port);
        if let Err(e) = setup_camera(&mut engine, config) {
            error!("Camera setup failed: {}", e);
            if let Err(power_err) = engine.set_power(false) {
                warn!("Failed to power off after setup failure: {}", power_err);
            }
            self.ctx.status.set(SessionStatus::Idle, Ordering::Release);
            return Err(e);
        }

        let is_running = Arc::new(AtomicBool::new(true));
        engine.attach_running_flag(is_running.clone());
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);

        self.ctx.status.set(SessionStatus::Running, Ordering::Release);
        let ctx = self.ctx.clone();
        let loop_config = config.clone();
        let loop_running = is_running.clone();
        let thread = std::thread::Builder::new()
            .name("vcc4-control".into())
            .spawn(move || control_loop(engine, ctx, loop_config, loop_running, shutdown_rx))
            .map_err(|e| {
                self.ctx.status.set(SessionStatus::Idle, Ordering::Release);
                DriverError::IoThread(format!("failed to spawn control thread: {}", e))
            })?;

        self.session = Some(Session {
            thread,
            is_running,
            shutdown_tx: Some(shutdown_tx),
            teardown_delay: config.teardown_delay(),
            port: config.port.clone(),
        });
        info!("Camera session running on {}", config.port);
        Ok(())
    }

    /// 停止会话
    ///
    /// 通知控制循环退出并等待线程交还链路，然后执行复位序列（回中、变焦归零、断电）。
    /// 没有会话时直接返回。终止状态的会话停止后故障信息保留。
    pub fn stop_session(&mut self) -> Result<(), DriverError> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };

        session.is_running.store(false, Ordering::Release);
        drop(session.shutdown_tx.take());

        let mut engine = session
            .thread
            .join()
            .map_err(|_| {
                self.ctx.status.set(SessionStatus::Idle, Ordering::Release);
                DriverError::IoThread("control thread panicked".into())
            })?;

        teardown_camera(&mut engine, session.teardown_delay);
        drop(engine);

        if self.status() == SessionStatus::Running {
            self.ctx.status.set(SessionStatus::Idle, Ordering::Release);
        }
        info!("Camera session on {} stopped", session.port);
        Ok(())
    }
}

impl Default for PtzCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PtzCamera {
    fn drop(&mut self) {
        if let Err(e) = self.stop_session() {
            error!("Failed to stop camera session on drop: {}", e);
        }
    }
}
