//! 共享状态模块
//!
//! 主机线程与控制线程之间通过单槽覆盖式通道（`ArcSwap`）交换数据：
//! - `PtzCommand`: 主机写入的期望值，控制线程每个周期读取最新值
//! - `PtzState`: 控制线程每个周期整体替换的观测值
//!
//! 两侧都不会阻塞，也不存在队列。

use crate::error::DriverError;
use crate::metrics::SessionMetrics;
use arc_swap::{ArcSwap, ArcSwapOption};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use vcc4_protocol::{Axis, PanTilt, clamp_angle, clamp_zoom};

/// 期望的云台姿态（构造时钳制到物理范围）
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize)]
pub struct PtzCommand {
    /// 水平角（度，逆时针为正，[-98, 98]）
    pan: f64,
    /// 俯仰角（度，[-30, 88]）
    tilt: f64,
    /// 变焦（设备单位，[0, 2140]）
    zoom: u16,
}

impl PtzCommand {
    /// 创建指令，越界值钳制到边界
    pub fn new(pan: f64, tilt: f64, zoom: i32) -> Self {
        Self {
            pan: clamp_angle(Axis::Pan, pan),
            tilt: clamp_angle(Axis::Tilt, tilt),
            zoom: clamp_zoom(zoom),
        }
    }

    pub fn pan(&self) -> f64 {
        self.pan
    }

    pub fn tilt(&self) -> f64 {
        self.tilt
    }

    pub fn zoom(&self) -> u16 {
        self.zoom
    }

    pub fn pan_tilt(&self) -> PanTilt {
        PanTilt::new(self.pan, self.tilt)
    }
}

/// 观测到的云台姿态
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize)]
pub struct PtzState {
    /// 水平角（度，逆时针为正）
    pub pan: f64,
    /// 俯仰角（度）
    pub tilt: f64,
    /// 变焦（设备单位）
    pub zoom: u16,
    /// 发布时间（微秒，进程内单调时钟）
    pub timestamp_us: u64,
    /// 发布序号（0 表示尚未发布）
    pub cycle: u64,
}

impl PtzState {
    /// 是否已有观测值
    pub fn is_valid(&self) -> bool {
        self.cycle > 0
    }

    /// 与期望值的距离是否在给定容差内（角度：度，变焦：设备单位）
    pub fn is_near(&self, command: &PtzCommand, angle_tolerance: f64, zoom_tolerance: u16) -> bool {
        (self.pan - command.pan()).abs() <= angle_tolerance
            && (self.tilt - command.tilt()).abs() <= angle_tolerance
            && self.zoom.abs_diff(command.zoom()) <= zoom_tolerance
    }
}

/// 进程内单调时钟（微秒）
pub fn monotonic_us() -> u64 {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    EPOCH.get_or_init(Instant::now).elapsed().as_micros() as u64
}

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[repr(u8)]
pub enum SessionStatus {
    /// 未启动或已正常停止
    #[default]
    Idle = 0,
    /// 控制循环运行中
    Running = 1,
    /// 控制循环因致命错误退出（故障见 `fault()`）
    Terminated = 2,
}

impl SessionStatus {
    /// 从 u8 转换，无效值视为 Idle
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Running,
            2 => Self::Terminated,
            _ => Self::Idle,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn is_running(self) -> bool {
        self == Self::Running
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// 会话状态（原子版本，用于线程间共享）
#[derive(Debug)]
pub struct AtomicSessionStatus {
    inner: AtomicU8,
}

impl AtomicSessionStatus {
    pub fn new(status: SessionStatus) -> Self {
        Self {
            inner: AtomicU8::new(status.as_u8()),
        }
    }

    pub fn get(&self, ordering: Ordering) -> SessionStatus {
        SessionStatus::from_u8(self.inner.load(ordering))
    }

    pub fn set(&self, status: SessionStatus, ordering: Ordering) {
        self.inner.store(status.as_u8(), ordering);
    }

    /// 比较并交换，成功返回 `Ok(旧值)`，失败返回 `Err(当前值)`
    pub fn compare_exchange(
        &self,
        current: SessionStatus,
        new: SessionStatus,
    ) -> Result<SessionStatus, SessionStatus> {
        self.inner
            .compare_exchange(
                current.as_u8(),
                new.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(SessionStatus::from_u8)
            .map_err(SessionStatus::from_u8)
    }
}

impl Default for AtomicSessionStatus {
    fn default() -> Self {
        Self::new(SessionStatus::Idle)
    }
}

/// 相机共享上下文
///
/// 主机句柄与控制线程共同持有（`Arc`）。
#[derive(Debug, Default)]
pub struct CameraContext {
    /// 最新期望值（主机写，控制线程读）
    pub command: ArcSwap<PtzCommand>,
    /// 最新观测值（控制线程写，主机读）
    pub state: ArcSwap<PtzState>,
    /// 会话状态
    pub status: AtomicSessionStatus,
    /// 导致会话终止的错误
    pub fault: ArcSwapOption<DriverError>,
    /// 性能指标
    pub metrics: Arc<SessionMetrics>,
}

impl CameraContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新会话开始前清零期望值、观测值与故障
    pub fn reset_for_session(&self) {
        self.command.store(Arc::new(PtzCommand::default()));
        self.state.store(Arc::new(PtzState::default()));
        self.fault.store(None);
        self.metrics.reset();
    }

    /// 发布一次观测值
    pub fn publish(&self, state: PtzState) {
        self.state.store(Arc::new(state));
    }

    /// 记录致命错误并标记会话终止
    pub fn terminate(&self, error: DriverError) {
        self.fault.store(Some(Arc::new(error)));
        self.status.set(SessionStatus::Terminated, Ordering::Release);
    }
}
