//! 会话性能指标模块
//!
//! 原子计数器，可以在任何线程读取，不引入锁竞争。

use std::sync::atomic::{AtomicU64, Ordering};

/// 会话实时指标
///
/// ```rust
/// use vcc4_driver::SessionMetrics;
/// use std::sync::atomic::Ordering;
///
/// let metrics = SessionMetrics::default();
/// metrics.frames_tx.fetch_add(1, Ordering::Relaxed);
///
/// let snapshot = metrics.snapshot();
/// assert_eq!(snapshot.frames_tx, 1);
/// ```
#[derive(Debug, Default)]
pub struct SessionMetrics {
    /// 已完成的控制周期数
    pub cycles: AtomicU64,

    /// 发送帧数
    pub frames_tx: AtomicU64,

    /// 接收并通过校验的应答帧数
    pub frames_rx: AtomicU64,

    /// 设备忙应答次数
    pub busy_answers: AtomicU64,

    /// 设备错误应答次数（忙以外的非零错误码）
    pub device_errors: AtomicU64,

    /// 读超时次数（含帧头扫描失败）
    pub timeouts: AtomicU64,

    /// 畸形帧次数
    pub malformed_frames: AtomicU64,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取指标快照
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            frames_tx: self.frames_tx.load(Ordering::Relaxed),
            frames_rx: self.frames_rx.load(Ordering::Relaxed),
            busy_answers: self.busy_answers.load(Ordering::Relaxed),
            device_errors: self.device_errors.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            malformed_frames: self.malformed_frames.load(Ordering::Relaxed),
        }
    }

    /// 重置所有计数器
    pub fn reset(&self) {
        self.cycles.store(0, Ordering::Relaxed);
        self.frames_tx.store(0, Ordering::Relaxed);
        self.frames_rx.store(0, Ordering::Relaxed);
        self.busy_answers.store(0, Ordering::Relaxed);
        self.device_errors.store(0, Ordering::Relaxed);
        self.timeouts.store(0, Ordering::Relaxed);
        self.malformed_frames.store(0, Ordering::Relaxed);
    }

    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// 指标快照（不可变）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct MetricsSnapshot {
    pub cycles: u64,
    pub frames_tx: u64,
    pub frames_rx: u64,
    pub busy_answers: u64,
    pub device_errors: u64,
    pub timeouts: u64,
    pub malformed_frames: u64,
}

impl MetricsSnapshot {
    /// 应答成功率（百分比）
    ///
    /// 没有发送过帧时返回 100.0。
    pub fn answer_rate(&self) -> f64 {
        if self.frames_tx == 0 {
            return 100.0;
        }
        (self.frames_rx as f64 / self.frames_tx as f64) * 100.0
    }

    /// 链路是否出现过异常（超时或畸形帧）
    pub fn has_link_errors(&self) -> bool {
        self.timeouts > 0 || self.malformed_frames > 0
    }
}
