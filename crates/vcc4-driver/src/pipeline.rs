//! Pipeline 控制循环模块
//!
//! 会话的三个阶段：
//!
//! - `setup_camera`: 上电、切换控制模式、探测相机、设置俯仰范围
//! - `control_loop`: 后台线程中周期性地下发变化的目标并查询实际位置
//! - `teardown_camera`: 回中、变焦归零、断电（尽力而为）

use crate::cancel::CancelSignal;
use crate::config::CameraConfig;
use crate::engine::ProtocolEngine;
use crate::error::DriverError;
use crate::metrics::SessionMetrics;
use crate::retry::RetryPolicy;
use crate::state::{CameraContext, PtzState, monotonic_us};
use crossbeam_channel::Receiver;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};
use vcc4_protocol::DevicePanTilt;
use vcc4_serial::LinkAdapter;

/// 已下发给设备的目标值
///
/// `None` 表示尚未下发，第一个周期两个轴都会被视为变化。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IssuedTargets {
    pub pan_tilt: Option<DevicePanTilt>,
    pub zoom: Option<u16>,
}

/// 会话初始化
///
/// 顺序：断电（忙时重试，最终结果忽略）→ 上电（容忍模式错误）→ 控制模式 → 探测 → 俯仰范围。
/// 每一步在设备忙时按 `RetryPolicy` 重试。无应答视为相机未连接。
pub fn setup_camera<L: LinkAdapter>(
    engine: &mut ProtocolEngine<L>,
    config: &CameraConfig,
) -> Result<(), DriverError> {
    let retry = config.retry_policy();
    engine.link_mut().set_read_timeout(config.probe_timeout())?;

    if let Err(e) = retry.run("power_off", None, || engine.set_power(false)) {
        debug!("Initial power off failed (ignored): {}", e);
    }

    match retry.run("power_on", None, || engine.set_power(true)) {
        Ok(()) => {},
        Err(DriverError::DeviceModeError { .. }) => {
            debug!("Power on answered with mode error, camera already on")
        },
        Err(e) => return Err(no_answer_as_not_attached("power_on", e)),
    }

    retry
        .run("set_control_mode", None, || engine.set_control_mode())
        .map_err(|e| no_answer_as_not_attached("set_control_mode", e))?;

    match retry.run("get_abs_pan_tilt", None, || engine.get_abs_pan_tilt()) {
        Ok(position) => {
            let host = position.to_host();
            info!(
                "Camera attached at pan {:.2}°, tilt {:.2}°",
                host.pan, host.tilt
            );
        },
        Err(e @ DriverError::DeviceBusyTimeout { .. }) => return Err(e),
        Err(e) => {
            return Err(DriverError::NotAttached {
                reason: format!("probe failed: {}", e),
            });
        },
    }

    engine.link_mut().set_read_timeout(config.read_timeout())?;

    retry.run("set_default_tilt_range", None, || {
        engine.set_default_tilt_range()
    })?;

    Ok(())
}

fn no_answer_as_not_attached(operation: &str, error: DriverError) -> DriverError {
    if error.is_timeout() {
        DriverError::NotAttached {
            reason: format!("no answer to {}: {}", operation, error),
        }
    } else {
        error
    }
}

/// 会话复位（尽力而为）
///
/// 依次回中、变焦归零、断电；各步骤失败只记录日志，不中断后续步骤。
pub fn teardown_camera<L: LinkAdapter>(engine: &mut ProtocolEngine<L>, delay: Duration) {
    engine.detach_running_flag();
    // 被停止打断的交互可能留下半帧
    if let Err(e) = engine.link_mut().discard_input() {
        debug!("Failed to discard input before teardown: {}", e);
    }

    std::thread::sleep(delay);
    if let Err(e) = engine.set_abs_pan_tilt(DevicePanTilt::CENTER) {
        warn!("Failed to center camera: {}", e);
    }

    std::thread::sleep(delay);
    if let Err(e) = engine.set_abs_zoom(0) {
        warn!("Failed to reset zoom: {}", e);
    }

    if let Err(e) = engine.set_power(false) {
        warn!("Failed to power off camera: {}", e);
    }
}

/// 控制循环
///
/// 每个周期：读取最新目标 → 下发变化的轴 → 查询实际位置 → 发布状态 → 等待周期间隔。
///
/// - 下发时设备忙：该轴保持“未下发”，下个周期重试
/// - 其他错误（含查询失败）：记录故障，会话进入 `Terminated`，循环退出
/// - 运行标志清除或关闭通道断开：循环退出；停止打断交互时不记录故障
///
/// 返回引擎，以便调用方在同一链路上执行复位序列。
pub fn control_loop<L: LinkAdapter>(
    mut engine: ProtocolEngine<L>,
    ctx: Arc<CameraContext>,
    config: CameraConfig,
    is_running: Arc<AtomicBool>,
    shutdown_rx: Receiver<()>,
) -> ProtocolEngine<L> {
    let retry = config.retry_policy();
    let interval = config.cycle_interval();
    let cancel = CancelSignal::new(is_running).with_wakeup(shutdown_rx);
    let mut issued = IssuedTargets::default();
    let mut cycle: u64 = 0;

    loop {
        if cancel.is_cancelled() {
            break;
        }

        match run_cycle(&mut engine, &ctx, &mut issued, &retry, &cancel) {
            Ok(mut state) => {
                cycle += 1;
                state.cycle = cycle;
                ctx.publish(state);
                SessionMetrics::incr(&ctx.metrics.cycles);
            },
            Err(DriverError::Cancelled) => {
                debug!("Control loop cancelled");
                break;
            },
            Err(e) if cancel.is_cancelled() => {
                debug!("Control loop stopped during exchange: {}", e);
                break;
            },
            Err(e) => {
                error!("Control loop terminated: {}", e);
                ctx.terminate(e);
                break;
            },
        }

        if cancel.wait(interval) {
            break;
        }
    }

    trace!("Control loop exited after {} cycles", cycle);
    engine
}

/// 执行一个控制周期，返回观测值（`cycle` 字段由调用方填写）
pub fn run_cycle<L: LinkAdapter>(
    engine: &mut ProtocolEngine<L>,
    ctx: &CameraContext,
    issued: &mut IssuedTargets,
    retry: &RetryPolicy,
    cancel: &CancelSignal,
) -> Result<PtzState, DriverError> {
    let command = **ctx.command.load();

    let target = command.pan_tilt().to_device();
    if issued.pan_tilt != Some(target) {
        match engine.set_abs_pan_tilt(target) {
            Ok(()) => issued.pan_tilt = Some(target),
            Err(e) if e.is_retryable() => debug!("Pan/tilt busy, retrying next cycle"),
            Err(e) => return Err(e),
        }
    }

    let zoom = command.zoom();
    if issued.zoom != Some(zoom) {
        match engine.set_abs_zoom(zoom) {
            Ok(()) => issued.zoom = Some(zoom),
            Err(e) if e.is_retryable() => debug!("Zoom busy, retrying next cycle"),
            Err(e) => return Err(e),
        }
    }

    let position = retry.run("get_abs_pan_tilt", Some(cancel), || {
        engine.get_abs_pan_tilt()
    })?;
    let zoom = retry.run("get_abs_zoom", Some(cancel), || engine.get_abs_zoom())?;

    let host = position.to_host();
    Ok(PtzState {
        pan: host.pan,
        tilt: host.tilt,
        zoom,
        timestamp_us: monotonic_us(),
        cycle: 0,
    })
}
