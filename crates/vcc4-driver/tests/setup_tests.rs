//! 会话初始化测试

mod common;

use common::*;
use vcc4_driver::{CameraBuilder, DriverError, PtzCamera, SessionStatus};
use vcc4_protocol::default_tilt_range;

#[test]
fn test_setup_sequence_on_healthy_device() {
    init_tracing();
    let sim = SimulatedCamera::new();
    let (link, handle) = sim.link();

    let mut camera = PtzCamera::new();
    camera.start_session_with_link(link, &fast_config()).unwrap();

    let ops = opcodes(&handle);
    assert_eq!(&ops[..5], &[0xA0, 0xA0, 0x90, 0x63, 0x64]);
    let writes = handle.writes();
    assert_eq!(writes[0][5], 0x30, "first power command must be off");
    assert_eq!(writes[1][5], 0x31, "second power command must be on");

    let device = sim.snapshot();
    assert!(device.powered);
    assert!(device.host_control);
    assert_eq!(device.tilt_range, Some(default_tilt_range()));

    camera.stop_session().unwrap();
}

/// 上电应答模式错误视为已上电
#[test]
fn test_power_on_mode_error_tolerated() {
    let sim = SimulatedCamera::new();
    sim.set_error(&[0xA0, 0x31], CODE_MODE_ERROR);
    let (link, _handle) = sim.link();

    let mut camera = PtzCamera::new();
    camera.start_session_with_link(link, &fast_config()).unwrap();
    assert_eq!(camera.status(), SessionStatus::Running);

    camera.stop_session().unwrap();
}

/// 初始断电失败被忽略
#[test]
fn test_initial_power_off_failure_ignored() {
    let sim = SimulatedCamera::new();
    sim.set_error(&[0xA0, 0x30], CODE_PARAM_ERROR);
    let (link, _handle) = sim.link();

    let mut camera = PtzCamera::new();
    camera.start_session_with_link(link, &fast_config()).unwrap();
    assert_eq!(camera.status(), SessionStatus::Running);

    sim.clear_errors();
    camera.stop_session().unwrap();
}

/// 初始断电应答忙时同样重试
#[test]
fn test_initial_power_off_busy_is_retried() {
    let sim = SimulatedCamera::new();
    sim.set_busy_for(0xA0, 2);
    let (link, handle) = sim.link();

    let mut camera = PtzCamera::new();
    camera.start_session_with_link(link, &fast_config()).unwrap();

    let writes = handle.writes();
    let power_args: Vec<u8> = writes.iter().take(4).map(|w| w[5]).collect();
    assert_eq!(power_args, vec![0x30, 0x30, 0x30, 0x31]);
    assert_eq!(&opcodes(&handle)[3..7], &[0xA0, 0x90, 0x63, 0x64]);
    assert!(camera.metrics().busy_answers >= 2);

    camera.stop_session().unwrap();
}

/// 持续忙：重试耗尽后启动失败
#[test]
fn test_persistently_busy_device_fails_start() {
    let sim = SimulatedCamera::new();
    sim.set_error(&[0xA0, 0x31], CODE_BUSY);
    let (link, handle) = sim.link();

    let mut camera = PtzCamera::new();
    let err = camera
        .start_session_with_link(link, &fast_config())
        .unwrap_err();
    assert!(matches!(
        err,
        DriverError::DeviceBusyTimeout {
            operation: "power_on",
            attempts: 3
        }
    ));
    assert_eq!(camera.status(), SessionStatus::Idle);

    // 断电 + 3 次上电 + 失败后的断电
    let ops = opcodes(&handle);
    assert_eq!(ops, vec![0xA0; 5]);
    assert_eq!(handle.writes().last().unwrap()[5], 0x30);
}

/// 无应答：相机未连接
#[test]
fn test_silent_device_not_attached() {
    let sim = SimulatedCamera::new();
    sim.set_silent(true);
    let (link, handle) = sim.link();

    let mut camera = PtzCamera::new();
    let err = camera
        .start_session_with_link(link, &fast_config())
        .unwrap_err();
    assert!(
        matches!(err, DriverError::NotAttached { .. }),
        "unexpected error: {}",
        err
    );
    assert_eq!(camera.status(), SessionStatus::Idle);
    assert!(!camera.is_running());
    assert!(handle.write_count() >= 2);
}

/// 探测返回非忙错误：相机未连接
#[test]
fn test_probe_error_not_attached() {
    let sim = SimulatedCamera::new();
    sim.set_error(&[0x63], CODE_MODE_ERROR);
    let (link, handle) = sim.link();

    let mut camera = PtzCamera::new();
    let err = camera
        .start_session_with_link(link, &fast_config())
        .unwrap_err();
    assert!(matches!(err, DriverError::NotAttached { .. }));

    // 探测之后不再设置俯仰范围，只尽力断电
    let ops = opcodes(&handle);
    assert!(!ops.contains(&0x64));
    assert_eq!(*ops.last().unwrap(), 0xA0);
    assert!(!sim.snapshot().powered);
}

/// 控制模式参数错误直接中止启动
#[test]
fn test_control_mode_error_aborts_start() {
    let sim = SimulatedCamera::new();
    sim.set_error(&[0x90], CODE_PARAM_ERROR);
    let (link, _handle) = sim.link();

    let err = CameraBuilder::with_config(fast_config())
        .build_with_link(link)
        .err()
        .expect("start should fail");
    assert!(matches!(
        err,
        DriverError::DeviceParamError {
            operation: "set_control_mode"
        }
    ));
}

#[test]
fn test_builder_starts_session() {
    let sim = SimulatedCamera::new();
    let (link, _handle) = sim.link();

    let mut camera = CameraBuilder::with_config(fast_config())
        .build_with_link(link)
        .unwrap();
    assert_eq!(camera.status(), SessionStatus::Running);
    camera.stop_session().unwrap();
}
