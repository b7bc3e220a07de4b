//! 模拟相机
//!
//! 挂载在 `MockLink` 上的应答器，按 VC-C4 协议应答下行帧并维护位置状态。
//! 可以为指定的下行帧前缀注入错误码、设置有限次数的忙应答或完全静默。
//!
//! 变焦应答使用 8 字节帧（2 位十六进制数据），因此测试中的变焦值不超过 0xFF。

#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use vcc4_driver::CameraConfig;
use vcc4_protocol::{DevicePanTilt, decode_hex_field, encode_hex4};
use vcc4_serial::{MockHandle, MockLink};

const CODE_NONE: u8 = 0x30;
pub const CODE_BUSY: u8 = 0x31;
pub const CODE_PARAM_ERROR: u8 = 0x35;
pub const CODE_MODE_ERROR: u8 = 0x39;

/// 模拟设备状态
#[derive(Debug, Clone)]
pub struct SimState {
    pub powered: bool,
    pub host_control: bool,
    pub tilt_range: Option<(u16, u16)>,
    pub position: DevicePanTilt,
    pub zoom: u16,
    pub silent: bool,
    /// (下行帧前缀（从操作码开始）, 错误码)
    errors: Vec<(Vec<u8>, u8)>,
    /// (操作码, 剩余忙应答次数)
    busy: Vec<(u8, u32)>,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            powered: false,
            host_control: false,
            tilt_range: None,
            position: DevicePanTilt::CENTER,
            zoom: 0,
            silent: false,
            errors: Vec::new(),
            busy: Vec::new(),
        }
    }
}

/// 模拟相机
#[derive(Clone, Default)]
pub struct SimulatedCamera {
    state: Arc<Mutex<SimState>>,
}

fn lock(state: &Mutex<SimState>) -> MutexGuard<'_, SimState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn command_answer(code: u8) -> Vec<u8> {
    vec![0xFE, 0x30, 0x30, code, 0x00, 0xEF]
}

impl SimulatedCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建连接到模拟相机的链路
    pub fn link(&self) -> (MockLink, MockHandle) {
        let state = self.state.clone();
        MockLink::with_responder(move |frame| respond(&mut lock(&state), frame))
    }

    /// 对以 `prefix`（从操作码开始）开头的下行帧持续应答错误码
    pub fn set_error(&self, prefix: &[u8], code: u8) {
        lock(&self.state).errors.push((prefix.to_vec(), code));
    }

    pub fn clear_errors(&self) {
        lock(&self.state).errors.clear();
    }

    /// 对指定操作码应答 `count` 次设备忙
    pub fn set_busy_for(&self, opcode: u8, count: u32) {
        lock(&self.state).busy.push((opcode, count));
    }

    /// 不再应答任何帧
    pub fn set_silent(&self, silent: bool) {
        lock(&self.state).silent = silent;
    }

    pub fn snapshot(&self) -> SimState {
        lock(&self.state).clone()
    }
}

fn respond(state: &mut SimState, frame: &[u8]) -> Vec<u8> {
    if state.silent || frame.len() < 6 {
        return Vec::new();
    }
    let opcode = frame[4];
    let body = &frame[4..frame.len() - 1];

    if let Some((_, code)) = state.errors.iter().find(|(prefix, _)| body.starts_with(prefix)) {
        return command_answer(*code);
    }
    if let Some(entry) = state
        .busy
        .iter_mut()
        .find(|(op, count)| *op == opcode && *count > 0)
    {
        entry.1 -= 1;
        return command_answer(CODE_BUSY);
    }

    match opcode {
        0xA0 => {
            state.powered = frame[5] == 0x31;
            command_answer(CODE_NONE)
        },
        0x90 => {
            state.host_control = true;
            command_answer(CODE_NONE)
        },
        0x64 => {
            let min = decode_hex_field(&frame[6..10]).unwrap_or(0);
            let max = decode_hex_field(&frame[10..14]).unwrap_or(0);
            state.tilt_range = Some((min, max));
            command_answer(CODE_NONE)
        },
        0x62 => {
            let pan = decode_hex_field(&frame[5..9]);
            let tilt = decode_hex_field(&frame[9..13]);
            match (pan, tilt) {
                (Ok(pan), Ok(tilt)) => {
                    state.position = DevicePanTilt { pan, tilt };
                    command_answer(CODE_NONE)
                },
                _ => command_answer(CODE_PARAM_ERROR),
            }
        },
        0xB3 => match decode_hex_field(&frame[5..9]) {
            Ok(zoom) => {
                state.zoom = zoom;
                command_answer(CODE_NONE)
            },
            Err(_) => command_answer(CODE_PARAM_ERROR),
        },
        0x63 => {
            let mut answer = vec![0xFE, 0x30, 0x30, CODE_NONE, 0x00];
            answer.extend_from_slice(&encode_hex4(state.position.pan));
            answer.extend_from_slice(&encode_hex4(state.position.tilt));
            answer.push(0xEF);
            answer
        },
        0xA4 => {
            let digits = encode_hex4(state.zoom.min(0xFF));
            vec![0xFE, 0x30, 0x30, CODE_NONE, 0x00, digits[2], digits[3], 0xEF]
        },
        _ => command_answer(CODE_MODE_ERROR),
    }
}

/// 测试用快速配置（无稳定等待、短周期、快速重试）
pub fn fast_config() -> CameraConfig {
    let mut config = CameraConfig {
        port: "mock".into(),
        settle_delay_ms: 0,
        probe_timeout_ms: 10,
        read_timeout_ms: 10,
        cycle_interval_ms: 5,
        teardown_delay_ms: 0,
        ..Default::default()
    };
    config.retry.max_attempts = 3;
    config.retry.initial_backoff_ms = 1;
    config.retry.max_backoff_ms = 2;
    config
}

/// 所有下行帧的操作码
pub fn opcodes(handle: &MockHandle) -> Vec<u8> {
    handle.writes().iter().map(|w| w[4]).collect()
}

/// 轮询等待条件成立
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    condition()
}

/// 初始化测试日志（重复调用无副作用）
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("vcc4=debug")
        .try_init();
}
