//! # VC-C4 Driver
//!
//! 云台相机驱动层：
//! - 协议引擎（一次写入 + 一次应答的交互，错误码分类）
//! - 设备忙的有界重试
//! - 后台控制循环（目标差分下发、位置查询、状态发布）
//! - 会话句柄（启动/停止、无锁读写目标与状态）
//!
//! # Example
//!
//! ```no_run
//! use vcc4_driver::CameraBuilder;
//!
//! let mut camera = CameraBuilder::new().port("/dev/ttyS1").build().unwrap();
//! camera.submit_command(10.0, 0.0, 0);
//! std::thread::sleep(std::time::Duration::from_secs(1));
//! println!("{:?}", camera.read_state());
//! camera.stop_session().unwrap();
//! ```

mod builder;
mod camera;
pub mod cancel;
pub mod config;
pub mod engine;
mod error;
pub mod metrics;
pub mod pipeline;
pub mod retry;
pub mod state;

pub use builder::CameraBuilder;
pub use camera::{BoxedLink, PtzCamera};
pub use cancel::CancelSignal;
pub use config::{CameraConfig, RetryConfig};
pub use engine::{EngineConfig, ProtocolEngine};
pub use error::DriverError;
pub use metrics::{MetricsSnapshot, SessionMetrics};
pub use pipeline::{IssuedTargets, control_loop, run_cycle, setup_camera, teardown_camera};
pub use retry::RetryPolicy;
pub use state::*;

pub use vcc4_protocol::{DEG_PER_UNIT, DeviceErrorCode, DevicePanTilt, PanTilt, ZOOM_MAX};
pub use vcc4_serial::LinkAdapter;
