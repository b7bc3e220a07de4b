//! 移动命令
//!
//! 启动会话，下发目标姿态，等待回读位置到位后复位并断电

use anyhow::Result;
use clap::Args;
use std::time::{Duration, Instant};
use vcc4_driver::{CameraConfig, DEG_PER_UNIT, PtzCamera, PtzCommand, PtzState};

use crate::session;

/// 到位判定的变焦容差（设备单位）
const ZOOM_TOLERANCE: u16 = 1;

/// 移动命令参数
#[derive(Args, Debug)]
pub struct MoveCommand {
    /// 水平角（度，逆时针为正，[-98, 98]）
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub pan: f64,

    /// 俯仰角（度，[-30, 88]）
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub tilt: f64,

    /// 变焦（设备单位，[0, 2140]）
    #[arg(long, default_value_t = 0)]
    pub zoom: i32,

    /// 等待到位的超时（毫秒）
    #[arg(long, default_value_t = 10_000)]
    pub timeout_ms: u64,
}

impl MoveCommand {
    /// 目标指令（越界值已钳制）
    pub fn target(&self) -> PtzCommand {
        PtzCommand::new(self.pan, self.tilt, self.zoom)
    }

    /// 执行移动
    pub async fn execute(&self, config: &CameraConfig) -> Result<()> {
        let target = self.target();
        let clamped = target.pan() != self.pan
            || target.tilt() != self.tilt
            || i32::from(target.zoom()) != self.zoom;
        if clamped {
            println!(
                "⚠️  目标超出范围，已钳制为: pan={:.3}° tilt={:.3}° zoom={}",
                target.pan(),
                target.tilt(),
                target.zoom()
            );
        }

        let camera = session::start(config).await?;
        camera.submit_command(target.pan(), target.tilt(), i32::from(target.zoom()));
        println!(
            "🎯 目标: pan={:.3}° tilt={:.3}° zoom={}",
            target.pan(),
            target.tilt(),
            target.zoom()
        );

        let timeout = Duration::from_millis(self.timeout_ms);
        let result = wait_for_target(&camera, &target, timeout).await;
        session::stop(camera).await?;
        let state = result?;

        println!(
            "✅ 已到位: pan={:.3}° tilt={:.3}° zoom={}",
            state.pan, state.tilt, state.zoom
        );
        Ok(())
    }
}

async fn wait_for_target(
    camera: &PtzCamera,
    target: &PtzCommand,
    timeout: Duration,
) -> Result<PtzState> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(fault) = camera.fault() {
            anyhow::bail!("控制循环已终止: {}", fault);
        }
        let state = camera.read_state();
        if state.is_valid() && state.is_near(target, DEG_PER_UNIT, ZOOM_TOLERANCE) {
            return Ok(state);
        }
        if Instant::now() >= deadline {
            anyhow::bail!(
                "等待到位超时 ({} ms)，当前: pan={:.3}° tilt={:.3}° zoom={}",
                timeout.as_millis(),
                state.pan,
                state.tilt,
                state.zoom
            );
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
