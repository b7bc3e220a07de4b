//! 位置查询命令

use anyhow::Result;
use clap::Args;
use std::time::Duration;
use vcc4_driver::CameraConfig;

use crate::session;

/// 位置查询命令参数
#[derive(Args, Debug)]
pub struct PositionCommand {
    /// 等待首个位置应答的超时（毫秒）
    #[arg(long, default_value_t = 3000)]
    pub timeout_ms: u64,

    /// 以 JSON 输出
    #[arg(long)]
    pub json: bool,
}

impl PositionCommand {
    /// 执行位置查询
    pub async fn execute(&self, config: &CameraConfig) -> Result<()> {
        let camera = session::start(config).await?;

        println!("⏳ 正在查询位置...");
        let result = session::first_state(&camera, Duration::from_millis(self.timeout_ms)).await;
        session::stop(camera).await?;
        let state = result?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&state)?);
        } else {
            println!("📊 云台位置:");
            println!("  水平: {:>8.3}°", state.pan);
            println!("  俯仰: {:>8.3}°", state.tilt);
            println!("  变焦: {:>8}", state.zoom);
        }
        Ok(())
    }
}
