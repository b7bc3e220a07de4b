//! run 命令
//!
//! 启动会话并按固定频率打印状态，直到 Ctrl-C 或控制循环终止

use anyhow::{Context, Result};
use clap::Args;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use vcc4_driver::{CameraConfig, PtzCamera, SessionStatus};

use crate::session;

/// 持续运行命令参数
#[derive(Args, Debug)]
pub struct RunCommand {
    /// 初始水平角（度）
    #[arg(long, allow_negative_numbers = true)]
    pub pan: Option<f64>,

    /// 初始俯仰角（度）
    #[arg(long, allow_negative_numbers = true)]
    pub tilt: Option<f64>,

    /// 初始变焦（设备单位）
    #[arg(long)]
    pub zoom: Option<i32>,

    /// 状态打印频率（Hz）
    #[arg(short, long, default_value_t = 1.0)]
    pub frequency: f64,

    /// 以 JSON 行输出状态
    #[arg(long)]
    pub json: bool,
}

impl RunCommand {
    fn print_interval(&self) -> Result<Duration> {
        if !(self.frequency.is_finite() && self.frequency > 0.0) {
            anyhow::bail!("频率必须为正数: {}", self.frequency);
        }
        Ok(Duration::from_secs_f64(1.0 / self.frequency))
    }

    fn has_target(&self) -> bool {
        self.pan.is_some() || self.tilt.is_some() || self.zoom.is_some()
    }

    pub async fn execute(&self, config: &CameraConfig) -> Result<()> {
        let interval = self.print_interval()?;

        let running = Arc::new(AtomicBool::new(true));
        let handler_flag = running.clone();
        ctrlc::set_handler(move || {
            handler_flag.store(false, Ordering::SeqCst);
        })
        .context("注册 Ctrl-C 处理器失败")?;

        let camera = session::start(config).await?;
        if self.has_target() {
            camera.submit_command(
                self.pan.unwrap_or(0.0),
                self.tilt.unwrap_or(0.0),
                self.zoom.unwrap_or(0),
            );
        }
        println!("▶️  运行中（Ctrl-C 停止）");

        let outcome = self.monitor(&camera, &running, interval).await;
        let metrics = camera.metrics();
        session::stop(camera).await?;

        println!(
            "📊 周期: {}  发送: {}  应答: {} ({:.1}%)  忙: {}  错误: {}",
            metrics.cycles,
            metrics.frames_tx,
            metrics.frames_rx,
            metrics.answer_rate(),
            metrics.busy_answers,
            metrics.device_errors
        );
        if metrics.has_link_errors() {
            println!(
                "⚠️  链路异常: 超时 {} 次，畸形帧 {} 个",
                metrics.timeouts, metrics.malformed_frames
            );
        }
        outcome
    }

    async fn monitor(
        &self,
        camera: &PtzCamera,
        running: &AtomicBool,
        interval: Duration,
    ) -> Result<()> {
        let mut ticker = tokio::time::interval(interval);
        while running.load(Ordering::SeqCst) {
            ticker.tick().await;

            if camera.status() == SessionStatus::Terminated {
                let reason = camera
                    .fault()
                    .map(|fault| fault.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                anyhow::bail!("控制循环已终止: {}", reason);
            }

            let state = camera.read_state();
            if !state.is_valid() {
                continue;
            }
            if self.json {
                println!("{}", serde_json::to_string(&state)?);
            } else {
                println!(
                    "#{:<6} pan={:>8.3}° tilt={:>8.3}° zoom={:>5}",
                    state.cycle, state.pan, state.tilt, state.zoom
                );
            }
        }
        println!();
        println!("⏹️  收到 Ctrl-C");
        Ok(())
    }
}
