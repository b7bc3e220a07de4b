//! 会话辅助
//!
//! 启动/停止会涉及数秒的上电等待，放到阻塞线程池执行，避免占用异步运行时。

use anyhow::{Context, Result};
use std::time::{Duration, Instant};
use vcc4_driver::{CameraConfig, DriverError, PtzCamera, PtzState};

/// 打开串口并启动会话
pub async fn start(config: &CameraConfig) -> Result<PtzCamera> {
    println!("🔌 连接到相机: {} @ {} baud", config.port, config.baud_rate);
    tracing::debug!(?config, "Starting camera session");
    let config = config.clone();
    let camera = tokio::task::spawn_blocking(move || {
        let mut camera = PtzCamera::new();
        camera.start_session(&config).map(|_| camera)
    })
    .await
    .context("会话启动线程异常退出")?
    .map_err(|e| describe_start_error(&e))?;
    println!("✅ 会话已启动");
    Ok(camera)
}

/// 停止会话（回中、变焦归零、断电）
pub async fn stop(mut camera: PtzCamera) -> Result<()> {
    println!("🛑 停止会话...");
    tokio::task::spawn_blocking(move || camera.stop_session())
        .await
        .context("会话停止线程异常退出")?
        .inspect_err(|e| tracing::warn!("Session stop reported an error: {}", e))?;
    println!("✅ 相机已复位并断电");
    Ok(())
}

/// 等待第一份有效状态
pub async fn first_state(camera: &PtzCamera, timeout: Duration) -> Result<PtzState> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(fault) = camera.fault() {
            anyhow::bail!("控制循环已终止: {}", fault);
        }
        let state = camera.read_state();
        if state.is_valid() {
            return Ok(state);
        }
        if Instant::now() >= deadline {
            anyhow::bail!("等待位置应答超时 ({} ms)", timeout.as_millis());
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

fn describe_start_error(err: &DriverError) -> anyhow::Error {
    match err {
        DriverError::NotAttached { reason } => {
            anyhow::anyhow!("相机未连接或无应答: {}（请检查串口与电源）", reason)
        },
        DriverError::DeviceBusyTimeout { operation, attempts } => {
            anyhow::anyhow!("相机持续忙: {} 重试 {} 次仍失败", operation, attempts)
        },
        other => anyhow::anyhow!("启动会话失败: {}", other),
    }
}
