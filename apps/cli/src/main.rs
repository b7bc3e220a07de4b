//! # VC-C4 CLI
//!
//! Command-line interface for VC-C4 PTZ camera control.
//!
//! ```bash
//! # 查看生效配置
//! vcc4-cli config show
//!
//! # 移动到目标位置（内部：启动会话 -> 下发 -> 等待到位 -> 停止会话）
//! vcc4-cli --port /dev/ttyUSB0 move --pan 10 --tilt 5 --zoom 100
//!
//! # 持续打印状态，Ctrl-C 停止
//! vcc4-cli run --frequency 2
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod session;
mod settings;

use commands::{ConfigCommand, MoveCommand, PositionCommand, RunCommand};
use settings::Overrides;

/// VC-C4 CLI - 云台相机命令行工具
#[derive(Parser, Debug)]
#[command(name = "vcc4-cli")]
#[command(about = "Command-line interface for VC-C4 PTZ camera control", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件路径（默认 <config_dir>/vcc4/config.toml）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 串口设备（覆盖配置）
    #[arg(long, global = true)]
    port: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 启动会话并持续打印状态，Ctrl-C 停止
    Run {
        #[command(flatten)]
        args: RunCommand,
    },

    /// 移动到目标位置
    Move {
        #[command(flatten)]
        args: MoveCommand,
    },

    /// 查询当前位置
    Position {
        #[command(flatten)]
        args: PositionCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("vcc4=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let overrides = Overrides {
        config_path: cli.config,
        port: cli.port,
    };

    match cli.command {
        Commands::Config(cmd) => cmd.execute(&overrides).await,
        Commands::Run { args } => args.execute(&overrides.resolve()?).await,
        Commands::Move { args } => args.execute(&overrides.resolve()?).await,
        Commands::Position { args } => args.execute(&overrides.resolve()?).await,
    }
}
