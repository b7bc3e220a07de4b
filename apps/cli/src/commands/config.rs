//! 配置管理命令
//!
//! 查看、校验、初始化相机配置文件

use anyhow::{Context, Result};
use clap::Subcommand;
use std::fs;
use std::path::{Path, PathBuf};
use vcc4_driver::CameraConfig;

use crate::settings::{Overrides, default_config_file};

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 显示生效配置（TOML）
    Show,

    /// 校验配置文件
    Check,

    /// 显示配置文件路径
    Path,

    /// 写入默认配置文件
    Init {
        /// 覆盖已有文件
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommand {
    pub async fn execute(&self, overrides: &Overrides) -> Result<()> {
        match self {
            ConfigCommand::Show => {
                let config = overrides.resolve()?;
                print!("{}", config.to_toml_string()?);
            },
            ConfigCommand::Check => {
                overrides.resolve()?;
                match overrides.config_file()? {
                    Some(path) => println!("✅ 配置有效: {}", path.display()),
                    None => println!("✅ 未找到配置文件，使用内置默认值"),
                }
            },
            ConfigCommand::Path => {
                let path = target_path(overrides)?;
                let marker = if path.exists() { "" } else { "（不存在）" };
                println!("{}{}", path.display(), marker);
            },
            ConfigCommand::Init { force } => {
                let path = target_path(overrides)?;
                init_config(&path, *force, overrides.port.as_deref())?;
                println!("✅ 已写入默认配置: {}", path.display());
            },
        }
        Ok(())
    }
}

fn target_path(overrides: &Overrides) -> Result<PathBuf> {
    match &overrides.config_path {
        Some(path) => Ok(path.clone()),
        None => default_config_file(),
    }
}

/// 写入默认配置（可选覆盖串口）
fn init_config(path: &Path, force: bool, port: Option<&str>) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("配置文件已存在: {}（使用 --force 覆盖）", path.display());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("创建配置目录失败")?;
    }

    let mut config = CameraConfig::default();
    if let Some(port) = port {
        config.port = port.to_string();
    }
    let content = format!("# VC-C4 camera configuration\n\n{}", config.to_toml_string()?);
    fs::write(path, content).with_context(|| format!("写入配置文件失败: {}", path.display()))?;
    Ok(())
}
