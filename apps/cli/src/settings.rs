//! 配置解析
//!
//! 优先级：命令行 `--port` > `--config` 指定的文件 > 默认配置文件 > 内置默认值

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use vcc4_driver::CameraConfig;

/// 默认配置文件路径
pub fn default_config_file() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法确定配置目录"))?;
    path.push("vcc4");
    path.push("config.toml");
    Ok(path)
}

/// 命令行全局覆盖项
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_path: Option<PathBuf>,
    pub port: Option<String>,
}

impl Overrides {
    /// 实际使用的配置文件（不存在的默认文件返回 `None`）
    pub fn config_file(&self) -> Result<Option<PathBuf>> {
        if let Some(path) = &self.config_path {
            return Ok(Some(path.clone()));
        }
        let path = default_config_file()?;
        Ok(path.exists().then_some(path))
    }

    /// 解析生效配置并校验
    pub fn resolve(&self) -> Result<CameraConfig> {
        let mut config = match self.config_file()? {
            Some(path) => load(&path)?,
            None => CameraConfig::default(),
        };
        if let Some(port) = &self.port {
            config.port = port.clone();
        }
        config.validate().context("配置无效")?;
        Ok(config)
    }
}

fn load(path: &Path) -> Result<CameraConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
    CameraConfig::from_toml_str(&content)
        .with_context(|| format!("解析配置文件失败: {}", path.display()))
}
