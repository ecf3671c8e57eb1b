//! 配置管理命令
//!
//! 配置文件默认位于 `<config_dir>/linebot/config.toml`：
//! - Linux: `~/.config/linebot/config.toml`
//! - macOS: `~/Library/Application Support/linebot/config.toml`
//! - Windows: `%APPDATA%\linebot\config.toml`

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use linebot_control::FollowerConfig;
use std::path::{Path, PathBuf};

/// 默认配置文件路径
pub fn default_config_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir().context("Cannot determine the user config directory")?;
    path.push("linebot");
    path.push("config.toml");
    Ok(path)
}

/// 实际使用的配置文件路径
fn resolve_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => default_config_path(),
    }
}

/// 加载配置
///
/// - 显式指定的文件必须存在
/// - 默认路径下没有文件时使用默认配置
pub fn load_config(explicit: Option<&Path>) -> Result<FollowerConfig> {
    let path = resolve_path(explicit)?;

    if explicit.is_none() && !path.exists() {
        tracing::debug!("No config file at {}, using defaults", path.display());
        return Ok(FollowerConfig::default());
    }

    FollowerConfig::load_from_file(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 显示生效的配置
    Show,

    /// 写入默认配置
    Init {
        /// 覆盖已存在的文件
        #[arg(long)]
        force: bool,
    },

    /// 校验配置文件
    Check,

    /// 显示配置文件路径
    Path,
}

impl ConfigCommand {
    pub fn execute(self, explicit: Option<&Path>) -> Result<()> {
        match self {
            ConfigCommand::Show => {
                let config = load_config(explicit)?;
                print!("{}", config.to_toml_string()?);
                Ok(())
            },

            ConfigCommand::Init { force } => {
                let path = resolve_path(explicit)?;
                init_config(&path, force)?;
                println!("✅ Wrote default config to {}", path.display());
                Ok(())
            },

            ConfigCommand::Check => {
                let path = resolve_path(explicit)?;
                FollowerConfig::load_from_file(&path)
                    .with_context(|| format!("Invalid config {}", path.display()))?;
                println!("✅ {} is valid", path.display());
                Ok(())
            },

            ConfigCommand::Path => {
                println!("{}", resolve_path(explicit)?.display());
                Ok(())
            },
        }
    }
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    FollowerConfig::default()
        .save_to_file(path)
        .with_context(|| format!("Failed to write {}", path.display()))
}
