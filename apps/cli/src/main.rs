//! # Linebot CLI
//!
//! 巡线机器人命令行工具。
//!
//! ```bash
//! # 生成默认配置
//! linebot-cli config init
//!
//! # 在 EV3 上运行（ev3dev sysfs）
//! linebot-cli run --sensor-port in1 --left-port outA --right-port outB
//!
//! # 无硬件仿真
//! linebot-cli sim --ticks 4000 --amplitude 0.02 --autostart
//!
//! # 离线计算一次线位置
//! linebot-cli estimate 10 10 10 10 90 90 90 90
//! ```
//!
//! 运行时在标准输入中输入：
//! - `run` / `mode` / `cal` / `debug` - 运行切换 / CAL-RAW 切换 / 手动校准 / 调试显示
//! - `p<float>` / `i<float>` / `d<float>` / `s<float>` - 调整 kp / ki / kd / 基础速度

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod dashboard;
mod notifier;

use commands::{ConfigCommand, EstimateCommand, RunCommand, SimCommand};

/// 默认日志级别（可用 RUST_LOG 覆盖）
const DEFAULT_LOG_FILTER: &str = "linebot_cli=info,linebot_control=info,linebot_hal=info";

/// Linebot CLI - 巡线机器人命令行工具
#[derive(Parser, Debug)]
#[command(name = "linebot-cli")]
#[command(about = "Line-following robot controller (ev3dev or simulator)", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件路径（默认 <config_dir>/linebot/config.toml）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 在 ev3dev 硬件上运行
    Run {
        #[command(flatten)]
        args: RunCommand,
    },

    /// 在仿真器中运行
    Sim {
        #[command(flatten)]
        args: SimCommand,
    },

    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 离线计算一次线位置和轮速
    Estimate {
        #[command(flatten)]
        args: EstimateCommand,
    },
}

fn main() -> Result<()> {
    // 初始化日志（写到 stderr，stdout 留给仪表盘）
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Run { args } => args.execute(config_path),
        Commands::Sim { args } => args.execute(config_path),
        Commands::Config(cmd) => cmd.execute(config_path),
        Commands::Estimate { args } => args.execute(config_path),
    }
}
