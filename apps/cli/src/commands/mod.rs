//! 命令模块
//!
//! `run` 和 `sim` 共享同一套会话流程：加载配置 -> 命令行覆盖 -> 挂接控制台输入、
//! 播报和仪表盘 -> 注册 Ctrl+C -> 运行直到终止。

pub mod config;
pub mod estimate;
pub mod run;
pub mod sim;

pub use config::ConfigCommand;
pub use estimate::EstimateCommand;
pub use run::RunCommand;
pub use sim::SimCommand;

use crate::dashboard::TextDashboard;
use crate::notifier::ConsoleNotifier;
use anyhow::{Context, Result};
use clap::Args;
use linebot_control::{ControlLoop, FollowerConfig, RunSummary, run};
use linebot_hal::{LineSensor, Motor, console};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 控制循环参数（覆盖配置文件）
#[derive(Args, Debug, Clone, Default)]
pub struct LoopArgs {
    /// 启动后直接进入巡线状态（否则等待 `run` 命令）
    #[arg(long)]
    pub autostart: bool,

    /// 基础速度（百分比）
    #[arg(long)]
    pub base_speed: Option<f64>,

    /// 固定控制周期（毫秒）
    #[arg(long)]
    pub period_ms: Option<u64>,

    /// 最大迭代次数
    #[arg(long)]
    pub max_iterations: Option<u64>,

    /// 关闭调试仪表盘
    #[arg(long)]
    pub no_debug: bool,

    /// 不读取标准输入（无头运行）
    #[arg(long)]
    pub no_console: bool,
}

impl LoopArgs {
    /// 把命令行参数覆盖到配置上
    pub fn apply(&self, config: &mut FollowerConfig) {
        if let Some(base_speed) = self.base_speed {
            config.speed.base_speed = base_speed;
        }
        if let Some(period_ms) = self.period_ms {
            config.loop_config.period_ms = Some(period_ms);
        }
        if let Some(max_iterations) = self.max_iterations {
            config.loop_config.max_iterations = Some(max_iterations);
        }
        if self.no_debug {
            config.display.debug = false;
        }
    }
}

/// 注册 Ctrl+C 处理器，返回终止标志
fn install_termination_flag() -> Result<Arc<AtomicBool>> {
    let terminate = Arc::new(AtomicBool::new(false));
    let flag = terminate.clone();

    ctrlc::set_handler(move || {
        eprintln!("\nExiting...");
        flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl-C handler")?;

    Ok(terminate)
}

/// 挂接协作者并运行控制循环直到终止
pub fn drive<S, M>(
    control: ControlLoop<S, M>,
    config: &FollowerConfig,
    args: &LoopArgs,
) -> Result<RunSummary>
where
    S: LineSensor,
    M: Motor,
{
    let mut control = control
        .with_notifier(ConsoleNotifier::new())
        .with_diagnostics(TextDashboard::stdout(config.display.inverted));

    if !args.no_console {
        let (tuning, events) = console::stdin();
        control = control.with_tuning_channel(tuning).with_event_source(events);
        println!("💡 Commands: run | mode | cal | debug | p<kp> i<ki> d<kd> s<speed>");
    }

    let terminate = install_termination_flag()?;

    control.start().context("Failed to start line follower")?;
    if args.autostart {
        control.set_running(true)?;
    }

    let summary =
        run(&mut control, &terminate, &config.loop_config).context("Control loop failed")?;

    println!(
        "✅ {} ticks in {:.2}s ({:.1} Hz)",
        summary.iterations,
        summary.elapsed.as_secs_f64(),
        summary.average_frequency_hz()
    );
    Ok(summary)
}
