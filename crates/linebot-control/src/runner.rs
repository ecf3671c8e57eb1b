//! Loop Runner - 控制循环运行器
//!
//! 反复调用 [`ControlLoop::tick`]，直到：
//! - 终止标志被置位（例如 Ctrl+C 处理函数）
//! - 达到 `max_iterations`
//! - `tick` 返回错误（电机指令失败）
//!
//! 无论哪种情况，返回前都会执行一次 [`ControlLoop::shutdown`]。
//!
//! 设置了 `period_ms` 时使用 `spin_sleep` 按固定周期节拍；否则尽可能快地运行。

use crate::config::LoopConfig;
use crate::control_loop::ControlLoop;
use crate::error::ControlError;
use linebot_hal::{LineSensor, Motor};
use spin_sleep::SpinSleeper;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// 循环结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// 收到终止信号
    Terminated,
    /// 达到最大迭代次数
    MaxIterations,
}

/// 运行摘要
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub iterations: u64,
    pub elapsed: Duration,
    pub reason: StopReason,
}

impl RunSummary {
    /// 整体平均频率
    pub fn average_frequency_hz(&self) -> f64 {
        self.iterations as f64 / self.elapsed.as_secs_f64().max(0.001)
    }
}

/// 运行控制循环直到终止
pub fn run<S, M>(
    control: &mut ControlLoop<S, M>,
    terminate: &AtomicBool,
    config: &LoopConfig,
) -> Result<RunSummary, ControlError>
where
    S: LineSensor,
    M: Motor,
{
    // ✅ 输入验证
    config.validate()?;

    let result = run_ticks(control, terminate, config);

    // 正常结束和出错都要执行关闭序列
    let shutdown = control.shutdown();

    let summary = result?;
    shutdown?;

    tracing::info!(
        "Control loop finished: {} iterations in {:.2}s ({:.1} Hz average, {:?})",
        summary.iterations,
        summary.elapsed.as_secs_f64(),
        summary.average_frequency_hz(),
        summary.reason
    );
    Ok(summary)
}

fn run_ticks<S, M>(
    control: &mut ControlLoop<S, M>,
    terminate: &AtomicBool,
    config: &LoopConfig,
) -> Result<RunSummary, ControlError>
where
    S: LineSensor,
    M: Motor,
{
    let period = config.period();
    let sleeper = SpinSleeper::default();

    let start = Instant::now();
    let mut next_deadline = start;
    let mut iterations: u64 = 0;

    let reason = loop {
        if terminate.load(Ordering::SeqCst) {
            tracing::info!("Termination requested");
            break StopReason::Terminated;
        }
        if let Some(max_iter) = config.max_iterations
            && iterations >= max_iter
        {
            break StopReason::MaxIterations;
        }

        if let Err(e) = control.tick() {
            tracing::error!("Control loop tick {} failed: {}", iterations, e);
            return Err(e);
        }
        iterations += 1;

        // 固定节拍：按截止时间休眠，落后时不追赶
        if let Some(period) = period {
            next_deadline += period;
            let now = Instant::now();
            if next_deadline > now {
                sleeper.sleep(next_deadline - now);
            } else {
                next_deadline = now;
            }
        }
    };

    Ok(RunSummary {
        iterations,
        elapsed: start.elapsed(),
        reason,
    })
}
