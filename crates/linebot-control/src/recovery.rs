//! 丢线恢复策略
//!
//! 当前周期没有可用的线位置时，根据最后一次看到线的位置原地转向搜索：
//!
//! - `last_known < setpoint` -> [`Pivot::Left`]：左轮正转、右轮反转
//! - 否则 -> [`Pivot::Right`]：左轮反转、右轮正转
//! - 从未捕获过线 -> 不发指令（电机保持上一条指令，不是停车）
//!
//! 这是开环搜索，不读取也不修改 PID 状态。

use crate::scaler::WheelCommand;
use std::fmt;

/// 原地转向方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pivot {
    Left,
    Right,
}

impl Pivot {
    /// 以 `base_speed` 原地转向的轮速指令
    pub fn wheel_command(self, base_speed: f64) -> WheelCommand {
        match self {
            Pivot::Left => WheelCommand::new(base_speed, -base_speed),
            Pivot::Right => WheelCommand::new(-base_speed, base_speed),
        }
    }
}

impl fmt::Display for Pivot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pivot::Left => f.write_str("left"),
            Pivot::Right => f.write_str("right"),
        }
    }
}

/// 恢复决策
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecoveryCommand {
    pub pivot: Pivot,
    pub command: WheelCommand,
}

/// 恢复策略状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecoveryState {
    /// 正常跟踪
    #[default]
    Tracking,
    /// 正在搜索（连续丢线周期数）
    Searching { pivot: Pivot, ticks: u64 },
}

/// 丢线恢复策略
#[derive(Debug, Clone, Default)]
pub struct RecoveryPolicy {
    state: RecoveryState,
}

impl RecoveryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// 纯决策：不改变内部状态
    pub fn decide(
        last_known_position: Option<f64>,
        setpoint: f64,
        base_speed: f64,
    ) -> Option<RecoveryCommand> {
        let last = last_known_position?;
        let pivot = if last < setpoint {
            Pivot::Left
        } else {
            Pivot::Right
        };
        Some(RecoveryCommand {
            pivot,
            command: pivot.wheel_command(base_speed),
        })
    }

    /// 丢线周期：决策并记录搜索状态
    pub fn on_line_lost(
        &mut self,
        last_known_position: Option<f64>,
        setpoint: f64,
        base_speed: f64,
    ) -> Option<RecoveryCommand> {
        let decision = Self::decide(last_known_position, setpoint, base_speed)?;

        self.state = match self.state {
            RecoveryState::Searching { pivot, ticks } if pivot == decision.pivot => {
                RecoveryState::Searching {
                    pivot,
                    ticks: ticks + 1,
                }
            },
            _ => {
                tracing::info!(
                    "Tracking lost. Trying to recover to the {} (last position {:.2})",
                    decision.pivot,
                    last_known_position.unwrap_or_default()
                );
                RecoveryState::Searching {
                    pivot: decision.pivot,
                    ticks: 1,
                }
            },
        };

        Some(decision)
    }

    /// 重新看到线
    pub fn on_line_found(&mut self) {
        if let RecoveryState::Searching { pivot, ticks } = self.state {
            tracing::info!("Line reacquired after {} ticks pivoting {}", ticks, pivot);
        }
        self.state = RecoveryState::Tracking;
    }

    /// 回到跟踪状态（不记录日志）
    pub fn reset(&mut self) {
        self.state = RecoveryState::Tracking;
    }

    pub fn state(&self) -> RecoveryState {
        self.state
    }

    pub fn is_searching(&self) -> bool {
        matches!(self.state, RecoveryState::Searching { .. })
    }
}
