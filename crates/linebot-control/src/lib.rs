//! # Linebot Control - 巡线控制核心
//!
//! 8 路光线阵列 + 差速双轮机器人的闭环巡线控制：
//!
//! - [`estimator`] - 加权质心线位置估计（区分"读数无效"和"没有方向信息"）
//! - [`pid`] - 离散 PID（只钳位输出，积分不限幅）
//! - [`scaler`] - 等比例缩放左右轮速，保持转弯半径
//! - [`recovery`] - 丢线时按最后位置原地转向搜索
//! - [`control_loop`] - 状态机和每周期流程
//! - [`runner`] - 节拍、终止信号和关闭序列
//!
//! 硬件通过 `linebot-hal` 的 trait 接入（ev3dev sysfs、仿真器或测试替身）。
//!
//! # 示例
//!
//! ```rust,no_run
//! use linebot_control::prelude::*;
//! use linebot_hal::sim::{SimConfig, SimWorld, WheelSide};
//! use std::sync::atomic::AtomicBool;
//!
//! # fn main() -> Result<(), ControlError> {
//! let config = FollowerConfig::default();
//! let world = SimWorld::new(SimConfig::default());
//!
//! let mut control = ControlLoop::new(
//!     world.sensor(),
//!     world.motor(WheelSide::Left),
//!     world.motor(WheelSide::Right),
//!     &config,
//! )?;
//! control.start()?;
//! control.set_running(true)?;
//!
//! let terminate = AtomicBool::new(false);
//! let summary = run(&mut control, &terminate, &config.loop_config)?;
//! println!("{} ticks", summary.iterations);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod control_loop;
pub mod diagnostics;
pub mod error;
pub mod estimator;
pub mod metrics;
pub mod pid;
pub mod prelude;
pub mod recovery;
pub mod runner;
pub mod scaler;
pub mod tuning;

pub use config::{DisplayConfig, FollowerConfig, LoopConfig, SensorConfig, SpeedConfig};
pub use control_loop::{CalibrationStep, ControlLoop, TickOutcome};
pub use diagnostics::{Diagnostics, LoopState, TickSnapshot};
pub use error::{ConfigError, ControlError};
pub use estimator::{LinePosition, LinePositionEstimator};
pub use metrics::LoopMetrics;
pub use pid::{PidConfig, PidController, PidGains};
pub use recovery::{Pivot, RecoveryCommand, RecoveryPolicy};
pub use runner::{RunSummary, StopReason, run};
pub use scaler::{SpeedScaler, WheelCommand};
pub use tuning::{TuningCommand, TuningParseError};
