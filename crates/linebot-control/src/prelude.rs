//! 常用类型
//!
//! ```rust
//! use linebot_control::prelude::*;
//! ```

pub use crate::config::{FollowerConfig, LoopConfig};
pub use crate::control_loop::{ControlLoop, TickOutcome};
pub use crate::diagnostics::{Diagnostics, LoopState, TickSnapshot};
pub use crate::error::{ConfigError, ControlError};
pub use crate::estimator::LinePosition;
pub use crate::runner::{RunSummary, run};

pub use linebot_hal::{ControlEvent, LineSensor, Motor, SensorMode, SensorReading};
