//! 离散输入事件

use std::fmt;
use std::str::FromStr;

/// 控制事件（按键等，已在外部去抖，每次按下只消费一次）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlEvent {
    /// 运行 / 停止切换
    ToggleRun,
    /// CAL / RAW 模式切换
    ToggleSensorMode,
    /// 手动校准（两步：白 -> 黑）
    Calibrate,
    /// 调试显示开关
    ToggleDebug,
}

impl ControlEvent {
    /// 控制台关键字
    pub fn keyword(self) -> &'static str {
        match self {
            ControlEvent::ToggleRun => "run",
            ControlEvent::ToggleSensorMode => "mode",
            ControlEvent::Calibrate => "cal",
            ControlEvent::ToggleDebug => "debug",
        }
    }
}

impl fmt::Display for ControlEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for ControlEvent {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "run" => Ok(ControlEvent::ToggleRun),
            "mode" => Ok(ControlEvent::ToggleSensorMode),
            "cal" => Ok(ControlEvent::Calibrate),
            "debug" => Ok(ControlEvent::ToggleDebug),
            _ => Err(()),
        }
    }
}
