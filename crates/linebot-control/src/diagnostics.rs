//! 诊断输出
//!
//! 调试模式打开且挂接了 [`Diagnostics`] 时，控制循环每个周期发布一个 [`TickSnapshot`]。
//! 快照只读，挂不挂接诊断都不影响控制路径。

use crate::estimator::LinePosition;
use crate::pid::PidGains;
use linebot_hal::{SENSOR_COUNT, SensorMode};
use std::fmt;

/// 运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    /// 电机刹车，不跟线
    #[default]
    Stopped,
    /// 电机由控制律驱动
    Running,
}

impl LoopState {
    pub fn is_running(self) -> bool {
        matches!(self, LoopState::Running)
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopState::Stopped => f.write_str("Stop"),
            LoopState::Running => f.write_str("Run"),
        }
    }
}

/// 单个周期的诊断快照
#[derive(Debug, Clone, PartialEq)]
pub struct TickSnapshot {
    /// 驱动输出顺序的原始采样（无效读数为 `None`）
    pub samples: Option<[u16; SENSOR_COUNT]>,
    pub max_value: Option<u16>,
    /// 阵列是否反向安装
    pub reversed: bool,
    pub position: LinePosition,
    pub mode: SensorMode,
    pub state: LoopState,
    pub gains: PidGains,
    pub base_speed: f64,
    /// 最近一个完整窗口的循环频率
    pub frequency_hz: Option<f64>,
    pub scaling_factor: f64,
    /// 测得轮速（左，右），读取失败为 `None`
    pub wheel_speeds: (Option<f64>, Option<f64>),
}

/// 诊断输出协作者
pub trait Diagnostics {
    /// 发布一个周期的快照
    fn publish(&mut self, snapshot: &TickSnapshot);

    /// 关闭序列中调用一次
    fn on_shutdown(&mut self, _final_snapshot: &TickSnapshot) {}
}
