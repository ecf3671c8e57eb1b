//! 线位置估计
//!
//! 把一次 [`SensorReading`] 变成一个标量线位置（下标单位，1-based）。
//!
//! # 算法
//!
//! ```text
//! inverted[i]  = max_value - sample[i]          // 暗（低读数）权重大
//! weighted_sum = Σ inverted[i] * (i + 1)
//! total        = Σ inverted[i]
//! position     = weighted_sum / total           // ∈ [1, N]
//! ```
//!
//! 反向安装的阵列先逆序再加权，保证下标 1 始终对应机器人同一侧。
//!
//! # 三种结果
//!
//! - [`LinePosition::Detected`] - 正常的加权质心
//! - [`LinePosition::NoContrast`] - 读数有效但没有任何通道看到暗色（`total == 0`），数值为 `0.0`
//! - [`LinePosition::Unknown`] - 读数本身无效（传输异常）
//!
//! `NoContrast` 和 `Unknown` 必须区分：前者是"有效但没有方向信息"，后者是硬件传输故障，
//! 两者在控制循环中走不同的恢复路径。

use linebot_hal::{SENSOR_COUNT, SensorReading};

/// 无对比度时报告的位置值
pub const NO_CONTRAST_POSITION: f64 = 0.0;

/// 线位置估计结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LinePosition {
    /// 加权质心，位于 `[1, SENSOR_COUNT]`
    Detected(f64),
    /// 没有通道看到暗色（位置值为 `0.0`，没有方向信息）
    NoContrast,
    /// 读数无效
    Unknown,
}

impl LinePosition {
    /// 数值形式（`Unknown` 返回 `None`，`NoContrast` 返回 `0.0`）
    pub fn value(&self) -> Option<f64> {
        match self {
            LinePosition::Detected(p) => Some(*p),
            LinePosition::NoContrast => Some(NO_CONTRAST_POSITION),
            LinePosition::Unknown => None,
        }
    }

    /// 只有真正检测到线时才返回位置
    pub fn detected(&self) -> Option<f64> {
        match self {
            LinePosition::Detected(p) => Some(*p),
            LinePosition::NoContrast | LinePosition::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, LinePosition::Unknown)
    }
}

/// 线位置估计器
#[derive(Debug, Clone, Copy, Default)]
pub struct LinePositionEstimator;

impl LinePositionEstimator {
    pub fn new() -> Self {
        Self
    }

    /// 估计线位置
    pub fn estimate(&self, reading: &SensorReading) -> LinePosition {
        let (Some(values), Some(max_value)) = (reading.oriented_values(), reading.max_value())
        else {
            return LinePosition::Unknown;
        };

        let mut weighted_sum = 0.0;
        let mut total = 0.0;
        for (i, &sample) in values.iter().enumerate() {
            // 超过量程的读数按量程处理，权重不会为负
            let inverted = f64::from(max_value.saturating_sub(sample));
            weighted_sum += inverted * (i + 1) as f64;
            total += inverted;
        }

        if total == 0.0 {
            return LinePosition::NoContrast;
        }

        let position = weighted_sum / total;
        debug_assert!((1.0..=SENSOR_COUNT as f64).contains(&position));
        LinePosition::Detected(position)
    }
}
