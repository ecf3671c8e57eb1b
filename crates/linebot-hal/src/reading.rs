//! 传感器读数与模式定义
//!
//! [`SensorReading`] 每个控制周期由传感器驱动新产生一次，生成后不可变，
//! 在同一周期内用完即丢弃。

use crate::HalError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 光线阵列的通道数
pub const SENSOR_COUNT: usize = 8;

/// 一次传感器采样
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorReading {
    /// 结构上有效的采样
    Samples {
        /// 各通道的亮度值（越暗越小），按驱动返回的原始顺序
        values: [u16; SENSOR_COUNT],
        /// 当前模式下的最大亮度值（CAL = 100，RAW = 255）
        max_value: u16,
        /// 阵列是否反向安装（为 true 时处理前需要按下标逆序读取）
        reversed: bool,
    },

    /// 传输异常（IO 错误、字节数不足等）
    Invalid,
}

impl SensorReading {
    /// 创建正向安装的有效读数
    pub fn new(values: [u16; SENSOR_COUNT], max_value: u16) -> Self {
        SensorReading::Samples {
            values,
            max_value,
            reversed: false,
        }
    }

    /// 设置安装方向
    pub fn with_reversed(self, reversed: bool) -> Self {
        match self {
            SensorReading::Samples {
                values, max_value, ..
            } => SensorReading::Samples {
                values,
                max_value,
                reversed,
            },
            SensorReading::Invalid => SensorReading::Invalid,
        }
    }

    /// 是否为有效读数
    pub fn is_valid(&self) -> bool {
        matches!(self, SensorReading::Samples { .. })
    }

    /// 驱动返回的原始采样顺序
    pub fn raw_values(&self) -> Option<&[u16; SENSOR_COUNT]> {
        match self {
            SensorReading::Samples { values, .. } => Some(values),
            SensorReading::Invalid => None,
        }
    }

    /// 按物理方向排列的采样
    ///
    /// 反向安装时逆序，保证下标 0 始终对应机器人同一侧。
    pub fn oriented_values(&self) -> Option<[u16; SENSOR_COUNT]> {
        match *self {
            SensorReading::Samples {
                mut values,
                reversed,
                ..
            } => {
                if reversed {
                    values.reverse();
                }
                Some(values)
            },
            SensorReading::Invalid => None,
        }
    }

    /// 当前读数的最大亮度值
    pub fn max_value(&self) -> Option<u16> {
        match self {
            SensorReading::Samples { max_value, .. } => Some(*max_value),
            SensorReading::Invalid => None,
        }
    }

    /// 是否反向安装（无效读数返回 `None`）
    pub fn is_reversed(&self) -> Option<bool> {
        match self {
            SensorReading::Samples { reversed, .. } => Some(*reversed),
            SensorReading::Invalid => None,
        }
    }
}

/// 传感器采集模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SensorMode {
    /// 已校准的百分比值（0..=100）
    #[default]
    Cal,
    /// 原始 8 位值（0..=255）
    Raw,
}

impl SensorMode {
    /// 该模式下的最大亮度值
    pub fn max_value(self) -> u16 {
        match self {
            SensorMode::Cal => 100,
            SensorMode::Raw => 255,
        }
    }

    /// 驱动使用的模式名
    pub fn as_str(self) -> &'static str {
        match self {
            SensorMode::Cal => "CAL",
            SensorMode::Raw => "RAW",
        }
    }

    /// 切换到另一种模式
    pub fn toggled(self) -> Self {
        match self {
            SensorMode::Cal => SensorMode::Raw,
            SensorMode::Raw => SensorMode::Cal,
        }
    }
}

impl fmt::Display for SensorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorMode {
    type Err = HalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CAL" => Ok(SensorMode::Cal),
            "RAW" => Ok(SensorMode::Raw),
            _ => Err(HalError::InvalidMode(s.to_string())),
        }
    }
}

/// 工频抗干扰模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FrequencyMode {
    #[serde(rename = "50HZ")]
    Hz50,
    #[serde(rename = "60HZ")]
    Hz60,
    #[default]
    #[serde(rename = "UNIVERSAL")]
    Universal,
}

impl FrequencyMode {
    /// 写入驱动 `command` 属性的命令字
    pub fn command(self) -> &'static str {
        match self {
            FrequencyMode::Hz50 => "50HZ",
            FrequencyMode::Hz60 => "60HZ",
            FrequencyMode::Universal => "UNIVERSAL",
        }
    }
}

impl fmt::Display for FrequencyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command())
    }
}

impl FromStr for FrequencyMode {
    type Err = HalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "50HZ" => Ok(FrequencyMode::Hz50),
            "60HZ" => Ok(FrequencyMode::Hz60),
            "UNIVERSAL" => Ok(FrequencyMode::Universal),
            _ => Err(HalError::InvalidFrequency(s.to_string())),
        }
    }
}
