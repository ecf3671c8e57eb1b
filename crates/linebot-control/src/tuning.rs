//! 运行时调参命令
//!
//! 文本协议，每行一条命令：
//!
//! | 命令 | 作用 |
//! |------|------|
//! | `p<float>` | 设置 kp |
//! | `i<float>` | 设置 ki |
//! | `d<float>` | 设置 kd |
//! | `s<float>` | 设置 base_speed |
//!
//! 前后空白会被去掉。其他输入都是 [`TuningParseError`]，由控制循环记录并忽略。
//! `s<float>` 的绝对值不能超过 `max_speed`（见 [`TuningCommand::check_limits`]）。

use crate::pid::PidConfig;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 调参命令
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TuningCommand {
    SetKp(f64),
    SetKi(f64),
    SetKd(f64),
    SetBaseSpeed(f64),
}

/// 调参命令解析错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TuningParseError {
    #[error("empty tuning command")]
    Empty,

    #[error("unknown tuning command '{0}' (expected p, i, d or s)")]
    UnknownCommand(char),

    #[error("invalid value '{value}' for '{command}'")]
    InvalidValue { command: char, value: String },

    #[error("value for '{command}' must be finite")]
    NonFinite { command: char },

    #[error("value {value} for '{command}' exceeds the limit of ±{limit}")]
    OutOfRange { command: char, value: f64, limit: f64 },
}

impl TuningCommand {
    /// 命令前缀字符
    pub fn prefix(&self) -> char {
        match self {
            TuningCommand::SetKp(_) => 'p',
            TuningCommand::SetKi(_) => 'i',
            TuningCommand::SetKd(_) => 'd',
            TuningCommand::SetBaseSpeed(_) => 's',
        }
    }

    pub fn value(&self) -> f64 {
        match *self {
            TuningCommand::SetKp(v)
            | TuningCommand::SetKi(v)
            | TuningCommand::SetKd(v)
            | TuningCommand::SetBaseSpeed(v) => v,
        }
    }

    /// 检查取值范围
    ///
    /// 基础速度的绝对值不能超过 `max_speed`，否则丢线时的原地转向会越过轮速上限。
    pub fn check_limits(&self, max_speed: f64) -> Result<(), TuningParseError> {
        match *self {
            TuningCommand::SetBaseSpeed(v) if v.abs() > max_speed => {
                Err(TuningParseError::OutOfRange {
                    command: self.prefix(),
                    value: v,
                    limit: max_speed,
                })
            },
            _ => Ok(()),
        }
    }

    /// 应用到 PID 配置或基础速度
    pub fn apply(&self, pid: &mut PidConfig, base_speed: &mut f64) {
        match *self {
            TuningCommand::SetKp(v) => pid.kp = v,
            TuningCommand::SetKi(v) => pid.ki = v,
            TuningCommand::SetKd(v) => pid.kd = v,
            TuningCommand::SetBaseSpeed(v) => *base_speed = v,
        }
    }
}

impl FromStr for TuningCommand {
    type Err = TuningParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let command = chars.next().ok_or(TuningParseError::Empty)?;
        let raw = chars.as_str();

        let ctor: fn(f64) -> TuningCommand = match command {
            'p' => TuningCommand::SetKp,
            'i' => TuningCommand::SetKi,
            'd' => TuningCommand::SetKd,
            's' => TuningCommand::SetBaseSpeed,
            other => return Err(TuningParseError::UnknownCommand(other)),
        };

        let value: f64 = raw.parse().map_err(|_| TuningParseError::InvalidValue {
            command,
            value: raw.to_string(),
        })?;
        if !value.is_finite() {
            return Err(TuningParseError::NonFinite { command });
        }

        Ok(ctor(value))
    }
}

impl fmt::Display for TuningCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix(), self.value())
    }
}
