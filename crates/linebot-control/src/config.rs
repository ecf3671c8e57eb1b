//! # 巡线配置
//!
//! TOML 配置文件，所有段和字段都可以省略（使用默认值）：
//!
//! ```toml
//! [speed]
//! base_speed = 10.0
//! max_speed = 100.0
//!
//! [pid]
//! kp = 5.0
//! ki = 0.0
//! kd = 5.0
//! setpoint = 4.5
//! min_output = -100.0
//! max_output = 100.0
//!
//! [sensor]
//! reversed = true
//! mode = "CAL"
//! frequency = "UNIVERSAL"
//!
//! [loop]
//! # period_ms = 10
//! # max_iterations = 1000
//! metrics_window_ms = 1000
//!
//! [display]
//! debug = true
//! inverted = true
//! ```
//!
//! 调参结果不会写回文件。

use crate::error::ConfigError;
use crate::pid::PidConfig;
use linebot_hal::{FrequencyMode, SensorMode};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// 完整配置
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowerConfig {
    pub speed: SpeedConfig,
    pub pid: PidConfig,
    pub sensor: SensorConfig,
    #[serde(rename = "loop")]
    pub loop_config: LoopConfig,
    pub display: DisplayConfig,
}

/// 速度设置（百分比）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedConfig {
    /// 直行基础速度
    pub base_speed: f64,
    /// 轮速上限（SpeedScaler 的天花板）
    pub max_speed: f64,
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            base_speed: 10.0,
            max_speed: 100.0,
        }
    }
}

/// 传感器设置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// 阵列反向安装
    pub reversed: bool,
    /// 启动时的采集模式
    pub mode: SensorMode,
    /// 工频抗干扰模式
    pub frequency: FrequencyMode,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            reversed: true,
            mode: SensorMode::Cal,
            frequency: FrequencyMode::Universal,
        }
    }
}

/// 控制循环配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// 固定周期（毫秒），`None` 表示尽可能快地运行
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_ms: Option<u64>,

    /// 最大迭代次数（`None` 表示直到收到终止信号）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u64>,

    /// 频率统计窗口（毫秒）
    pub metrics_window_ms: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            period_ms: None,
            max_iterations: None,
            metrics_window_ms: 1000,
        }
    }
}

impl LoopConfig {
    pub fn period(&self) -> Option<Duration> {
        self.period_ms.map(Duration::from_millis)
    }

    pub fn metrics_window(&self) -> Duration {
        Duration::from_millis(self.metrics_window_ms)
    }

    /// 校验循环参数
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "loop.period_ms must be > 0 (omit it to run unpaced)".into(),
            ));
        }
        if self.metrics_window_ms == 0 {
            return Err(ConfigError::Invalid(
                "loop.metrics_window_ms must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// 调试显示设置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// 启动时打开调试显示
    pub debug: bool,
    /// 柱状图左右镜像
    pub inverted: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            debug: true,
            inverted: true,
        }
    }
}

impl FollowerConfig {
    /// 从 TOML 字符串解析并校验
    ///
    /// 没有 `[pid]` 段时输出限制取 `±speed.max_speed`；
    /// 有 `[pid]` 段但省略某一侧限制时，该侧不限。
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(content)?;
        let has_pid_section = table.contains_key("pid");

        let mut config: FollowerConfig = toml::Value::Table(table).try_into()?;
        if !has_pid_section {
            let max_speed = config.speed.max_speed;
            config.pid = config
                .pid
                .with_output_limits(Some(-max_speed), Some(max_speed));
        }
        config.validate()?;
        Ok(config)
    }

    /// 序列化为 TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// 从文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// 保存配置到文件（自动创建父目录）
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = self.to_toml_string()?;

        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, content).map_err(io_err)
    }

    /// 校验参数
    pub fn validate(&self) -> Result<(), ConfigError> {
        let speed = &self.speed;
        if !speed.max_speed.is_finite() || speed.max_speed <= 0.0 || speed.max_speed > 100.0 {
            return Err(ConfigError::Invalid(format!(
                "speed.max_speed must be in (0, 100], got {}",
                speed.max_speed
            )));
        }
        if !speed.base_speed.is_finite() {
            return Err(ConfigError::Invalid("speed.base_speed must be finite".into()));
        }
        if speed.base_speed.abs() > speed.max_speed {
            return Err(ConfigError::Invalid(format!(
                "|speed.base_speed| ({}) must not exceed speed.max_speed ({})",
                speed.base_speed, speed.max_speed
            )));
        }

        let pid = &self.pid;
        for (name, value) in [
            ("kp", pid.kp),
            ("ki", pid.ki),
            ("kd", pid.kd),
            ("setpoint", pid.setpoint),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "pid.{} must be finite, got {}",
                    name, value
                )));
            }
        }
        if let (Some(min), Some(max)) = (pid.min_output, pid.max_output)
            && min > max
        {
            return Err(ConfigError::Invalid(format!(
                "pid.min_output ({}) must not exceed pid.max_output ({})",
                min, max
            )));
        }

        self.loop_config.validate()
    }
}
