//! PID Controller - 比例-积分-微分控制器
//!
//! 按控制周期离散计算（不使用 `dt`，每个周期调用一次 `compute`）：
//!
//! ```text
//! error      = setpoint - current
//! integral  += error                  // 累积器本身不限幅、不衰减
//! output     = kp * error + ki * integral + kd * (error - previous_error)
//! output     = clamp(output, min_output, max_output)   // 任一侧可以不设限
//! ```
//!
//! # 运行时调参
//!
//! 增益、设定值和输出限制都放在 [`PidConfig`] 中，通过 [`PidController::config_mut`]
//! 修改，下一次 `compute` 立即生效。`reset()` 只清零积分和上次误差，不动配置。
//!
//! # 示例
//!
//! ```rust
//! use linebot_control::pid::{PidConfig, PidController};
//!
//! let mut pid = PidController::new(PidConfig::default().with_gains(1.0, 0.0, 0.0));
//! let correction = pid.compute(3.5);
//! assert_eq!(correction, 4.5 - 3.5);
//! ```

use serde::{Deserialize, Serialize};

/// PID 增益
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

/// PID 配置（运行时可变）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidConfig {
    /// 比例增益 (Kp)
    pub kp: f64,
    /// 积分增益 (Ki)
    pub ki: f64,
    /// 微分增益 (Kd)
    pub kd: f64,
    /// 设定值（机器人正对线时的线位置）
    pub setpoint: f64,
    /// 输出下限（`None` 表示不限）
    ///
    /// 配置文件中 `[pid]` 段存在但省略此项时为不限。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_output: Option<f64>,
    /// 输出上限（`None` 表示不限）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output: Option<f64>,
}

impl Default for PidConfig {
    /// 默认参数
    ///
    /// - Kp = 5.0, Ki = 0.0, Kd = 5.0
    /// - 设定值 = 4.5（8 路阵列的中心）
    /// - 输出限制 = ±100（默认最大轮速；从配置文件加载时取 `±speed.max_speed`）
    fn default() -> Self {
        Self {
            kp: 5.0,
            ki: 0.0,
            kd: 5.0,
            setpoint: 4.5,
            min_output: Some(-100.0),
            max_output: Some(100.0),
        }
    }
}

impl PidConfig {
    /// 设置 PID 增益
    pub fn with_gains(mut self, kp: f64, ki: f64, kd: f64) -> Self {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
        self
    }

    /// 设置设定值
    pub fn with_setpoint(mut self, setpoint: f64) -> Self {
        self.setpoint = setpoint;
        self
    }

    /// 设置输出限制
    pub fn with_output_limits(mut self, min_output: Option<f64>, max_output: Option<f64>) -> Self {
        self.min_output = min_output;
        self.max_output = max_output;
        self
    }

    /// 当前增益
    pub fn gains(&self) -> PidGains {
        PidGains {
            kp: self.kp,
            ki: self.ki,
            kd: self.kd,
        }
    }
}

/// PID 控制器
#[derive(Debug, Clone)]
pub struct PidController {
    config: PidConfig,

    /// 误差累积值
    integral: f64,

    /// 上一次的误差（用于计算微分）
    previous_error: f64,

    /// 上一次的输出（用于诊断）
    last_output: f64,
}

impl PidController {
    /// 创建新的 PID 控制器
    pub fn new(config: PidConfig) -> Self {
        Self {
            config,
            integral: 0.0,
            previous_error: 0.0,
            last_output: 0.0,
        }
    }

    /// 计算一个周期的修正量
    pub fn compute(&mut self, current_value: f64) -> f64 {
        let cfg = &self.config;

        // 1. 误差
        let error = cfg.setpoint - current_value;

        // 2. 比例项（P）
        let proportional = cfg.kp * error;

        // 3. 积分项（I）
        self.integral += error;
        let integral = cfg.ki * self.integral;

        // 4. 微分项（D）
        let derivative = cfg.kd * (error - self.previous_error);
        self.previous_error = error;

        // 5. 钳位输出
        let mut output = proportional + integral + derivative;
        if let Some(min) = cfg.min_output {
            output = output.max(min);
        }
        if let Some(max) = cfg.max_output {
            output = output.min(max);
        }

        self.last_output = output;
        output
    }

    /// 清零积分和上次误差（保留增益、设定值和输出限制）
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.previous_error = 0.0;
        self.last_output = 0.0;
    }

    /// 当前配置
    pub fn config(&self) -> &PidConfig {
        &self.config
    }

    /// 可变配置（调参入口）
    pub fn config_mut(&mut self) -> &mut PidConfig {
        &mut self.config
    }

    /// 更新设定值
    pub fn set_setpoint(&mut self, setpoint: f64) {
        self.config.setpoint = setpoint;
    }

    /// 更新输出限制
    pub fn set_output_limits(&mut self, min_output: Option<f64>, max_output: Option<f64>) {
        self.config.min_output = min_output;
        self.config.max_output = max_output;
    }

    /// 当前设定值
    pub fn setpoint(&self) -> f64 {
        self.config.setpoint
    }

    /// 当前增益
    pub fn gains(&self) -> PidGains {
        self.config.gains()
    }

    /// 当前误差累积值（用于调试和监控）
    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// 上一次的输出
    pub fn last_output(&self) -> f64 {
        self.last_output
    }
}
