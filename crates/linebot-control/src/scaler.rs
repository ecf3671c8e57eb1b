//! 轮速缩放
//!
//! 把左右轮的原始需求映射到 `[-max_speed, max_speed]`：
//! 峰值超限时两轮按同一比例缩小（保持转弯半径），
//! 然后各自钳位吸收浮点误差。

/// 左右轮速度指令（百分比）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelCommand {
    pub left: f64,
    pub right: f64,
}

impl WheelCommand {
    pub fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }
}

/// 轮速缩放器
#[derive(Debug, Clone)]
pub struct SpeedScaler {
    max_speed: f64,
    /// 最近一次使用的缩放系数（诊断用）
    scaling_factor: f64,
}

impl SpeedScaler {
    /// 创建缩放器
    ///
    /// `max_speed` 应为正数，由配置校验保证。
    pub fn new(max_speed: f64) -> Self {
        Self {
            max_speed,
            scaling_factor: 1.0,
        }
    }

    /// 缩放一对轮速需求
    pub fn scale(&mut self, left_demand: f64, right_demand: f64) -> WheelCommand {
        let max = self.max_speed;
        let peak = left_demand.abs().max(right_demand.abs());

        let (left, right) = if peak > max {
            self.scaling_factor = max / peak;
            (left_demand * max / peak, right_demand * max / peak)
        } else {
            self.scaling_factor = 1.0;
            (left_demand, right_demand)
        };

        WheelCommand {
            left: left.clamp(-max, max),
            right: right.clamp(-max, max),
        }
    }

    /// 最近一次使用的缩放系数
    pub fn scaling_factor(&self) -> f64 {
        self.scaling_factor
    }

    pub fn max_speed(&self) -> f64 {
        self.max_speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_preserves_ratio() {
        let mut scaler = SpeedScaler::new(100.0);
        let cmd = scaler.scale(120.0, 60.0);
        assert_eq!(cmd.left, 100.0);
        assert!((cmd.right - 50.0).abs() < 1e-12);
        assert!((scaler.scaling_factor() - 100.0 / 120.0).abs() < 1e-12);
    }

    #[test]
    fn test_scale_within_limits_is_unchanged() {
        let mut scaler = SpeedScaler::new(100.0);
        scaler.scale(200.0, 0.0);

        let cmd = scaler.scale(40.0, -40.0);
        assert_eq!(cmd, WheelCommand::new(40.0, -40.0));
        // 每次调用都会更新缩放系数
        assert_eq!(scaler.scaling_factor(), 1.0);
    }

    #[test]
    fn test_scale_negative_peak() {
        let mut scaler = SpeedScaler::new(100.0);
        let cmd = scaler.scale(-50.0, -250.0);
        assert!((cmd.left + 20.0).abs() < 1e-12);
        assert_eq!(cmd.right, -100.0);
        assert!((scaler.scaling_factor() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_scale_exact_ceiling() {
        let mut scaler = SpeedScaler::new(100.0);
        let cmd = scaler.scale(100.0, -100.0);
        assert_eq!(cmd, WheelCommand::new(100.0, -100.0));
        assert_eq!(scaler.scaling_factor(), 1.0);
    }
}
