//! 仿真世界状态与运动学

use crate::{SENSOR_COUNT, SensorMode};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;

/// 机器人位姿（米 / 弧度）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
}

/// 仿真参数
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// 轮距（m）
    pub wheel_base: f64,
    /// 100% 指令对应的轮速（m/s）
    pub max_wheel_speed: f64,
    /// 每次传感器读取推进的仿真时间
    pub step: Duration,
    /// 传感器横杆到车轴的距离（m）
    pub sensor_offset: f64,
    /// 相邻通道间距（m）
    pub sensor_spacing: f64,
    /// 线宽（m）
    pub line_width: f64,
    /// 线边缘的模糊带宽度（m）
    pub line_edge: f64,
    /// 线的正弦振幅（m），0 为直线
    pub amplitude: f64,
    /// 线的正弦波长参数（m）
    pub wavelength: f64,
    /// 线的反射率（0..1，地面为 1）
    pub line_reflectance: f64,
    /// 阵列是否反向安装
    pub reversed: bool,
    /// 均匀噪声幅度（占满量程的比例）
    pub noise: f64,
    /// 每次读取返回无效数据的概率
    pub invalid_probability: f64,
    /// 随机数种子
    pub seed: u64,
    /// 初始位姿
    pub initial_pose: Pose,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            wheel_base: 0.12,
            max_wheel_speed: 0.5,
            step: Duration::from_millis(5),
            sensor_offset: 0.08,
            sensor_spacing: 0.008,
            line_width: 0.02,
            line_edge: 0.004,
            amplitude: 0.0,
            wavelength: 0.5,
            line_reflectance: 0.1,
            reversed: true,
            noise: 0.0,
            invalid_probability: 0.0,
            seed: 0,
            initial_pose: Pose::default(),
        }
    }
}

/// 可变的世界状态
#[derive(Debug)]
pub(crate) struct WorldState {
    pub pose: Pose,
    /// 左右轮指令（百分比）
    pub wheels: [f64; 2],
    pub elapsed: Duration,
    pub mode: SensorMode,
    pub sleeping: bool,
    pub rng: StdRng,
}

/// 仿真世界（传感器和电机共享同一个实例）
#[derive(Debug, Clone)]
pub struct SimWorld {
    pub(crate) config: Arc<SimConfig>,
    pub(crate) state: Arc<Mutex<WorldState>>,
}

impl SimWorld {
    /// 创建仿真世界
    pub fn new(config: SimConfig) -> Self {
        let state = WorldState {
            pose: config.initial_pose,
            wheels: [0.0; 2],
            elapsed: Duration::ZERO,
            mode: SensorMode::Cal,
            sleeping: false,
            rng: StdRng::seed_from_u64(config.seed),
        };
        Self {
            config: Arc::new(config),
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// 仿真参数
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// 当前位姿
    pub fn pose(&self) -> Pose {
        self.state.lock().pose
    }

    /// 已推进的仿真时间
    pub fn elapsed(&self) -> Duration {
        self.state.lock().elapsed
    }

    /// 当前左右轮指令（百分比）
    pub fn wheel_commands(&self) -> (f64, f64) {
        let wheels = self.state.lock().wheels;
        (wheels[0], wheels[1])
    }

    /// 线在 `x` 处的横坐标
    pub fn line_y(&self, x: f64) -> f64 {
        if self.config.amplitude == 0.0 || self.config.wavelength <= 0.0 {
            0.0
        } else {
            self.config.amplitude * (x / self.config.wavelength).sin()
        }
    }

    /// 车轴中心相对线的横向偏差（m，正值为在线的左侧）
    pub fn lateral_error(&self) -> f64 {
        let pose = self.pose();
        pose.y - self.line_y(pose.x)
    }

    /// 推进一个仿真步长
    pub(crate) fn advance(&self, state: &mut WorldState) {
        let cfg = &*self.config;
        let dt = cfg.step.as_secs_f64();

        let v_left = state.wheels[0] / 100.0 * cfg.max_wheel_speed;
        let v_right = state.wheels[1] / 100.0 * cfg.max_wheel_speed;
        let v = (v_left + v_right) / 2.0;
        let omega = (v_right - v_left) / cfg.wheel_base;

        let pose = &mut state.pose;
        // 中点法积分，小步长下足够精确
        let mid_heading = pose.heading + omega * dt / 2.0;
        pose.x += v * mid_heading.cos() * dt;
        pose.y += v * mid_heading.sin() * dt;
        pose.heading += omega * dt;
        state.elapsed += cfg.step;
    }

    /// 按物理顺序（右 -> 左）采样 8 个通道
    pub(crate) fn sample(&self, state: &mut WorldState) -> [u16; SENSOR_COUNT] {
        let cfg = &*self.config;
        let max_value = f64::from(state.mode.max_value());
        let Pose { x, y, heading } = state.pose;
        let (sin, cos) = heading.sin_cos();

        let center_x = x + cfg.sensor_offset * cos;
        let center_y = y + cfg.sensor_offset * sin;

        let mut values = [0u16; SENSOR_COUNT];
        for (k, value) in values.iter_mut().enumerate() {
            let lateral = (k as f64 - (SENSOR_COUNT as f64 - 1.0) / 2.0) * cfg.sensor_spacing;
            let ex = center_x - lateral * sin;
            let ey = center_y + lateral * cos;

            let distance = (ey - self.line_y(ex)).abs();
            let reflectance = 1.0 - (1.0 - cfg.line_reflectance) * self.darkness(distance);

            let mut raw = reflectance * max_value;
            if cfg.noise > 0.0 {
                raw += state.rng.gen_range(-1.0..=1.0) * cfg.noise * max_value;
            }
            *value = raw.clamp(0.0, max_value).round() as u16;
        }
        values
    }

    /// 距线中心 `distance` 处的暗度（0..=1）
    fn darkness(&self, distance: f64) -> f64 {
        let half = self.config.line_width / 2.0;
        let edge = self.config.line_edge;
        if distance <= half {
            1.0
        } else if edge > 0.0 && distance < half + edge {
            1.0 - (distance - half) / edge
        } else {
            0.0
        }
    }
}
