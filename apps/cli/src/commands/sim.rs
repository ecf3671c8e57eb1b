//! 仿真运行命令

use super::{LoopArgs, drive};
use crate::commands::config::load_config;
use anyhow::Result;
use clap::Args;
use linebot_control::{ControlLoop, FollowerConfig};
use linebot_hal::sim::{Pose, SimConfig, SimWorld, WheelSide};
use std::path::Path;

/// 仿真参数
#[derive(Args, Debug)]
pub struct SimCommand {
    /// 仿真周期数（`--max-iterations` 优先）
    #[arg(long, default_value_t = 4000)]
    pub ticks: u64,

    /// 线的正弦振幅（m），0 为直线
    #[arg(long, default_value_t = 0.0)]
    pub amplitude: f64,

    /// 线的正弦波长参数（m）
    #[arg(long, default_value_t = 0.5)]
    pub wavelength: f64,

    /// 初始横向偏移（m，正值在线的左侧）
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub offset: f64,

    /// 采样噪声（占满量程的比例）
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    /// 每次读取无效的概率
    #[arg(long, default_value_t = 0.0)]
    pub invalid_probability: f64,

    /// 随机数种子
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// 按仿真步长实时运行
    #[arg(long)]
    pub realtime: bool,

    #[command(flatten)]
    pub loop_args: LoopArgs,
}

impl SimCommand {
    /// 由命令行参数构造仿真参数
    pub fn sim_config(&self, config: &FollowerConfig) -> SimConfig {
        SimConfig {
            amplitude: self.amplitude,
            wavelength: self.wavelength,
            noise: self.noise,
            invalid_probability: self.invalid_probability,
            seed: self.seed,
            reversed: config.sensor.reversed,
            initial_pose: Pose {
                x: 0.0,
                y: self.offset,
                heading: 0.0,
            },
            ..SimConfig::default()
        }
    }

    pub fn execute(&self, config_path: Option<&Path>) -> Result<()> {
        let mut config = load_config(config_path)?;
        config.loop_config.max_iterations = Some(self.ticks);
        self.loop_args.apply(&mut config);

        let sim = self.sim_config(&config);
        if self.realtime && config.loop_config.period_ms.is_none() {
            config.loop_config.period_ms = Some(sim.step.as_millis().max(1) as u64);
        }
        config.validate()?;

        let world = SimWorld::new(sim);
        println!(
            "🤖 Simulating {} ticks (amplitude {} m, offset {} m)",
            config.loop_config.max_iterations.unwrap_or_default(),
            self.amplitude,
            self.offset
        );

        let control = ControlLoop::new(
            world.sensor(),
            world.motor(WheelSide::Left),
            world.motor(WheelSide::Right),
            &config,
        )?;
        drive(control, &config, &self.loop_args)?;

        let pose = world.pose();
        println!(
            "📍 Final pose: x={:.3} m, y={:.4} m, heading={:.3} rad | lateral error {:.4} m | sim time {:.2}s",
            pose.x,
            pose.y,
            pose.heading,
            world.lateral_error(),
            world.elapsed().as_secs_f64()
        );
        Ok(())
    }
}
