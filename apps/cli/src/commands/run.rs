//! 硬件运行命令（ev3dev sysfs）

use super::{LoopArgs, drive};
use crate::commands::config::load_config;
use anyhow::{Context, Result};
use clap::Args;
use linebot_control::ControlLoop;
use linebot_hal::ev3dev::{LightArraySensor, SYSFS_ROOT, TachoMotor};
use std::path::{Path, PathBuf};

/// 硬件运行参数
#[derive(Args, Debug)]
pub struct RunCommand {
    /// sysfs 设备类目录
    #[arg(long, default_value = SYSFS_ROOT)]
    pub sysfs_root: PathBuf,

    /// 光线阵列所在的输入端口
    #[arg(long, default_value = "in1")]
    pub sensor_port: String,

    /// 左轮电机端口
    #[arg(long, default_value = "outA")]
    pub left_port: String,

    /// 右轮电机端口
    #[arg(long, default_value = "outB")]
    pub right_port: String,

    #[command(flatten)]
    pub loop_args: LoopArgs,
}

impl RunCommand {
    pub fn execute(&self, config_path: Option<&Path>) -> Result<()> {
        let mut config = load_config(config_path)?;
        self.loop_args.apply(&mut config);
        config.validate()?;

        println!("🔌 Opening devices under {}...", self.sysfs_root.display());

        // 传感器无法上线是唯一的致命错误
        let sensor = LightArraySensor::open(
            &self.sysfs_root,
            &self.sensor_port,
            config.sensor.reversed,
        )
        .with_context(|| format!("Light array sensor not available on {}", self.sensor_port))?;
        let left = TachoMotor::open(&self.sysfs_root, &self.left_port)
            .with_context(|| format!("Left motor not available on {}", self.left_port))?;
        let right = TachoMotor::open(&self.sysfs_root, &self.right_port)
            .with_context(|| format!("Right motor not available on {}", self.right_port))?;

        println!(
            "✅ Sensor {} | Motors {} / {}",
            sensor.path().display(),
            self.left_port,
            self.right_port
        );

        let control = ControlLoop::new(sensor, left, right, &config)?;
        drive(control, &config, &self.loop_args)?;
        Ok(())
    }
}
