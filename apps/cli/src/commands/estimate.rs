//! 离线估计命令
//!
//! 对一次读数执行估计器、一步 PID 和轮速缩放，并打印仪表盘。

use crate::commands::config::load_config;
use crate::dashboard;
use anyhow::{Result, ensure};
use clap::Args;
use linebot_control::{
    LinePositionEstimator, LoopState, PidController, SpeedScaler, TickSnapshot,
};
use linebot_hal::{SENSOR_COUNT, SensorReading};
use std::path::Path;

/// 离线估计参数
#[derive(Args, Debug)]
pub struct EstimateCommand {
    /// 8 个通道的读数（驱动输出顺序）
    #[arg(num_args = SENSOR_COUNT, required = true)]
    pub samples: Vec<u16>,

    /// 满量程（CAL = 100，RAW = 255）
    #[arg(long, default_value_t = 100)]
    pub max_value: u16,

    /// 阵列反向安装（默认取配置文件）
    #[arg(long)]
    pub reversed: Option<bool>,
}

impl EstimateCommand {
    pub fn execute(&self, config_path: Option<&Path>) -> Result<()> {
        let config = load_config(config_path)?;
        ensure!(self.max_value > 0, "--max-value must be > 0");

        let mut values = [0u16; SENSOR_COUNT];
        ensure!(
            self.samples.len() == SENSOR_COUNT,
            "expected {} samples, got {}",
            SENSOR_COUNT,
            self.samples.len()
        );
        values.copy_from_slice(&self.samples);

        let reversed = self.reversed.unwrap_or(config.sensor.reversed);
        let reading = SensorReading::new(values, self.max_value).with_reversed(reversed);
        let position = LinePositionEstimator::new().estimate(&reading);

        let mut pid = PidController::new(config.pid);
        let mut scaler = SpeedScaler::new(config.speed.max_speed);
        let base_speed = config.speed.base_speed;
        let wheels = position.detected().map(|p| {
            let correction = pid.compute(p);
            (
                correction,
                scaler.scale(base_speed + correction, base_speed - correction),
            )
        });

        let snapshot = TickSnapshot {
            samples: Some(values),
            max_value: Some(self.max_value),
            reversed,
            position,
            mode: config.sensor.mode,
            state: LoopState::Running,
            gains: pid.gains(),
            base_speed,
            frequency_hz: None,
            scaling_factor: scaler.scaling_factor(),
            wheel_speeds: match wheels {
                Some((_, cmd)) => (Some(cmd.left), Some(cmd.right)),
                None => (None, None),
            },
        };
        print!("{}", dashboard::render(&snapshot, config.display.inverted));

        match wheels {
            Some((correction, cmd)) => println!(
                "Correction: {:+.3} -> left {:.2}, right {:.2}",
                correction, cmd.left, cmd.right
            ),
            None => println!("No directional information: recovery policy would take over"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(samples: [u16; SENSOR_COUNT], max_value: u16) -> EstimateCommand {
        EstimateCommand {
            samples: samples.to_vec(),
            max_value,
            reversed: Some(false),
        }
    }

    fn empty_config() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").unwrap();
        (dir, path)
    }

    #[test]
    fn test_estimate_with_default_config() {
        let (_dir, path) = empty_config();
        assert!(command([10, 10, 10, 10, 90, 90, 90, 90], 100).execute(Some(&path)).is_ok());
        // 无对比度也不是错误
        assert!(command([100; SENSOR_COUNT], 100).execute(Some(&path)).is_ok());
    }

    #[test]
    fn test_estimate_rejects_zero_full_scale() {
        let (_dir, path) = empty_config();
        assert!(command([0; SENSOR_COUNT], 0).execute(Some(&path)).is_err());
    }
}
