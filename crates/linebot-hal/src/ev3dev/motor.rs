//! EV3 伺服电机（tacho-motor）驱动

use super::{find_device, read_int_attr, write_attr};
use crate::{HalError, Motor};
use std::path::{Path, PathBuf};

/// tacho-motor 电机
#[derive(Debug)]
pub struct TachoMotor {
    dir: PathBuf,
    /// 满速（tacho counts/s），百分比以此为基准换算
    max_speed: i64,
}

impl TachoMotor {
    /// 打开指定端口上的电机
    ///
    /// # 参数
    ///
    /// - `root`: sysfs 根目录
    /// - `port`: 输出端口（`outA`..`outD`）
    pub fn open(root: impl AsRef<Path>, port: &str) -> Result<Self, HalError> {
        let dir = find_device(root.as_ref(), "tacho-motor", "motor", port)?;
        let max_speed = read_int_attr(&dir, "max_speed")?;
        if max_speed <= 0 {
            return Err(HalError::MalformedAttribute {
                attribute: "max_speed",
                value: max_speed.to_string(),
            });
        }

        tracing::info!(
            "Tacho motor on {} at {} (max_speed {})",
            port,
            dir.display(),
            max_speed
        );

        Ok(Self { dir, max_speed })
    }

    /// 满速（tacho counts/s）
    pub fn max_speed(&self) -> i64 {
        self.max_speed
    }
}

impl Motor for TachoMotor {
    fn set_speed(&mut self, percent: f64) -> Result<(), HalError> {
        let percent = if percent.is_finite() {
            percent.clamp(-100.0, 100.0)
        } else {
            0.0
        };
        let speed_sp = (percent / 100.0 * self.max_speed as f64).round() as i64;

        write_attr(&self.dir, "speed_sp", &speed_sp.to_string())?;
        write_attr(&self.dir, "command", "run-forever")?;
        Ok(())
    }

    fn stop(&mut self, brake: bool) -> Result<(), HalError> {
        let action = if brake { "brake" } else { "coast" };
        write_attr(&self.dir, "stop_action", action)?;
        write_attr(&self.dir, "command", "stop")?;
        Ok(())
    }

    fn speed(&self) -> Result<f64, HalError> {
        let speed = read_int_attr(&self.dir, "speed")?;
        Ok(speed as f64 / self.max_speed as f64 * 100.0)
    }
}
