//! 仿真传感器与电机

use super::SimWorld;
use crate::{FrequencyMode, HalError, LineSensor, Motor, SensorMode, SensorReading};
use rand::Rng;

/// 车轮位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelSide {
    Left,
    Right,
}

impl WheelSide {
    fn index(self) -> usize {
        match self {
            WheelSide::Left => 0,
            WheelSide::Right => 1,
        }
    }
}

/// 仿真光线阵列
///
/// 每次读取先推进一个仿真步长，再采样。
#[derive(Debug, Clone)]
pub struct SimSensor {
    world: SimWorld,
}

/// 仿真电机（测得速度 = 指令速度）
#[derive(Debug, Clone)]
pub struct SimMotor {
    world: SimWorld,
    side: WheelSide,
}

impl SimWorld {
    /// 创建连接到本世界的传感器
    pub fn sensor(&self) -> SimSensor {
        SimSensor {
            world: self.clone(),
        }
    }

    /// 创建连接到本世界的电机
    pub fn motor(&self, side: WheelSide) -> SimMotor {
        SimMotor {
            world: self.clone(),
            side,
        }
    }
}

impl LineSensor for SimSensor {
    fn read_samples(&mut self) -> SensorReading {
        let mut state = self.world.state.lock();
        self.world.advance(&mut state);

        if state.sleeping {
            return SensorReading::Invalid;
        }

        let p = self.world.config.invalid_probability;
        if p > 0.0 && state.rng.r#gen::<f64>() < p {
            return SensorReading::Invalid;
        }

        let mut values = self.world.sample(&mut state);
        let reversed = self.world.config.reversed;
        if reversed {
            values.reverse();
        }
        SensorReading::new(values, state.mode.max_value()).with_reversed(reversed)
    }

    fn mode(&self) -> SensorMode {
        self.world.state.lock().mode
    }

    fn set_mode(&mut self, mode: SensorMode) -> Result<(), HalError> {
        self.world.state.lock().mode = mode;
        Ok(())
    }

    fn calibrate_white(&mut self) -> Result<(), HalError> {
        tracing::debug!("Simulated sensor: white calibration");
        Ok(())
    }

    fn calibrate_black(&mut self) -> Result<(), HalError> {
        tracing::debug!("Simulated sensor: black calibration");
        Ok(())
    }

    fn set_frequency(&mut self, mode: FrequencyMode) -> Result<(), HalError> {
        tracing::debug!("Simulated sensor: frequency {}", mode);
        Ok(())
    }

    fn sleep(&mut self) -> Result<(), HalError> {
        self.world.state.lock().sleeping = true;
        Ok(())
    }

    fn wake(&mut self) -> Result<(), HalError> {
        self.world.state.lock().sleeping = false;
        Ok(())
    }
}

impl Motor for SimMotor {
    fn set_speed(&mut self, percent: f64) -> Result<(), HalError> {
        let percent = if percent.is_finite() {
            percent.clamp(-100.0, 100.0)
        } else {
            0.0
        };
        self.world.state.lock().wheels[self.side.index()] = percent;
        Ok(())
    }

    fn stop(&mut self, _brake: bool) -> Result<(), HalError> {
        self.world.state.lock().wheels[self.side.index()] = 0.0;
        Ok(())
    }

    fn speed(&self) -> Result<f64, HalError> {
        Ok(self.world.state.lock().wheels[self.side.index()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimConfig;

    #[test]
    fn test_reversed_mount_reverses_output() {
        let config = SimConfig {
            initial_pose: crate::sim::Pose {
                x: 0.0,
                y: -0.02,
                heading: 0.0,
            },
            reversed: true,
            ..SimConfig::default()
        };
        let world = SimWorld::new(config);
        let mut sensor = world.sensor();

        let reading = sensor.read_samples();
        assert_eq!(reading.is_reversed(), Some(true));
        let raw = reading.raw_values().unwrap();
        let oriented = reading.oriented_values().unwrap();
        // 线在左侧：物理下标 6 暗，驱动输出顺序中对应下标 1
        assert!(raw[1] < raw[6]);
        assert!(oriented[6] < oriented[1]);
    }

    #[test]
    fn test_motor_commands_are_clamped_and_reported() {
        let world = SimWorld::new(SimConfig::default());
        let mut left = world.motor(WheelSide::Left);
        let mut right = world.motor(WheelSide::Right);

        left.set_speed(150.0).unwrap();
        right.set_speed(-30.0).unwrap();
        assert_eq!(world.wheel_commands(), (100.0, -30.0));
        assert_eq!(left.speed().unwrap(), 100.0);

        left.stop(true).unwrap();
        assert_eq!(left.speed().unwrap(), 0.0);
    }

    #[test]
    fn test_sleeping_sensor_is_invalid() {
        let world = SimWorld::new(SimConfig::default());
        let mut sensor = world.sensor();
        sensor.sleep().unwrap();
        assert_eq!(sensor.read_samples(), SensorReading::Invalid);
        sensor.wake().unwrap();
        assert!(sensor.read_samples().is_valid());
    }

    #[test]
    fn test_invalid_probability_one_is_always_invalid() {
        let config = SimConfig {
            invalid_probability: 1.0,
            ..SimConfig::default()
        };
        let world = SimWorld::new(config);
        let mut sensor = world.sensor();
        for _ in 0..10 {
            assert_eq!(sensor.read_samples(), SensorReading::Invalid);
        }
    }

    #[test]
    fn test_raw_mode_scales_values() {
        let world = SimWorld::new(SimConfig::default());
        let mut sensor = world.sensor();
        sensor.set_mode(SensorMode::Raw).unwrap();

        let reading = sensor.read_samples();
        assert_eq!(reading.max_value(), Some(255));
        assert_eq!(reading.raw_values().unwrap()[0], 255);
    }
}
