//! mindsensors 光线阵列（ms-light-array）驱动

use super::{find_device, read_attr, write_attr};
use crate::{FrequencyMode, HalError, LineSensor, SENSOR_COUNT, SensorMode, SensorReading};
use std::fs;
use std::path::{Path, PathBuf};

/// 光线阵列传感器
#[derive(Debug)]
pub struct LightArraySensor {
    dir: PathBuf,
    mode: SensorMode,
    reversed: bool,
}

impl LightArraySensor {
    /// 打开指定端口上的光线阵列
    ///
    /// # 参数
    ///
    /// - `root`: sysfs 根目录（通常为 [`SYSFS_ROOT`](super::SYSFS_ROOT)）
    /// - `port`: 输入端口（`in1`..`in4`）
    /// - `reversed`: 阵列是否反向安装
    ///
    /// # 错误
    ///
    /// 端口上没有传感器时返回 [`HalError::DeviceNotFound`]，不做重试。
    pub fn open(root: impl AsRef<Path>, port: &str, reversed: bool) -> Result<Self, HalError> {
        let root = root.as_ref();

        // 光线阵列是 I2C 设备，端口需要先切到 nxt-i2c 模式
        match find_device(root, "lego-port", "port", port) {
            Ok(port_dir) => {
                write_attr(&port_dir, "mode", "nxt-i2c")?;
                tracing::debug!("Port {} switched to nxt-i2c", port);
            },
            Err(HalError::DeviceNotFound { .. }) => {
                tracing::debug!("No lego-port entry for {}, assuming preconfigured", port);
            },
            Err(e) => return Err(e),
        }

        let dir = find_device(root, "lego-sensor", "sensor", port)?;
        let mode = read_attr(&dir, "mode")
            .ok()
            .and_then(|m| m.parse::<SensorMode>().ok())
            .unwrap_or_default();

        tracing::info!(
            "Light array sensor on {} at {} (mode {}, reversed: {})",
            port,
            dir.display(),
            mode,
            reversed
        );

        Ok(Self {
            dir,
            mode,
            reversed,
        })
    }

    /// 设备目录
    pub fn path(&self) -> &Path {
        &self.dir
    }

    fn command(&self, command: &str) -> Result<(), HalError> {
        write_attr(&self.dir, "command", command)?;
        tracing::debug!("Sensor command: {}", command);
        Ok(())
    }
}

impl LineSensor for LightArraySensor {
    fn read_samples(&mut self) -> SensorReading {
        let bytes = match fs::read(self.dir.join("bin_data")) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!("bin_data read failed: {}", e);
                return SensorReading::Invalid;
            },
        };

        // 驱动可能返回更长的缓冲区，只取前 8 个字节
        if bytes.len() < SENSOR_COUNT {
            tracing::debug!("Short bin_data transfer: {} bytes", bytes.len());
            return SensorReading::Invalid;
        }

        let mut values = [0u16; SENSOR_COUNT];
        for (value, byte) in values.iter_mut().zip(&bytes[..SENSOR_COUNT]) {
            *value = u16::from(*byte);
        }

        SensorReading::new(values, self.mode.max_value()).with_reversed(self.reversed)
    }

    fn mode(&self) -> SensorMode {
        self.mode
    }

    fn set_mode(&mut self, mode: SensorMode) -> Result<(), HalError> {
        write_attr(&self.dir, "mode", mode.as_str())?;
        self.mode = mode;
        Ok(())
    }

    fn calibrate_white(&mut self) -> Result<(), HalError> {
        self.command("CAL-WHITE")
    }

    fn calibrate_black(&mut self) -> Result<(), HalError> {
        self.command("CAL-BLACK")
    }

    fn set_frequency(&mut self, mode: FrequencyMode) -> Result<(), HalError> {
        self.command(mode.command())
    }

    fn sleep(&mut self) -> Result<(), HalError> {
        // 休眠前必须先停止轮询
        write_attr(&self.dir, "poll_ms", "0")?;
        self.command("SLEEP")
    }

    fn wake(&mut self) -> Result<(), HalError> {
        self.command("WAKE")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ev3dev::fake_sysfs::{add_device, read};

    fn setup() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let root = tempfile::tempdir().unwrap();
        let port = add_device(
            root.path(),
            "lego-port",
            "port0",
            &[("address", "ev3-ports:in1\n"), ("mode", "auto\n")],
        );
        let sensor = add_device(
            root.path(),
            "lego-sensor",
            "sensor0",
            &[
                ("address", "ev3-ports:in1:i2c1\n"),
                ("mode", "CAL\n"),
                ("bin_data", ""),
                ("command", ""),
                ("poll_ms", "100\n"),
            ],
        );
        (root, port, sensor)
    }

    #[test]
    fn test_open_switches_port_mode() {
        let (root, port, _) = setup();
        let sensor = LightArraySensor::open(root.path(), "in1", true).unwrap();
        assert_eq!(read(&port, "mode"), "nxt-i2c");
        assert_eq!(sensor.mode(), SensorMode::Cal);
    }

    #[test]
    fn test_open_missing_sensor_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        let err = LightArraySensor::open(root.path(), "in2", false).unwrap_err();
        assert!(matches!(err, HalError::DeviceNotFound { kind: "lego-sensor", .. }));
    }

    #[test]
    fn test_read_samples() {
        let (root, _, dir) = setup();
        fs::write(dir.join("bin_data"), [10u8, 20, 30, 40, 50, 60, 70, 80]).unwrap();

        let mut sensor = LightArraySensor::open(root.path(), "in1", true).unwrap();
        let reading = sensor.read_samples();
        assert_eq!(
            reading,
            SensorReading::Samples {
                values: [10, 20, 30, 40, 50, 60, 70, 80],
                max_value: 100,
                reversed: true,
            }
        );
    }

    #[test]
    fn test_short_transfer_is_invalid() {
        let (root, _, dir) = setup();
        fs::write(dir.join("bin_data"), [10u8, 20, 30]).unwrap();

        let mut sensor = LightArraySensor::open(root.path(), "in1", false).unwrap();
        assert_eq!(sensor.read_samples(), SensorReading::Invalid);

        // bin_data 消失（设备拔出）同样视为无效读数
        fs::remove_file(dir.join("bin_data")).unwrap();
        assert_eq!(sensor.read_samples(), SensorReading::Invalid);
    }

    #[test]
    fn test_raw_mode_changes_max_value() {
        let (root, _, dir) = setup();
        fs::write(dir.join("bin_data"), [255u8; 8]).unwrap();

        let mut sensor = LightArraySensor::open(root.path(), "in1", false).unwrap();
        sensor.set_mode(SensorMode::Raw).unwrap();
        assert_eq!(read(&dir, "mode"), "RAW");
        assert_eq!(sensor.read_samples().max_value(), Some(255));
    }

    #[test]
    fn test_commands() {
        let (root, _, dir) = setup();
        let mut sensor = LightArraySensor::open(root.path(), "in1", false).unwrap();

        sensor.calibrate_white().unwrap();
        assert_eq!(read(&dir, "command"), "CAL-WHITE");
        sensor.calibrate_black().unwrap();
        assert_eq!(read(&dir, "command"), "CAL-BLACK");
        sensor.set_frequency(FrequencyMode::Hz50).unwrap();
        assert_eq!(read(&dir, "command"), "50HZ");

        sensor.sleep().unwrap();
        assert_eq!(read(&dir, "poll_ms"), "0");
        assert_eq!(read(&dir, "command"), "SLEEP");
        sensor.wake().unwrap();
        assert_eq!(read(&dir, "command"), "WAKE");
    }
}
