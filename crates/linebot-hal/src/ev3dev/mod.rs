//! ev3dev sysfs 后端
//!
//! ev3dev 把设备暴露为 `/sys/class/<class>/<device>/<attribute>` 文本属性：
//!
//! - `lego-port/port*` - 端口模式（光线阵列需要 `nxt-i2c`）
//! - `lego-sensor/sensor*` - 传感器（`address`、`mode`、`command`、`bin_data`、`poll_ms`）
//! - `tacho-motor/motor*` - 电机（`address`、`speed_sp`、`stop_action`、`command`、`speed`、`max_speed`）
//!
//! 根目录可配置，测试中用临时目录模拟 sysfs。

mod motor;
mod sensor;

pub use motor::TachoMotor;
pub use sensor::LightArraySensor;

use crate::HalError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// 默认 sysfs 根目录
pub const SYSFS_ROOT: &str = "/sys/class";

/// 读取属性（去掉末尾换行）
pub(crate) fn read_attr(dir: &Path, name: &str) -> io::Result<String> {
    let content = fs::read_to_string(dir.join(name))?;
    Ok(content.trim_end().to_string())
}

/// 写入属性
pub(crate) fn write_attr(dir: &Path, name: &str, value: &str) -> io::Result<()> {
    fs::write(dir.join(name), value)
}

/// 读取整数属性
pub(crate) fn read_int_attr(dir: &Path, name: &'static str) -> Result<i64, HalError> {
    let value = read_attr(dir, name)?;
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| HalError::MalformedAttribute {
            attribute: name,
            value,
        })
}

/// 在设备类目录下按端口查找设备
///
/// `address` 属性形如 `ev3-ports:in1` / `ev3-ports:outA` / `ev3-ports:in1:i2c1`，
/// 按 `:` 分段匹配端口名。
pub(crate) fn find_device(
    root: &Path,
    class: &'static str,
    prefix: &str,
    port: &str,
) -> Result<PathBuf, HalError> {
    let class_dir = root.join(class);
    let not_found = || HalError::DeviceNotFound {
        kind: class,
        port: port.to_string(),
    };

    let entries = match fs::read_dir(&class_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(not_found()),
        Err(e) => return Err(e.into()),
    };

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(prefix))
        .map(|entry| entry.path())
        .collect();
    // 目录遍历顺序不确定，排序保证结果可复现
    candidates.sort();

    candidates
        .into_iter()
        .find(|dir| {
            read_attr(dir, "address")
                .map(|address| address.split(':').any(|segment| segment == port))
                .unwrap_or(false)
        })
        .ok_or_else(not_found)
}
