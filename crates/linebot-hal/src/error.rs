//! 硬件层错误类型定义

use thiserror::Error;

/// 硬件层错误类型
#[derive(Error, Debug)]
pub enum HalError {
    /// sysfs / 设备文件 IO 错误
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    /// 设备未找到（端口上没有对应的传感器或电机）
    ///
    /// 这是启动阶段唯一的致命错误，控制核心不做重试。
    #[error("Device not found: {kind} on port {port}")]
    DeviceNotFound { kind: &'static str, port: String },

    /// 无效的采集模式（只支持 CAL / RAW）
    #[error("Invalid sensor mode: {0} (expected CAL or RAW)")]
    InvalidMode(String),

    /// 无效的工频模式（只支持 50HZ / 60HZ / UNIVERSAL）
    #[error("Invalid frequency mode: {0} (expected 50HZ, 60HZ or UNIVERSAL)")]
    InvalidFrequency(String),

    /// 设备属性内容无法解析
    #[error("Malformed attribute {attribute}: {value:?}")]
    MalformedAttribute { attribute: &'static str, value: String },

    /// 设备已断开
    #[error("Device disconnected")]
    Disconnected,

    /// 后端不支持该操作
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),
}

#[cfg(test)]
mod tests {
    use super::HalError;

    #[test]
    fn test_hal_error_display() {
        let err = HalError::DeviceNotFound {
            kind: "lego-sensor",
            port: "in1".to_string(),
        };
        assert_eq!(format!("{}", err), "Device not found: lego-sensor on port in1");

        let err = HalError::InvalidMode("FOO".to_string());
        assert!(format!("{}", err).contains("CAL or RAW"));

        let err = HalError::InvalidFrequency("70HZ".to_string());
        assert!(format!("{}", err).contains("70HZ"));

        let err = HalError::Disconnected;
        assert_eq!(format!("{}", err), "Device disconnected");
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: HalError = io.into();
        assert!(matches!(err, HalError::Io(_)));
    }
}
