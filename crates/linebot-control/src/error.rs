//! 控制核心错误类型

use linebot_hal::HalError;
use std::path::PathBuf;
use thiserror::Error;

/// 控制循环错误
#[derive(Error, Debug)]
pub enum ControlError {
    /// 硬件协作者返回错误（电机指令失败等）
    #[error("Hardware error: {0}")]
    Hal(#[from] HalError),

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// 已经执行过关闭序列
    #[error("Control loop was already shut down, cannot execute commands")]
    AlreadyShutDown,
}

/// 配置加载/校验错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 读写配置文件失败
    #[error("Failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML 解析失败
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML 序列化失败
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// 参数不合法
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
