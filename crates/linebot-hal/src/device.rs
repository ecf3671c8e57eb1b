//! 外部协作者接口
//!
//! 控制核心只通过这些 trait 访问硬件和操作员。
//! 所有方法都应当是非阻塞或有界延迟的：传感器读取要么及时返回，
//! 要么返回 [`SensorReading::Invalid`]，不能无限期挂起。

use crate::{ControlEvent, FrequencyMode, HalError, SensorMode, SensorReading};

/// 光线阵列传感器
pub trait LineSensor {
    /// 读取一次采样
    ///
    /// 传输失败不返回错误，而是返回 [`SensorReading::Invalid`]。
    fn read_samples(&mut self) -> SensorReading;

    /// 当前采集模式
    fn mode(&self) -> SensorMode;

    /// 切换采集模式
    fn set_mode(&mut self, mode: SensorMode) -> Result<(), HalError>;

    /// 白色校准（传感器需放在白色表面上）
    fn calibrate_white(&mut self) -> Result<(), HalError>;

    /// 黑色校准（传感器需放在黑色表面上）
    fn calibrate_black(&mut self) -> Result<(), HalError>;

    /// 设置工频抗干扰模式
    fn set_frequency(&mut self, mode: FrequencyMode) -> Result<(), HalError>;

    /// 进入休眠
    fn sleep(&mut self) -> Result<(), HalError>;

    /// 唤醒
    fn wake(&mut self) -> Result<(), HalError>;
}

/// 单个车轮的电机
pub trait Motor {
    /// 以速度百分比运行（-100..=100，超出范围由驱动钳位）
    fn set_speed(&mut self, percent: f64) -> Result<(), HalError>;

    /// 停止
    ///
    /// - `brake = true`: 刹车
    /// - `brake = false`: 滑行
    fn stop(&mut self, brake: bool) -> Result<(), HalError>;

    /// 当前测得速度（百分比，仅用于诊断）
    fn speed(&self) -> Result<f64, HalError>;
}

/// 文本调参通道
///
/// 每次调用最多返回一行，没有输入时立即返回 `None`。
pub trait TuningChannel {
    fn poll_line(&mut self) -> Option<String>;
}

/// 离散事件源
///
/// 每个控制周期轮询一次，没有事件时返回 `None`。
pub trait EventSource {
    fn poll_event(&mut self) -> Option<ControlEvent>;
}

/// 操作员播报
pub trait Notifier {
    fn announce(&mut self, message: &str);
}

/// 把播报写入日志的 [`Notifier`]（无头环境使用）
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn announce(&mut self, message: &str) {
        tracing::info!(target: "linebot::announce", "{}", message);
    }
}
