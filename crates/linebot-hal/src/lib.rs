//! # Linebot HAL - 硬件抽象层
//!
//! 为巡线控制核心提供统一的外部协作者接口：
//!
//! - [`LineSensor`] - 8 路光线阵列传感器（采样、模式、校准、频率、休眠）
//! - [`Motor`] - 单个轮子的电机（速度百分比、刹车/滑行、速度反馈）
//! - [`TuningChannel`] - 文本调参通道（非阻塞，每次最多一行）
//! - [`EventSource`] - 按键等离散事件源（已在外部去抖）
//! - [`Notifier`] - 播报（EV3 上为语音，无头环境为日志）
//!
//! ## 后端
//!
//! - [`ev3dev`] - ev3dev sysfs 驱动（`/sys/class/lego-sensor`、`/sys/class/tacho-motor`）
//! - [`sim`] - 差速机器人运动学仿真器（无头运行和集成测试）
//! - [`console`] - 标准输入读取线程（调参命令 + 事件关键字）
//!
//! **依赖原则**: 本 crate 不依赖 `linebot-control`，控制算法只通过 trait 访问硬件。

pub mod console;
mod device;
mod error;
mod event;
pub mod ev3dev;
mod reading;
pub mod sim;

pub use device::{EventSource, LineSensor, LogNotifier, Motor, Notifier, TuningChannel};
pub use error::HalError;
pub use event::ControlEvent;
pub use reading::{FrequencyMode, SENSOR_COUNT, SensorMode, SensorReading};
