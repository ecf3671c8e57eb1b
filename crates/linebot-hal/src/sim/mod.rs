//! 差速机器人巡线仿真器
//!
//! 白色地面上画着一条暗线 `y = amplitude * sin(x / wavelength)`，
//! 两轮差速机器人按电机百分比指令做运动学积分，
//! 光线阵列在车轴前方、垂直于航向的横杆上采样 8 个点。
//!
//! # 时间模型
//!
//! 仿真时间只在传感器读取时前进一个固定步长，
//! 因此同样的种子和指令序列总是得到同样的轨迹（与墙钟无关）。
//!
//! # 坐标约定
//!
//! - 机器人坐标系中 `+y` 为左侧
//! - 物理顺序下标 0 在最右侧，下标 7 在最左侧
//! - 反向安装时驱动按逆序输出并置 `reversed` 标志

mod devices;
mod world;

pub use devices::{SimMotor, SimSensor, WheelSide};
pub use world::{Pose, SimConfig, SimWorld};
