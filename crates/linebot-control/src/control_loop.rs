//! # 巡线控制循环
//!
//! 单线程、协作式：一个周期完整执行完才开始下一个周期，没有锁。
//!
//! ## 状态机
//!
//! ```text
//!          ToggleRun (PID reset)
//! Stopped ──────────────────────▶ Running
//!    ▲                               │
//!    └───────────────────────────────┘
//!          ToggleRun / Calibrate
//! ```
//!
//! ## 每个周期（顺序固定）
//!
//! 1. 轮询事件源，再轮询调参通道（每周期最多一行）
//! 2. 读取传感器
//! 3. 估计线位置
//! 4. 更新频率统计
//! 5. `Stopped`：两个电机刹车，记录检测到的线位置
//! 6. `Running`：
//!    - 读数无效 -> 本周期不发电机指令（保持上一条指令）
//!    - 读数有效但无方向信息 -> [`RecoveryPolicy`]
//!    - 否则 PID -> `base_speed ± correction` -> [`SpeedScaler`] -> 电机
//! 7. 检测到线时更新 `last_known_position`
//!
//! 同一周期发出的电机指令一定来自同一周期读取的传感器数据。
//!
//! ## 关闭
//!
//! [`ControlLoop::shutdown`] 只执行一次：两个电机刹车、传感器休眠、播报 "Goodbye"、
//! 向诊断发布最后一帧。`Drop` 时如果还没关闭会自动执行。

use crate::config::{FollowerConfig, SensorConfig};
use crate::diagnostics::{Diagnostics, LoopState, TickSnapshot};
use crate::error::ControlError;
use crate::estimator::{LinePosition, LinePositionEstimator};
use crate::metrics::LoopMetrics;
use crate::pid::PidController;
use crate::recovery::{Pivot, RecoveryPolicy};
use crate::scaler::{SpeedScaler, WheelCommand};
use crate::tuning::TuningCommand;
use linebot_hal::{
    ControlEvent, EventSource, LineSensor, LogNotifier, Motor, Notifier, SensorMode,
    SensorReading, TuningChannel,
};
use smallvec::SmallVec;
use tracing::{debug, info, trace, warn};

/// 手动校准进度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalibrationStep {
    /// 未在校准
    #[default]
    Idle,
    /// 白色已校准，等待黑色
    AwaitingBlack,
}

/// 单个周期的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// 停止状态，两个电机已刹车
    Braked,
    /// 读数无效，本周期没有发电机指令
    Skipped,
    /// 丢线，按最后位置原地转向
    Recovering(Pivot),
    /// 丢线且从未捕获过线，没有发电机指令
    AwaitingLine,
    /// 正常跟线
    Tracking {
        position: f64,
        correction: f64,
        command: WheelCommand,
    },
}

/// 巡线控制循环
///
/// 拥有传感器和两个电机；调参通道、事件源、播报和诊断都是可选的协作者。
pub struct ControlLoop<S: LineSensor, M: Motor> {
    sensor: S,
    left: M,
    right: M,

    tuning: Option<Box<dyn TuningChannel>>,
    events: Vec<Box<dyn EventSource>>,
    notifier: Box<dyn Notifier>,
    diagnostics: Option<Box<dyn Diagnostics>>,

    estimator: LinePositionEstimator,
    pid: PidController,
    scaler: SpeedScaler,
    recovery: RecoveryPolicy,
    metrics: LoopMetrics,

    sensor_config: SensorConfig,
    state: LoopState,
    base_speed: f64,
    last_known_position: Option<f64>,
    calibration: CalibrationStep,
    debug: bool,

    // 最后一个周期的读数（关闭时的最后一帧诊断）
    last_reading: SensorReading,
    last_position: LinePosition,

    shut_down: bool,
}

impl<S: LineSensor, M: Motor> ControlLoop<S, M> {
    /// 创建控制循环（初始状态 `Stopped`）
    pub fn new(sensor: S, left: M, right: M, config: &FollowerConfig) -> Result<Self, ControlError> {
        config.validate()?;

        Ok(Self {
            sensor,
            left,
            right,
            tuning: None,
            events: Vec::new(),
            notifier: Box::new(LogNotifier),
            diagnostics: None,
            estimator: LinePositionEstimator::new(),
            pid: PidController::new(config.pid),
            scaler: SpeedScaler::new(config.speed.max_speed),
            recovery: RecoveryPolicy::new(),
            metrics: LoopMetrics::new(config.loop_config.metrics_window()),
            sensor_config: config.sensor,
            state: LoopState::Stopped,
            base_speed: config.speed.base_speed,
            last_known_position: None,
            calibration: CalibrationStep::Idle,
            debug: config.display.debug,
            last_reading: SensorReading::Invalid,
            last_position: LinePosition::Unknown,
            shut_down: false,
        })
    }

    /// 挂接调参通道
    pub fn with_tuning_channel(mut self, channel: impl TuningChannel + 'static) -> Self {
        self.tuning = Some(Box::new(channel));
        self
    }

    /// 追加一个事件源（按追加顺序轮询）
    pub fn with_event_source(mut self, source: impl EventSource + 'static) -> Self {
        self.events.push(Box::new(source));
        self
    }

    /// 替换播报（默认写日志）
    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    /// 挂接诊断输出
    pub fn with_diagnostics(mut self, diagnostics: impl Diagnostics + 'static) -> Self {
        self.diagnostics = Some(Box::new(diagnostics));
        self
    }

    /// 启动准备：设置传感器模式和工频模式、唤醒传感器、电机刹车
    ///
    /// 传感器命令失败只记录警告。
    pub fn start(&mut self) -> Result<(), ControlError> {
        self.ensure_not_shut_down()?;

        let SensorConfig {
            mode,
            frequency,
            reversed,
        } = self.sensor_config;

        if let Err(e) = self.sensor.wake() {
            warn!("Failed to wake sensor: {}", e);
        }
        if let Err(e) = self.sensor.set_mode(mode) {
            warn!("Failed to set sensor mode {}: {}", mode, e);
        }
        if let Err(e) = self.sensor.set_frequency(frequency) {
            warn!("Failed to set sensor frequency {}: {}", frequency, e);
        }

        self.brake_both()?;
        info!(
            "Line follower ready: mode={}, frequency={}, reversed={}, base_speed={}, max_speed={}",
            mode,
            frequency,
            reversed,
            self.base_speed,
            self.scaler.max_speed()
        );
        Ok(())
    }

    /// 执行一个控制周期
    pub fn tick(&mut self) -> Result<TickOutcome, ControlError> {
        self.ensure_not_shut_down()?;

        // 1. 事件和调参
        self.poll_events()?;
        self.poll_tuning();

        // 2. 读取传感器
        let reading = self.sensor.read_samples();

        // 3. 线位置
        let position = self.estimator.estimate(&reading);

        // 4. 频率统计
        if let Some(hz) = self.metrics.record_tick() {
            info!("Loop frequency: {:.1} Hz", hz);
        }
        if !reading.is_valid() {
            self.metrics.record_invalid();
        }

        // 5 / 6
        let outcome = match self.state {
            LoopState::Stopped => {
                self.brake_both()?;
                TickOutcome::Braked
            },
            LoopState::Running => self.drive(&reading, position)?,
        };

        // 7. 只记录带方向信息的位置
        if let Some(p) = position.detected() {
            self.last_known_position = Some(p);
        }

        self.last_reading = reading;
        self.last_position = position;
        self.publish_snapshot();

        trace!("tick: {:?} -> {:?}", position, outcome);
        Ok(outcome)
    }

    fn drive(
        &mut self,
        reading: &SensorReading,
        position: LinePosition,
    ) -> Result<TickOutcome, ControlError> {
        if !reading.is_valid() {
            debug!("Invalid sensor reading, keeping previous motor command");
            return Ok(TickOutcome::Skipped);
        }

        let Some(current) = position.detected() else {
            // 读数有效但没有方向信息
            let decision = self.recovery.on_line_lost(
                self.last_known_position,
                self.pid.setpoint(),
                self.base_speed,
            );
            return match decision {
                Some(decision) => {
                    self.command(decision.command)?;
                    Ok(TickOutcome::Recovering(decision.pivot))
                },
                None => Ok(TickOutcome::AwaitingLine),
            };
        };

        self.recovery.on_line_found();

        let correction = self.pid.compute(current);
        let command = self
            .scaler
            .scale(self.base_speed + correction, self.base_speed - correction);
        self.command(command)?;

        Ok(TickOutcome::Tracking {
            position: current,
            correction,
            command,
        })
    }

    fn command(&mut self, command: WheelCommand) -> Result<(), ControlError> {
        self.left.set_speed(command.left)?;
        self.right.set_speed(command.right)?;
        Ok(())
    }

    /// 两个电机都刹车（任一失败也会尝试另一个，返回第一个错误）
    fn brake_both(&mut self) -> Result<(), ControlError> {
        let left = self.left.stop(true);
        let right = self.right.stop(true);
        left?;
        right?;
        Ok(())
    }

    fn poll_events(&mut self) -> Result<(), ControlError> {
        let pending: SmallVec<[ControlEvent; 4]> = self
            .events
            .iter_mut()
            .filter_map(|source| source.poll_event())
            .collect();

        for event in pending {
            self.handle_event(event)?;
        }
        Ok(())
    }

    fn poll_tuning(&mut self) {
        let Some(line) = self.tuning.as_mut().and_then(|channel| channel.poll_line()) else {
            return;
        };
        self.apply_tuning_line(&line);
    }

    /// 处理一行调参输入（非法输入记录并播报，不影响循环）
    pub fn apply_tuning_line(&mut self, line: &str) -> Option<TuningCommand> {
        let max_speed = self.scaler.max_speed();
        let parsed = line
            .parse::<TuningCommand>()
            .and_then(|command| command.check_limits(max_speed).map(|()| command));

        match parsed {
            Ok(command) => {
                command.apply(self.pid.config_mut(), &mut self.base_speed);
                let gains = self.pid.gains();
                info!(
                    "Tuning applied ({}): kp={}, ki={}, kd={}, base_speed={}",
                    command, gains.kp, gains.ki, gains.kd, self.base_speed
                );
                Some(command)
            },
            Err(e) => {
                warn!("Invalid tuning input {:?}: {}", line, e);
                self.notifier
                    .announce(&format!("Invalid tuning input: {}", line.trim()));
                None
            },
        }
    }

    /// 处理一个离散事件
    pub fn handle_event(&mut self, event: ControlEvent) -> Result<(), ControlError> {
        self.ensure_not_shut_down()?;
        debug!("Event: {}", event);

        match event {
            ControlEvent::ToggleRun => self.set_running(!self.state.is_running())?,
            ControlEvent::ToggleSensorMode => self.toggle_sensor_mode(),
            ControlEvent::Calibrate => self.calibration_step()?,
            ControlEvent::ToggleDebug => {
                self.debug = !self.debug;
                info!("Debug display {}", if self.debug { "on" } else { "off" });
            },
        }
        Ok(())
    }

    /// 切换运行状态
    ///
    /// 进入 `Running` 时重置 PID 和恢复策略；进入 `Stopped` 时立即刹车。
    pub fn set_running(&mut self, running: bool) -> Result<(), ControlError> {
        self.ensure_not_shut_down()?;
        if running == self.state.is_running() {
            return Ok(());
        }

        if running {
            self.pid.reset();
            self.recovery.reset();
            self.calibration = CalibrationStep::Idle;
            self.state = LoopState::Running;
            info!("State: Stopped -> Running");
            self.notifier.announce("Line following enabled");
        } else {
            self.state = LoopState::Stopped;
            self.brake_both()?;
            info!("State: Running -> Stopped");
            self.notifier.announce("Line following disabled");
        }
        Ok(())
    }

    fn toggle_sensor_mode(&mut self) {
        let target = self.sensor.mode().toggled();
        match self.sensor.set_mode(target) {
            Ok(()) => {
                info!("Sensor mode: {}", target);
                let message = match target {
                    SensorMode::Cal => "Calibration mode enabled",
                    SensorMode::Raw => "Raw sensor data mode enabled",
                };
                self.notifier.announce(message);
            },
            Err(e) => {
                warn!("Failed to switch sensor mode to {}: {}", target, e);
                self.notifier.announce("Sensor mode change failed");
            },
        }
    }

    /// 两步手动校准：白 -> 黑
    fn calibration_step(&mut self) -> Result<(), ControlError> {
        if self.state.is_running() {
            self.state = LoopState::Stopped;
            info!("State: Running -> Stopped (calibration)");
        }
        self.brake_both()?;

        match self.calibration {
            CalibrationStep::Idle => {
                self.notifier.announce("Entering manual calibration mode.");
                self.notifier.announce("Calibrate white");
                match self.sensor.calibrate_white() {
                    Ok(()) => {
                        self.calibration = CalibrationStep::AwaitingBlack;
                        info!("White calibration done, waiting for black");
                        self.notifier
                            .announce("Place sensor on black and press again");
                    },
                    Err(e) => {
                        warn!("White calibration failed: {}", e);
                        self.notifier.announce("Calibration failed");
                    },
                }
            },
            CalibrationStep::AwaitingBlack => {
                self.calibration = CalibrationStep::Idle;
                match self.sensor.calibrate_black() {
                    Ok(()) => {
                        self.pid.reset();
                        info!("Black calibration done");
                        self.notifier.announce("Calibration complete");
                    },
                    Err(e) => {
                        warn!("Black calibration failed: {}", e);
                        self.notifier.announce("Calibration failed");
                    },
                }
            },
        }
        Ok(())
    }

    fn snapshot(&self) -> TickSnapshot {
        TickSnapshot {
            samples: self.last_reading.raw_values().copied(),
            max_value: self.last_reading.max_value(),
            reversed: self
                .last_reading
                .is_reversed()
                .unwrap_or(self.sensor_config.reversed),
            position: self.last_position,
            mode: self.sensor.mode(),
            state: self.state,
            gains: self.pid.gains(),
            base_speed: self.base_speed,
            frequency_hz: self.metrics.last_frequency_hz(),
            scaling_factor: self.scaler.scaling_factor(),
            wheel_speeds: (self.left.speed().ok(), self.right.speed().ok()),
        }
    }

    fn publish_snapshot(&mut self) {
        if !self.debug || self.diagnostics.is_none() {
            return;
        }
        let snapshot = self.snapshot();
        if let Some(diagnostics) = self.diagnostics.as_mut() {
            diagnostics.publish(&snapshot);
        }
    }

    /// 关闭序列（只执行一次，再次调用直接返回）
    ///
    /// 两个电机都会尝试刹车，返回第一个电机错误。
    pub fn shutdown(&mut self) -> Result<(), ControlError> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;
        self.state = LoopState::Stopped;
        info!("Shutting down line follower");

        let braked = self.brake_both();
        if let Err(e) = self.sensor.sleep() {
            warn!("Failed to put sensor to sleep: {}", e);
        }

        self.notifier.announce("Goodbye");

        if self.diagnostics.is_some() {
            let snapshot = self.snapshot();
            if let Some(diagnostics) = self.diagnostics.as_mut() {
                diagnostics.on_shutdown(&snapshot);
            }
        }

        info!(
            "Line follower stopped after {} ticks ({} invalid readings)",
            self.metrics.total_ticks(),
            self.metrics.invalid_readings()
        );
        braked
    }

    fn ensure_not_shut_down(&self) -> Result<(), ControlError> {
        if self.shut_down {
            Err(ControlError::AlreadyShutDown)
        } else {
            Ok(())
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    pub fn base_speed(&self) -> f64 {
        self.base_speed
    }

    pub fn last_known_position(&self) -> Option<f64> {
        self.last_known_position
    }

    pub fn calibration(&self) -> CalibrationStep {
        self.calibration
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn pid(&self) -> &PidController {
        &self.pid
    }

    pub fn scaler(&self) -> &SpeedScaler {
        &self.scaler
    }

    pub fn recovery(&self) -> &RecoveryPolicy {
        &self.recovery
    }

    pub fn metrics(&self) -> &LoopMetrics {
        &self.metrics
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn left_motor(&self) -> &M {
        &self.left
    }

    pub fn right_motor(&self) -> &M {
        &self.right
    }
}

impl<S: LineSensor, M: Motor> Drop for ControlLoop<S, M> {
    fn drop(&mut self) {
        if !self.shut_down
            && let Err(e) = self.shutdown()
        {
            warn!("Shutdown on drop failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linebot_hal::{FrequencyMode, HalError};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    #[derive(Default)]
    struct Log {
        commands: Vec<(&'static str, f64)>,
        stops: Vec<&'static str>,
    }

    struct ScriptedSensor {
        readings: VecDeque<SensorReading>,
        mode: SensorMode,
    }

    impl LineSensor for ScriptedSensor {
        fn read_samples(&mut self) -> SensorReading {
            self.readings.pop_front().unwrap_or(SensorReading::Invalid)
        }
        fn mode(&self) -> SensorMode {
            self.mode
        }
        fn set_mode(&mut self, mode: SensorMode) -> Result<(), HalError> {
            self.mode = mode;
            Ok(())
        }
        fn calibrate_white(&mut self) -> Result<(), HalError> {
            Ok(())
        }
        fn calibrate_black(&mut self) -> Result<(), HalError> {
            Ok(())
        }
        fn set_frequency(&mut self, _mode: FrequencyMode) -> Result<(), HalError> {
            Ok(())
        }
        fn sleep(&mut self) -> Result<(), HalError> {
            Ok(())
        }
        fn wake(&mut self) -> Result<(), HalError> {
            Ok(())
        }
    }

    struct LoggingMotor {
        name: &'static str,
        log: Rc<RefCell<Log>>,
    }

    impl Motor for LoggingMotor {
        fn set_speed(&mut self, percent: f64) -> Result<(), HalError> {
            self.log.borrow_mut().commands.push((self.name, percent));
            Ok(())
        }
        fn stop(&mut self, _brake: bool) -> Result<(), HalError> {
            self.log.borrow_mut().stops.push(self.name);
            Ok(())
        }
        fn speed(&self) -> Result<f64, HalError> {
            Ok(0.0)
        }
    }

    fn build(
        readings: Vec<SensorReading>,
        config: &FollowerConfig,
    ) -> (ControlLoop<ScriptedSensor, LoggingMotor>, Rc<RefCell<Log>>) {
        let log = Rc::new(RefCell::new(Log::default()));
        let sensor = ScriptedSensor {
            readings: readings.into(),
            mode: SensorMode::Cal,
        };
        let left = LoggingMotor {
            name: "left",
            log: log.clone(),
        };
        let right = LoggingMotor {
            name: "right",
            log: log.clone(),
        };
        let control = ControlLoop::new(sensor, left, right, config).unwrap();
        (control, log)
    }

    fn skewed() -> SensorReading {
        SensorReading::new([10, 10, 10, 10, 90, 90, 90, 90], 100)
    }

    #[test]
    fn test_stopped_tick_brakes_and_records_position() {
        let (mut control, log) = build(vec![skewed()], &FollowerConfig::default());

        assert_eq!(control.tick().unwrap(), TickOutcome::Braked);
        assert_eq!(log.borrow().stops, vec!["left", "right"]);
        assert!(log.borrow().commands.is_empty());

        let last = control.last_known_position().unwrap();
        assert!((last - 2.9).abs() < 1e-12);
    }

    #[test]
    fn test_running_tick_follows_control_law() {
        let mut config = FollowerConfig::default();
        config.pid = config.pid.with_gains(1.0, 0.0, 0.0);
        let (mut control, log) = build(vec![skewed()], &config);
        control.set_running(true).unwrap();

        let TickOutcome::Tracking {
            position,
            correction,
            command,
        } = control.tick().unwrap()
        else {
            panic!("expected tracking outcome");
        };

        // 未反向：位置 2.9 < 4.5，修正量为正，左轮更快
        assert!((position - 2.9).abs() < 1e-12);
        assert!((correction - 1.6).abs() < 1e-12);
        assert!((command.left - 11.6).abs() < 1e-12);
        assert!((command.right - 8.4).abs() < 1e-12);
        assert_eq!(
            log.borrow().commands,
            vec![("left", command.left), ("right", command.right)]
        );
    }

    #[test]
    fn test_reversed_reading_turns_the_other_way() {
        let mut config = FollowerConfig::default();
        config.pid = config.pid.with_gains(1.0, 0.0, 0.0);
        let (mut control, _log) = build(vec![skewed().with_reversed(true)], &config);
        control.set_running(true).unwrap();

        let TickOutcome::Tracking { position, command, .. } = control.tick().unwrap() else {
            panic!("expected tracking outcome");
        };
        assert!(position > 4.5);
        assert!(command.left < command.right);
    }

    #[test]
    fn test_ticks_after_shutdown_fail() {
        let (mut control, log) = build(vec![], &FollowerConfig::default());
        control.shutdown().unwrap();
        control.shutdown().unwrap();

        assert_eq!(log.borrow().stops, vec!["left", "right"]);
        assert!(matches!(control.tick(), Err(ControlError::AlreadyShutDown)));
    }

    #[test]
    fn test_drop_runs_shutdown() {
        let (control, log) = build(vec![], &FollowerConfig::default());
        drop(control);
        assert_eq!(log.borrow().stops, vec!["left", "right"]);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = FollowerConfig::default();
        config.speed.max_speed = -1.0;

        let log = Rc::new(RefCell::new(Log::default()));
        let result = ControlLoop::new(
            ScriptedSensor {
                readings: VecDeque::new(),
                mode: SensorMode::Cal,
            },
            LoggingMotor {
                name: "left",
                log: log.clone(),
            },
            LoggingMotor {
                name: "right",
                log,
            },
            &config,
        );
        assert!(matches!(result, Err(ControlError::Config(_))));
    }

    #[test]
    fn test_tuning_line_changes_next_compute() {
        let mut config = FollowerConfig::default();
        config.pid = config.pid.with_gains(1.0, 0.0, 0.0);
        let (mut control, _log) = build(vec![skewed(), skewed()], &config);
        control.set_running(true).unwrap();

        assert_eq!(
            control.apply_tuning_line("p2"),
            Some(TuningCommand::SetKp(2.0))
        );
        assert_eq!(control.apply_tuning_line("q1"), None);
        // 超过 max_speed 的基础速度被拒绝，原值不变
        assert_eq!(control.apply_tuning_line("s150"), None);
        assert_eq!(control.base_speed(), 10.0);

        let TickOutcome::Tracking { correction, .. } = control.tick().unwrap() else {
            panic!("expected tracking outcome");
        };
        assert!((correction - 3.2).abs() < 1e-12);
        assert_eq!(control.snapshot().samples, Some([10, 10, 10, 10, 90, 90, 90, 90]));
    }
}
