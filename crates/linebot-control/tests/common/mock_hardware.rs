//! Mock 硬件接口
//!
//! 记录所有调用的传感器、电机、调参通道、事件源、播报和诊断替身。
//! 每个替身都有一个共享句柄，交给控制循环后测试仍然可以检查记录。

use linebot_control::{Diagnostics, FollowerConfig, ControlLoop, TickSnapshot};
use linebot_hal::{
    ControlEvent, EventSource, FrequencyMode, HalError, LineSensor, Motor, Notifier, SensorMode,
    SensorReading, TuningChannel,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// 传感器调用记录
#[derive(Debug, Clone, PartialEq)]
pub enum SensorCall {
    SetMode(SensorMode),
    CalibrateWhite,
    CalibrateBlack,
    SetFrequency(FrequencyMode),
    Sleep,
    Wake,
}

#[derive(Debug)]
pub struct MockSensorState {
    /// 按顺序返回的读数（用完后返回 `fallback`）
    pub readings: VecDeque<SensorReading>,
    pub fallback: SensorReading,
    pub mode: SensorMode,
    pub calls: Vec<SensorCall>,
    pub reads: usize,
    /// 模拟校准命令失败
    pub fail_commands: bool,
}

/// 模拟光线阵列
#[derive(Debug, Clone)]
pub struct MockSensor {
    state: Arc<Mutex<MockSensorState>>,
}

impl MockSensor {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockSensorState {
                readings: VecDeque::new(),
                fallback: SensorReading::Invalid,
                mode: SensorMode::Cal,
                calls: Vec::new(),
                reads: 0,
                fail_commands: false,
            })),
        }
    }

    pub fn push(&self, reading: SensorReading) {
        self.state.lock().unwrap().readings.push_back(reading);
    }

    pub fn set_fallback(&self, reading: SensorReading) {
        self.state.lock().unwrap().fallback = reading;
    }

    pub fn set_fail_commands(&self, fail: bool) {
        self.state.lock().unwrap().fail_commands = fail;
    }

    pub fn calls(&self) -> Vec<SensorCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn reads(&self) -> usize {
        self.state.lock().unwrap().reads
    }

    fn command(&self, call: SensorCall) -> Result<(), HalError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_commands {
            return Err(HalError::Disconnected);
        }
        if let SensorCall::SetMode(mode) = call {
            state.mode = mode;
        }
        state.calls.push(call);
        Ok(())
    }
}

impl LineSensor for MockSensor {
    fn read_samples(&mut self) -> SensorReading {
        let mut state = self.state.lock().unwrap();
        state.reads += 1;
        let fallback = state.fallback;
        state.readings.pop_front().unwrap_or(fallback)
    }

    fn mode(&self) -> SensorMode {
        self.state.lock().unwrap().mode
    }

    fn set_mode(&mut self, mode: SensorMode) -> Result<(), HalError> {
        self.command(SensorCall::SetMode(mode))
    }

    fn calibrate_white(&mut self) -> Result<(), HalError> {
        self.command(SensorCall::CalibrateWhite)
    }

    fn calibrate_black(&mut self) -> Result<(), HalError> {
        self.command(SensorCall::CalibrateBlack)
    }

    fn set_frequency(&mut self, mode: FrequencyMode) -> Result<(), HalError> {
        self.command(SensorCall::SetFrequency(mode))
    }

    fn sleep(&mut self) -> Result<(), HalError> {
        self.command(SensorCall::Sleep)
    }

    fn wake(&mut self) -> Result<(), HalError> {
        self.command(SensorCall::Wake)
    }
}

/// 电机调用记录
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotorCall {
    SetSpeed(f64),
    Stop { brake: bool },
}

#[derive(Debug, Default)]
pub struct MockMotorState {
    pub calls: Vec<MotorCall>,
    pub speed: f64,
    /// 模拟指令失败
    pub fail: bool,
}

/// 模拟电机
#[derive(Debug, Clone, Default)]
pub struct MockMotor {
    state: Arc<Mutex<MockMotorState>>,
}

impl MockMotor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<MotorCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn set_fail(&self, fail: bool) {
        self.state.lock().unwrap().fail = fail;
    }

    /// 最后一次速度指令
    pub fn last_speed(&self) -> Option<f64> {
        self.calls().iter().rev().find_map(|call| match call {
            MotorCall::SetSpeed(v) => Some(*v),
            MotorCall::Stop { .. } => None,
        })
    }

    pub fn stop_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, MotorCall::Stop { brake: true }))
            .count()
    }
}

impl Motor for MockMotor {
    fn set_speed(&mut self, percent: f64) -> Result<(), HalError> {
        let mut state = self.state.lock().unwrap();
        if state.fail {
            return Err(HalError::Disconnected);
        }
        state.calls.push(MotorCall::SetSpeed(percent));
        state.speed = percent;
        Ok(())
    }

    fn stop(&mut self, brake: bool) -> Result<(), HalError> {
        let mut state = self.state.lock().unwrap();
        // 失败时也记录尝试
        state.calls.push(MotorCall::Stop { brake });
        if state.fail {
            return Err(HalError::Disconnected);
        }
        state.speed = 0.0;
        Ok(())
    }

    fn speed(&self) -> Result<f64, HalError> {
        Ok(self.state.lock().unwrap().speed)
    }
}

/// 模拟调参通道
#[derive(Debug, Clone, Default)]
pub struct MockTuning {
    lines: Arc<Mutex<VecDeque<String>>>,
}

impl MockTuning {
    pub fn push(&self, line: &str) {
        self.lines.lock().unwrap().push_back(line.to_string());
    }
}

impl TuningChannel for MockTuning {
    fn poll_line(&mut self) -> Option<String> {
        self.lines.lock().unwrap().pop_front()
    }
}

/// 模拟事件源（每次轮询最多弹出一个事件）
#[derive(Debug, Clone, Default)]
pub struct MockEvents {
    events: Arc<Mutex<VecDeque<ControlEvent>>>,
}

impl MockEvents {
    pub fn push(&self, event: ControlEvent) {
        self.events.lock().unwrap().push_back(event);
    }
}

impl EventSource for MockEvents {
    fn poll_event(&mut self) -> Option<ControlEvent> {
        self.events.lock().unwrap().pop_front()
    }
}

/// 记录播报内容
#[derive(Debug, Clone, Default)]
pub struct MockNotifier {
    messages: Arc<Mutex<Vec<String>>>,
}

impl MockNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn count(&self, message: &str) -> usize {
        self.messages().iter().filter(|m| m.as_str() == message).count()
    }
}

impl Notifier for MockNotifier {
    fn announce(&mut self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

/// 记录诊断快照
#[derive(Debug, Clone, Default)]
pub struct MockDiagnostics {
    snapshots: Arc<Mutex<Vec<TickSnapshot>>>,
    shutdowns: Arc<Mutex<usize>>,
}

impl MockDiagnostics {
    pub fn snapshots(&self) -> Vec<TickSnapshot> {
        self.snapshots.lock().unwrap().clone()
    }

    pub fn shutdowns(&self) -> usize {
        *self.shutdowns.lock().unwrap()
    }
}

impl Diagnostics for MockDiagnostics {
    fn publish(&mut self, snapshot: &TickSnapshot) {
        self.snapshots.lock().unwrap().push(snapshot.clone());
    }

    fn on_shutdown(&mut self, _final_snapshot: &TickSnapshot) {
        *self.shutdowns.lock().unwrap() += 1;
    }
}

/// 一套完整的测试替身
pub struct MockRig {
    pub sensor: MockSensor,
    pub left: MockMotor,
    pub right: MockMotor,
    pub tuning: MockTuning,
    pub events: MockEvents,
    pub notifier: MockNotifier,
    pub diagnostics: MockDiagnostics,
}

impl MockRig {
    pub fn new() -> Self {
        Self {
            sensor: MockSensor::new(),
            left: MockMotor::new(),
            right: MockMotor::new(),
            tuning: MockTuning::default(),
            events: MockEvents::default(),
            notifier: MockNotifier::default(),
            diagnostics: MockDiagnostics::default(),
        }
    }

    /// 创建挂接了全部替身的控制循环
    pub fn build(&self, config: &FollowerConfig) -> ControlLoop<MockSensor, MockMotor> {
        ControlLoop::new(
            self.sensor.clone(),
            self.left.clone(),
            self.right.clone(),
            config,
        )
        .unwrap()
        .with_tuning_channel(self.tuning.clone())
        .with_event_source(self.events.clone())
        .with_notifier(self.notifier.clone())
        .with_diagnostics(self.diagnostics.clone())
    }

    pub fn clear_motors(&self) {
        self.left.clear();
        self.right.clear();
    }
}
