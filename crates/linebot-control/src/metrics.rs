//! 循环频率统计
//!
//! 固定时间窗口统计：每个窗口结束时计算 `ticks / elapsed`，然后从零开始新窗口。
//! 另外累计总周期数和无效读数次数（诊断用）。

use std::time::{Duration, Instant};

/// 默认统计窗口（1 秒）
pub const DEFAULT_METRICS_WINDOW: Duration = Duration::from_secs(1);

/// 循环频率统计
#[derive(Debug, Clone)]
pub struct LoopMetrics {
    window: Duration,
    // 当前窗口内的周期数
    ticks: u64,
    window_start: Instant,
    last_frequency_hz: Option<f64>,

    total_ticks: u64,
    invalid_readings: u64,
}

impl Default for LoopMetrics {
    fn default() -> Self {
        Self::new(DEFAULT_METRICS_WINDOW)
    }
}

impl LoopMetrics {
    /// 创建统计实例（窗口从现在开始）
    pub fn new(window: Duration) -> Self {
        Self::starting_at(window, Instant::now())
    }

    /// 以指定时刻作为窗口起点（测试用）
    pub fn starting_at(window: Duration, now: Instant) -> Self {
        Self {
            window,
            ticks: 0,
            window_start: now,
            last_frequency_hz: None,
            total_ticks: 0,
            invalid_readings: 0,
        }
    }

    /// 记录一个周期
    ///
    /// 窗口结束时返回该窗口的频率（Hz）。
    pub fn record_tick(&mut self) -> Option<f64> {
        self.record_tick_at(Instant::now())
    }

    /// 在指定时刻记录一个周期
    pub fn record_tick_at(&mut self, now: Instant) -> Option<f64> {
        self.ticks += 1;
        self.total_ticks += 1;

        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.window {
            return None;
        }

        // 避免除零（至少 1ms）
        let elapsed_secs = elapsed.as_secs_f64().max(0.001);
        let frequency = self.ticks as f64 / elapsed_secs;

        self.last_frequency_hz = Some(frequency);
        self.ticks = 0;
        self.window_start = now;
        Some(frequency)
    }

    /// 记录一次无效读数
    pub fn record_invalid(&mut self) {
        self.invalid_readings += 1;
    }

    /// 重置统计窗口（保留累计值）
    pub fn reset(&mut self) {
        self.ticks = 0;
        self.window_start = Instant::now();
        self.last_frequency_hz = None;
    }

    /// 最近一个完整窗口的频率
    pub fn last_frequency_hz(&self) -> Option<f64> {
        self.last_frequency_hz
    }

    /// 当前窗口内的周期数
    pub fn window_ticks(&self) -> u64 {
        self.ticks
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    pub fn invalid_readings(&self) -> u64 {
        self.invalid_readings
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_frequency_before_window_elapses() {
        let start = Instant::now();
        let mut metrics = LoopMetrics::starting_at(Duration::from_secs(1), start);

        for i in 1..=10 {
            assert_eq!(metrics.record_tick_at(start + Duration::from_millis(i * 10)), None);
        }
        assert_eq!(metrics.window_ticks(), 10);
        assert_eq!(metrics.last_frequency_hz(), None);
    }

    #[test]
    fn test_frequency_reported_and_window_restarts() {
        let start = Instant::now();
        let mut metrics = LoopMetrics::starting_at(Duration::from_secs(1), start);

        for i in 1..200 {
            metrics.record_tick_at(start + Duration::from_millis(i * 5));
        }
        // 第 200 个周期恰好在 1 秒处
        let hz = metrics.record_tick_at(start + Duration::from_secs(1)).unwrap();
        assert!((hz - 200.0).abs() < 1e-9);
        assert_eq!(metrics.last_frequency_hz(), Some(hz));
        assert_eq!(metrics.window_ticks(), 0);
        assert_eq!(metrics.total_ticks(), 200);

        // 新窗口从零开始
        metrics.record_tick_at(start + Duration::from_millis(1500));
        assert_eq!(metrics.window_ticks(), 1);
    }

    #[test]
    fn test_reset_keeps_totals() {
        let mut metrics = LoopMetrics::default();
        metrics.record_tick();
        metrics.record_invalid();
        metrics.reset();

        assert_eq!(metrics.window_ticks(), 0);
        assert_eq!(metrics.total_ticks(), 1);
        assert_eq!(metrics.invalid_readings(), 1);
        assert_eq!(metrics.window(), DEFAULT_METRICS_WINDOW);
    }
}
