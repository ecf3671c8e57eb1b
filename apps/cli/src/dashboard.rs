//! 文本仪表盘
//!
//! 把 [`TickSnapshot`] 渲染成终端文本：每个通道一根柱子，柱高为
//! `(max_value - v) / max_value`（越暗越高），下方用 `^` 标出线位置，再加几行状态。
//!
//! ```text
//!     #  #
//!     #  #  #
//!  .  #  #  #  .
//! ------------------------
//!        ^
//! Line Pos: 4.30
//! Mode: CAL | State: Run
//! Kp: 5.00 Ki: 0.00 Kd: 5.00 | Base: 10.0
//! L: 12.3 R: 7.7 | Scale: 1.00
//! Freq: 812.4 Hz
//! ```

use linebot_control::{Diagnostics, LinePosition, TickSnapshot};
use linebot_hal::SENSOR_COUNT;
use std::fmt::Write as _;
use std::io::{self, Write};
use std::time::{Duration, Instant};

/// 柱状图高度（行）
const BAR_HEIGHT: usize = 6;
/// 每根柱子的字符宽度
const BAR_WIDTH: usize = 3;
/// 最小刷新间隔
const DEFAULT_REFRESH: Duration = Duration::from_millis(100);

/// 渲染一帧
///
/// `inverted` 时左右镜像显示（与反向安装配合，柱子顺序和机器人上的物理顺序一致）。
pub fn render(snapshot: &TickSnapshot, inverted: bool) -> String {
    let mut out = String::new();

    match (snapshot.samples, snapshot.max_value) {
        (Some(samples), Some(max_value)) if max_value > 0 => {
            render_bars(&mut out, &samples, max_value, inverted);
            render_marker(&mut out, snapshot, inverted);
        },
        _ => out.push_str("Invalid sensor data\n"),
    }

    match snapshot.position.value() {
        Some(p) => {
            let _ = writeln!(out, "Line Pos: {:.2}", p);
        },
        None => out.push_str("Line Pos: N/A\n"),
    }
    let _ = writeln!(out, "Mode: {} | State: {}", snapshot.mode, snapshot.state);
    let _ = writeln!(
        out,
        "Kp: {:.2} Ki: {:.2} Kd: {:.2} | Base: {:.1}",
        snapshot.gains.kp, snapshot.gains.ki, snapshot.gains.kd, snapshot.base_speed
    );
    let _ = writeln!(
        out,
        "L: {} R: {} | Scale: {:.2}",
        format_speed(snapshot.wheel_speeds.0),
        format_speed(snapshot.wheel_speeds.1),
        snapshot.scaling_factor
    );
    match snapshot.frequency_hz {
        Some(hz) => {
            let _ = writeln!(out, "Freq: {:.1} Hz", hz);
        },
        None => out.push_str("Freq: --\n"),
    }
    out
}

fn format_speed(speed: Option<f64>) -> String {
    speed.map_or_else(|| "--".to_string(), |v| format!("{:.1}", v))
}

/// 显示列 -> 原始下标
fn display_order(inverted: bool) -> impl Iterator<Item = usize> {
    (0..SENSOR_COUNT).map(move |col| if inverted { SENSOR_COUNT - 1 - col } else { col })
}

fn render_bars(out: &mut String, samples: &[u16; SENSOR_COUNT], max_value: u16, inverted: bool) {
    let heights: Vec<usize> = display_order(inverted)
        .map(|i| {
            let v = samples[i].min(max_value);
            let fraction = f64::from(max_value - v) / f64::from(max_value);
            (fraction * BAR_HEIGHT as f64).round() as usize
        })
        .collect();

    for row in (1..=BAR_HEIGHT).rev() {
        let line: String = heights
            .iter()
            .map(|&h| if h >= row { " # " } else { "   " })
            .collect();
        out.push_str(line.trim_end());
        out.push('\n');
    }
    // 完全没看到暗色的通道用 '.' 标在底部
    let base: String = heights
        .iter()
        .map(|&h| if h == 0 { " . " } else { " # " })
        .collect();
    out.push_str(base.trim_end());
    out.push('\n');
    out.push_str(&"-".repeat(SENSOR_COUNT * BAR_WIDTH));
    out.push('\n');
}

fn render_marker(out: &mut String, snapshot: &TickSnapshot, inverted: bool) {
    let LinePosition::Detected(p) = snapshot.position else {
        out.push('\n');
        return;
    };

    // 线位置按安装方向校正后的下标计，先换回原始下标，再换成显示列
    let oriented = (p.round() as usize).clamp(1, SENSOR_COUNT) - 1;
    let raw = if snapshot.reversed {
        SENSOR_COUNT - 1 - oriented
    } else {
        oriented
    };
    let column = if inverted { SENSOR_COUNT - 1 - raw } else { raw };

    out.push_str(&" ".repeat(column * BAR_WIDTH + 1));
    out.push_str("^\n");
}

/// 终端仪表盘（实现 [`Diagnostics`]）
pub struct TextDashboard<W: Write> {
    out: W,
    inverted: bool,
    clear_screen: bool,
    refresh: Duration,
    last_render: Option<Instant>,
}

impl TextDashboard<io::Stdout> {
    /// 输出到标准输出（每帧清屏）
    pub fn stdout(inverted: bool) -> Self {
        Self {
            out: io::stdout(),
            inverted,
            clear_screen: true,
            refresh: DEFAULT_REFRESH,
            last_render: None,
        }
    }
}

impl<W: Write> TextDashboard<W> {
    /// 输出到任意 writer（不清屏）
    pub fn new(out: W, inverted: bool, refresh: Duration) -> Self {
        Self {
            out,
            inverted,
            clear_screen: false,
            refresh,
            last_render: None,
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    fn write_frame(&mut self, snapshot: &TickSnapshot) -> io::Result<()> {
        if self.clear_screen {
            // ANSI：清屏并回到左上角
            self.out.write_all(b"\x1b[2J\x1b[H")?;
        }
        self.out.write_all(render(snapshot, self.inverted).as_bytes())?;
        self.out.flush()
    }
}

impl<W: Write> Diagnostics for TextDashboard<W> {
    fn publish(&mut self, snapshot: &TickSnapshot) {
        let now = Instant::now();
        if let Some(last) = self.last_render
            && now.duration_since(last) < self.refresh
        {
            return;
        }
        self.last_render = Some(now);

        if let Err(e) = self.write_frame(snapshot) {
            tracing::debug!("Dashboard write failed: {}", e);
        }
    }

    fn on_shutdown(&mut self, final_snapshot: &TickSnapshot) {
        if let Err(e) = self.write_frame(final_snapshot) {
            tracing::debug!("Dashboard write failed: {}", e);
        }
    }
}
