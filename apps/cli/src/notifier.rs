//! 控制台播报

use linebot_hal::Notifier;
use std::io::{self, Write};

/// 把播报打印到终端，同时写入日志
pub struct ConsoleNotifier<W: Write> {
    out: W,
}

impl ConsoleNotifier<io::Stdout> {
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl Default for ConsoleNotifier<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> ConsoleNotifier<W> {
    pub fn with_writer(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Notifier for ConsoleNotifier<W> {
    fn announce(&mut self, message: &str) {
        tracing::info!(target: "linebot::announce", "{}", message);
        // 终端不可写时只保留日志
        let _ = writeln!(self.out, "🔊 {}", message);
        let _ = self.out.flush();
    }
}
