//! 控制台输入
//!
//! 专用输入线程 + 通道：读取线程阻塞在 `read_line` 上，
//! 控制循环一侧通过 `try_recv` 非阻塞地取走输入，不会拖慢采样。
//!
//! - `run` / `mode` / `cal` / `debug` 关键字 -> [`ControlEvent`]
//! - 其余非空行 -> 调参通道（由控制核心解析 `p/i/d/s<float>`）

use crate::{ControlEvent, EventSource, TuningChannel};
use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded};
use std::io::BufRead;
use std::thread;

/// 通道容量（控制循环每个周期都会消费，容量只用于吸收突发输入）
const CHANNEL_CAPACITY: usize = 64;

/// 控制台调参通道
#[derive(Debug)]
pub struct ConsoleTuning {
    rx: Receiver<String>,
}

impl TuningChannel for ConsoleTuning {
    fn poll_line(&mut self) -> Option<String> {
        match self.rx.try_recv() {
            Ok(line) => Some(line),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}

/// 控制台事件源
#[derive(Debug)]
pub struct ConsoleEvents {
    rx: Receiver<ControlEvent>,
}

impl EventSource for ConsoleEvents {
    fn poll_event(&mut self) -> Option<ControlEvent> {
        self.rx.try_recv().ok()
    }
}

/// 从任意行输入启动读取线程
///
/// 输入结束（EOF）或接收端全部释放时线程退出。
pub fn spawn_reader<R>(reader: R) -> (ConsoleTuning, ConsoleEvents)
where
    R: BufRead + Send + 'static,
{
    let (tuning_tx, tuning_rx) = bounded(CHANNEL_CAPACITY);
    let (event_tx, event_rx) = bounded(CHANNEL_CAPACITY);

    let spawned = thread::Builder::new()
        .name("linebot-console".to_string())
        .spawn(move || reader_loop(reader, tuning_tx, event_tx));

    if let Err(e) = spawned {
        // 没有读取线程时两个通道都立即断开，控制循环照常运行
        tracing::error!("Failed to spawn console reader thread: {}", e);
    }

    (
        ConsoleTuning { rx: tuning_rx },
        ConsoleEvents { rx: event_rx },
    )
}

/// 从标准输入启动读取线程
pub fn stdin() -> (ConsoleTuning, ConsoleEvents) {
    spawn_reader(std::io::BufReader::new(std::io::stdin()))
}

fn reader_loop<R: BufRead>(
    mut reader: R,
    tuning_tx: Sender<String>,
    event_tx: Sender<ControlEvent>,
) {
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => {
                tracing::debug!("Console input closed");
                return;
            },
            Ok(_) => {},
            Err(e) => {
                tracing::warn!("Console read error: {}", e);
                return;
            },
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let sent = match trimmed.parse::<ControlEvent>() {
            Ok(event) => event_tx.send(event).is_ok(),
            Err(()) => tuning_tx.send(trimmed.to_string()).is_ok(),
        };
        if !sent {
            return;
        }
    }
}
