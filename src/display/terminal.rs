//! Terminal display sink.
//!
//! Keys arrive line-buffered on stdin (`t` + Enter toggles, `q` + Enter quits) and
//! Ctrl-C maps to quit. Instead of a window, a one-line status is redrawn on stderr.
//!
//! Installs the process-wide Ctrl-C handler; create at most one per process.

use anyhow::{anyhow, Result};
use std::io::BufRead;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::{Duration, Instant};

use super::{DisplaySink, Key, RenderTarget};

const REDRAW_INTERVAL: Duration = Duration::from_millis(500);

pub struct TerminalDisplay {
    keys: mpsc::Receiver<Key>,
    last_draw: Option<Instant>,
    presented: u64,
}

impl TerminalDisplay {
    pub fn spawn() -> Result<Self> {
        let (tx, rx) = mpsc::channel();

        let interrupt = tx.clone();
        ctrlc::set_handler(move || {
            let _ = interrupt.send(Key::Quit);
        })
        .map_err(|e| anyhow!("error setting Ctrl-C handler: {}", e))?;

        std::thread::Builder::new()
            .name("stdin-keys".to_string())
            .spawn(move || {
                let stdin = std::io::stdin();
                forward_keys(stdin.lock(), &tx);
            })
            .map_err(|e| anyhow!("failed to spawn key reader: {}", e))?;

        Ok(Self {
            keys: rx,
            last_draw: None,
            presented: 0,
        })
    }
}

impl DisplaySink for TerminalDisplay {
    fn present(&mut self, target: RenderTarget<'_>) -> Result<()> {
        self.presented += 1;
        let due = self
            .last_draw
            .map_or(true, |last| last.elapsed() >= REDRAW_INTERVAL);
        if !due {
            return Ok(());
        }
        eprint!("\r{:<60}", status_line(&target, self.presented));
        self.last_draw = Some(Instant::now());
        Ok(())
    }

    fn poll_key(&mut self, timeout: Duration) -> Result<Option<Key>> {
        match self.keys.recv_timeout(timeout) {
            Ok(key) => Ok(Some(key)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(anyhow!("key input channel closed")),
        }
    }
}

fn status_line(target: &RenderTarget<'_>, presented: u64) -> String {
    let (width, height) = target.dimensions();
    match target {
        RenderTarget::Frame(_) => format!("[idle ] frame #{} {}x{}", presented, width, height),
        RenderTarget::Mask(mask) => {
            let total = (width as usize * height as usize).max(1);
            let ratio = mask.lit_count() as f64 * 100.0 / total as f64;
            format!(
                "[armed] frame #{} {}x{} changed {:.2}%",
                presented, width, height, ratio
            )
        }
    }
}

/// Forward every character of every input line until EOF or the receiver goes away.
fn forward_keys(reader: impl BufRead, tx: &mpsc::Sender<Key>) {
    for line in reader.lines() {
        let Ok(line) = line else {
            break;
        };
        for c in line.trim().chars() {
            if tx.send(Key::from_char(c)).is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::RawFrame;

    #[test]
    fn input_lines_become_keys() {
        let (tx, rx) = mpsc::channel();
        forward_keys(std::io::Cursor::new("t\n x \nq\n"), &tx);
        let keys: Vec<Key> = rx.try_iter().collect();
        assert_eq!(keys, vec![Key::Toggle, Key::Other('x'), Key::Quit]);
    }

    #[test]
    fn idle_status_shows_frame_size() {
        let frame = RawFrame::from_fn(500, 375, |_, _| [0, 0, 0]);
        let line = status_line(&RenderTarget::Frame(&frame), 3);
        assert_eq!(line, "[idle ] frame #3 500x375");
    }
}
