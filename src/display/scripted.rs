use anyhow::Result;
use std::collections::HashMap;
use std::time::Duration;

use super::{DisplaySink, Key, RenderTarget};

/// What a `ScriptedDisplay` was asked to show.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Presented {
    Frame { width: u32, height: u32 },
    Mask { width: u32, height: u32, lit: usize },
}

/// Headless sink with a fixed key script.
///
/// Keys are keyed by poll number: the key scheduled for `n` is returned by the
/// `n`-th call to `poll_key` (1-based). Polls return immediately.
#[derive(Debug, Default)]
pub struct ScriptedDisplay {
    keys: HashMap<u64, Key>,
    polls: u64,
    presented: Vec<Presented>,
}

impl ScriptedDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_at(mut self, poll: u64, key: Key) -> Self {
        self.keys.insert(poll, key);
        self
    }

    pub fn presented(&self) -> &[Presented] {
        &self.presented
    }

    pub fn polls(&self) -> u64 {
        self.polls
    }
}

impl DisplaySink for ScriptedDisplay {
    fn present(&mut self, target: RenderTarget<'_>) -> Result<()> {
        let (width, height) = target.dimensions();
        let entry = match target {
            RenderTarget::Frame(_) => Presented::Frame { width, height },
            RenderTarget::Mask(mask) => Presented::Mask {
                width,
                height,
                lit: mask.lit_count(),
            },
        };
        self.presented.push(entry);
        Ok(())
    }

    fn poll_key(&mut self, _timeout: Duration) -> Result<Option<Key>> {
        self.polls += 1;
        Ok(self.keys.remove(&self.polls))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::RawFrame;

    #[test]
    fn keys_follow_poll_numbers() -> Result<()> {
        let mut display = ScriptedDisplay::new()
            .key_at(2, Key::Toggle)
            .key_at(3, Key::Quit);
        assert_eq!(display.poll_key(Duration::ZERO)?, None);
        assert_eq!(display.poll_key(Duration::ZERO)?, Some(Key::Toggle));
        assert_eq!(display.poll_key(Duration::ZERO)?, Some(Key::Quit));
        assert_eq!(display.poll_key(Duration::ZERO)?, None);
        Ok(())
    }

    #[test]
    fn records_presented_frames() -> Result<()> {
        let frame = RawFrame::from_fn(4, 3, |_, _| [0, 0, 0]);
        let mut display = ScriptedDisplay::new();
        display.present(RenderTarget::Frame(&frame))?;
        assert_eq!(
            display.presented(),
            &[Presented::Frame {
                width: 4,
                height: 3
            }]
        );
        Ok(())
    }
}
