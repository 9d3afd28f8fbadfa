//! Presentation and operator input.
//!
//! Each cycle the loop presents one image (the raw frame while idle, the difference
//! mask while armed) and then polls for a key within `POLL_BUDGET`, which also paces
//! the loop.

pub mod scripted;
pub mod terminal;

pub use scripted::{Presented, ScriptedDisplay};
pub use terminal::TerminalDisplay;

use anyhow::Result;
use std::time::Duration;

pub use crate::alarm::Key;
use crate::detect::DifferenceMask;
use crate::frame::RawFrame;

/// Per-cycle key poll budget.
pub const POLL_BUDGET: Duration = Duration::from_millis(30);

/// The image chosen for this cycle.
#[derive(Clone, Copy)]
pub enum RenderTarget<'a> {
    Frame(&'a RawFrame),
    Mask(&'a DifferenceMask),
}

impl RenderTarget<'_> {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            RenderTarget::Frame(frame) => frame.dimensions(),
            RenderTarget::Mask(mask) => mask.dimensions(),
        }
    }
}

pub trait DisplaySink {
    fn present(&mut self, target: RenderTarget<'_>) -> Result<()>;

    /// Wait up to `timeout` for a key press.
    fn poll_key(&mut self, timeout: Duration) -> Result<Option<Key>>;
}
