//! Alarm state: operating mode, hysteresis counter, alert throttle.
//!
//! - `AlarmState`: mode and counter, owned by the detection loop.
//! - `HysteresisCounter`: debounces per-cycle anomaly flags into alert attempts.
//! - `AlertThrottle`: minimum-interval gate, owned by the alert dispatcher.
//! - `ModeController`: key-driven Idle/Armed transitions and quit.

pub mod hysteresis;
pub mod mode;
pub mod throttle;

pub use hysteresis::{HysteresisCounter, Step, AREA_THRESHOLD, DEFAULT_COUNTER_CAP};
pub use mode::{Control, Key, Mode, ModeController};
pub use throttle::{AlertThrottle, ALERT_INTERVAL};

use std::time::Instant;

use crate::detect::AnomalyScore;

/// Loop-owned alarm state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AlarmState {
    pub mode: Mode,
    pub counter: HysteresisCounter,
}

impl AlarmState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_counter_cap(cap: u32) -> Self {
        Self {
            mode: Mode::Idle,
            counter: HysteresisCounter::with_cap(cap),
        }
    }
}

/// Fire-and-forget request to notify, emitted when the counter drains.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AlertAttempt {
    pub at: Instant,
    pub cycle: u64,
    pub score: AnomalyScore,
    /// Counter value after the draining step.
    pub counter: u32,
}
