//! Motion Sentry
//!
//! Watches a live video feed and raises a debounced, rate-limited alert when sustained
//! pixel-level change is detected against a rolling reference frame.
//!
//! # Architecture
//!
//! Per cycle: acquire a frame, convert it to a blurred grayscale representation, and
//! (while armed) threshold its difference against the baseline. The anomaly score
//! feeds a saturating hysteresis counter; every cycle in which the counter drains
//! emits an alert attempt. Attempts go to a single dispatcher thread that applies a
//! ten-second throttle before calling the notifier.
//!
//! # Module Structure
//!
//! - `frame`: `RawFrame` (normalized RGB) and `Frame` (grayscale)
//! - `ingest`: capture devices and the canonical-width `FrameSource`
//! - `preprocess`: grayscale + Gaussian blur profiles
//! - `detect`: difference mask, anomaly score, rolling-baseline detector
//! - `alarm`: mode, hysteresis counter, alert throttle, mode controller
//! - `notify`: alert dispatcher and notifiers
//! - `display`: display sinks and key polling
//! - `pipeline`: the per-cycle step function and the device-bound driver
//! - `config`: file + environment configuration

pub mod alarm;
pub mod config;
pub mod detect;
pub mod display;
pub mod frame;
pub mod ingest;
pub mod notify;
pub mod pipeline;
pub mod preprocess;

pub use alarm::{
    AlarmState, AlertAttempt, AlertThrottle, Control, HysteresisCounter, Key, Mode,
    ModeController, Step, ALERT_INTERVAL, AREA_THRESHOLD, DEFAULT_COUNTER_CAP,
};
pub use config::SentryConfig;
pub use detect::{
    AnomalyScore, DifferenceMask, DimensionMismatch, MotionDetector, INTENSITY_DELTA, MASK_ON,
};
pub use display::{DisplaySink, Presented, RenderTarget, ScriptedDisplay, TerminalDisplay};
pub use frame::{Frame, RawFrame, CANONICAL_WIDTH};
pub use ingest::{
    open_device, CaptureDevice, CaptureError, FrameSource, PixelFormat, RawCapture, Scene,
    SceneScript, SyntheticConfig, SyntheticDevice,
};
pub use notify::{
    Alert, AlertDispatcher, AlertSender, ConsoleNotifier, DispatchStats, MultiNotifier, Notifier,
    RecordingNotifier,
};
pub use pipeline::{Core, Monitor, MonitorSettings, Render, RunSummary, Tick};
