//! Detection loop.
//!
//! `Core` is the device-free step function: given the current frame it runs
//! preprocessing, detection and the hysteresis counter, and says what to render and
//! whether an alert attempt is due. `Monitor` is the thin driver around it that owns
//! the frame source and display sink and hands attempts to the alert dispatcher.
//!
//! One cycle: acquire -> preprocess -> (armed) detect -> counter -> (maybe) attempt
//! -> present -> poll key -> mode control.

use anyhow::{Context, Result};
use std::time::{Duration, Instant};

use crate::alarm::{
    AlarmState, AlertAttempt, Control, Key, ModeController, Step, AREA_THRESHOLD,
    DEFAULT_COUNTER_CAP,
};
use crate::detect::{
    AnomalyScore, DifferenceMask, DimensionMismatch, MotionDetector, INTENSITY_DELTA,
};
use crate::display::{DisplaySink, RenderTarget, POLL_BUDGET};
use crate::frame::RawFrame;
use crate::ingest::{CaptureDevice, FrameSource};
use crate::notify::AlertSender;
use crate::preprocess;

const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// Tunables for one monitor run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonitorSettings {
    pub intensity_delta: u8,
    pub area_threshold: u64,
    pub counter_cap: u32,
    pub poll_budget: Duration,
    /// Stop after this many cycles (headless runs).
    pub max_cycles: Option<u64>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            intensity_delta: INTENSITY_DELTA,
            area_threshold: AREA_THRESHOLD,
            counter_cap: DEFAULT_COUNTER_CAP,
            poll_budget: POLL_BUDGET,
            max_cycles: None,
        }
    }
}

/// What a cycle wants on screen.
#[derive(Clone, Debug)]
pub enum Render {
    /// The raw frame (idle).
    Frame,
    /// The difference mask (armed).
    Mask(DifferenceMask),
}

/// Result of one `Core::tick`.
#[derive(Clone, Debug)]
pub struct Tick {
    pub cycle: u64,
    pub render: Render,
    /// Set only on armed cycles.
    pub score: Option<AnomalyScore>,
    /// Set only on armed cycles.
    pub step: Option<Step>,
    pub counter: u32,
    pub attempt: Option<AlertAttempt>,
}

// ----------------------------------------------------------------------------
// Core: device-free step function
// ----------------------------------------------------------------------------

pub struct Core {
    state: AlarmState,
    detector: MotionDetector,
    modes: ModeController,
    settings: MonitorSettings,
    cycle: u64,
}

impl Core {
    /// Seed the baseline from the first acquired frame.
    pub fn seed(first: &RawFrame, settings: MonitorSettings) -> Self {
        let baseline = preprocess::to_baseline_representation(first);
        log::debug!(
            "baseline seeded at {}x{}",
            baseline.width(),
            baseline.height()
        );
        Self {
            state: AlarmState::with_counter_cap(settings.counter_cap),
            detector: MotionDetector::new(baseline).with_delta(settings.intensity_delta),
            modes: ModeController::new(),
            settings,
            cycle: 0,
        }
    }

    pub fn state(&self) -> &AlarmState {
        &self.state
    }

    pub fn detector(&self) -> &MotionDetector {
        &self.detector
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// Number of ticks processed so far.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn is_terminated(&self) -> bool {
        self.modes.is_terminated()
    }

    /// Process one frame.
    ///
    /// Idle cycles leave the baseline and counter alone. Armed cycles score the
    /// comparison representation against the baseline (rolling it forward) and step
    /// the counter.
    pub fn tick(&mut self, frame: &RawFrame, now: Instant) -> Result<Tick, DimensionMismatch> {
        self.cycle += 1;
        if !self.state.mode.is_armed() {
            return Ok(Tick {
                cycle: self.cycle,
                render: Render::Frame,
                score: None,
                step: None,
                counter: self.state.counter.value(),
                attempt: None,
            });
        }

        let current = preprocess::to_comparison_representation(frame);
        let observation = self.detector.observe(current)?;
        let (step, attempt) = self.register(observation.score, now);
        Ok(Tick {
            cycle: self.cycle,
            render: Render::Mask(observation.mask),
            score: Some(observation.score),
            step: Some(step),
            counter: self.state.counter.value(),
            attempt,
        })
    }

    /// Feed one armed-cycle score into the counter.
    pub fn register(
        &mut self,
        score: AnomalyScore,
        now: Instant,
    ) -> (Step, Option<AlertAttempt>) {
        let anomaly = score.exceeds(self.settings.area_threshold);
        let step = self.state.counter.step(anomaly);
        log::trace!(
            "cycle {}: score={} anomaly={} counter={}",
            self.cycle,
            score,
            anomaly,
            self.state.counter.value()
        );
        let attempt = step.emits_alert().then(|| AlertAttempt {
            at: now,
            cycle: self.cycle,
            score,
            counter: self.state.counter.value(),
        });
        (step, attempt)
    }

    pub fn handle_key(&mut self, key: Option<Key>) -> Control {
        self.modes.handle(&mut self.state, key)
    }
}

// ----------------------------------------------------------------------------
// Monitor: device-bound driver
// ----------------------------------------------------------------------------

/// Totals for one `Monitor::run`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub armed_cycles: u64,
    pub attempts: u64,
    /// True when the run ended on the quit key rather than `max_cycles`.
    pub quit: bool,
}

pub struct Monitor<D: CaptureDevice, S: DisplaySink> {
    source: FrameSource<D>,
    sink: S,
    alerts: AlertSender,
    core: Core,
    summary: RunSummary,
}

impl<D: CaptureDevice, S: DisplaySink> Monitor<D, S> {
    /// Open the source and seed the baseline. Failing to get a first frame is fatal.
    pub fn start(
        mut source: FrameSource<D>,
        sink: S,
        alerts: AlertSender,
        settings: MonitorSettings,
    ) -> Result<Self> {
        source.open().context("open capture source")?;
        let first = source.next_frame().context("seed baseline")?;
        let core = Core::seed(&first, settings);
        log::info!(
            "monitor started on {} ({}x{}); press t to arm, q to quit",
            source.stats().device,
            first.width(),
            first.height()
        );
        Ok(Self {
            source,
            sink,
            alerts,
            core,
            summary: RunSummary::default(),
        })
    }

    pub fn core(&self) -> &Core {
        &self.core
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Run until quit (or `max_cycles`). Capture and dimension errors end the run.
    pub fn run(&mut self) -> Result<RunSummary> {
        let result = self.run_cycles();
        self.source.close();
        if let Err(e) = &result {
            log::error!("monitor stopped: {:#}", e);
        }
        result
    }

    fn run_cycles(&mut self) -> Result<RunSummary> {
        let mut last_health_log = Instant::now();
        let mut health_cycles = 0u64;

        while !self.core.is_terminated() {
            if let Some(max) = self.core.settings().max_cycles {
                if self.summary.cycles >= max {
                    break;
                }
            }

            let frame = self.source.next_frame().context("capture frame")?;
            let tick = self
                .core
                .tick(&frame, Instant::now())
                .context("compare frame against baseline")?;

            self.summary.cycles += 1;
            if tick.score.is_some() {
                self.summary.armed_cycles += 1;
            }
            if let Some(attempt) = tick.attempt {
                self.summary.attempts += 1;
                if !self.alerts.send(attempt) {
                    log::warn!(
                        "alert dispatcher unavailable; attempt for cycle {} dropped",
                        tick.cycle
                    );
                }
            }

            match &tick.render {
                Render::Frame => self.sink.present(RenderTarget::Frame(&frame))?,
                Render::Mask(mask) => self.sink.present(RenderTarget::Mask(mask))?,
            }

            let key = self.sink.poll_key(self.core.settings().poll_budget)?;
            if self.core.handle_key(key) == Control::Quit {
                self.summary.quit = true;
                break;
            }

            health_cycles += 1;
            if last_health_log.elapsed() >= HEALTH_LOG_INTERVAL {
                let elapsed = last_health_log.elapsed().as_secs_f64();
                log::info!(
                    "health: frames={} fps={:.1} mode={:?} counter={}",
                    self.source.stats().frames_captured,
                    health_cycles as f64 / elapsed,
                    self.core.state().mode,
                    tick.counter
                );
                last_health_log = Instant::now();
                health_cycles = 0;
            }
        }

        Ok(self.summary)
    }

    /// Tear down, returning the display sink.
    pub fn into_sink(self) -> S {
        let Monitor { sink, .. } = self;
        sink
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
