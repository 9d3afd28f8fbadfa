//! Alert delivery.
//!
//! Alert attempts are produced by the detection loop and consumed by exactly one
//! dispatcher thread, which owns the `AlertThrottle` and the `Notifier`. The loop
//! never waits on a notifier: `AlertSender::send` only enqueues.
//!
//! Notifiers:
//! - `ConsoleNotifier`: one line on stdout per fired alert
//! - `RecordingNotifier`: keeps fired alerts in memory (tests, demo)
//! - `MultiNotifier`: fans out to several notifiers
//! - `WebhookNotifier`: JSON POST to an HTTP endpoint (feature: notify-webhook)

pub mod console;
pub mod fanout;
pub mod recording;
#[cfg(feature = "notify-webhook")]
pub mod webhook;

pub use console::ConsoleNotifier;
pub use fanout::MultiNotifier;
pub use recording::{RecordedAlerts, RecordingNotifier};
#[cfg(feature = "notify-webhook")]
pub use webhook::WebhookNotifier;

use anyhow::{anyhow, Result};
use serde::Serialize;
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::alarm::{AlertAttempt, AlertThrottle};
use crate::config::AlertSettings;

/// Text carried by every motion alert.
pub const MOTION_MESSAGE: &str = "MOTION DETECTED";

/// What a notifier receives for a fired alert.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub message: String,
    pub cycle: u64,
    pub counter: u32,
    pub score: u64,
    pub unix_time_s: u64,
}

impl Alert {
    pub fn from_attempt(attempt: &AlertAttempt) -> Self {
        let unix_time_s = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            message: MOTION_MESSAGE.to_string(),
            cycle: attempt.cycle,
            counter: attempt.counter,
            score: attempt.score.value(),
            unix_time_s,
        }
    }
}

/// Pluggable notification sink.
///
/// Called from the dispatcher thread only, at most once per throttle window.
pub trait Notifier: Send {
    fn name(&self) -> &'static str;

    fn notify(&mut self, alert: &Alert) -> Result<()>;
}

impl Notifier for Box<dyn Notifier> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn notify(&mut self, alert: &Alert) -> Result<()> {
        (**self).notify(alert)
    }
}

/// Build the notifier described by the alert settings.
pub fn build_notifier(settings: &AlertSettings) -> Result<Box<dyn Notifier>> {
    let mut multi = MultiNotifier::new();
    if settings.console {
        multi.push(ConsoleNotifier::stdout());
    }
    if let Some(url) = &settings.webhook_url {
        #[cfg(feature = "notify-webhook")]
        {
            multi.push(WebhookNotifier::new(url, settings.webhook_timeout)?);
        }
        #[cfg(not(feature = "notify-webhook"))]
        {
            return Err(anyhow!(
                "webhook notifier for {} requires the notify-webhook feature",
                url
            ));
        }
    }
    if multi.is_empty() {
        log::warn!("no notifier configured; fired alerts are only logged");
    }
    Ok(Box::new(multi))
}

// ----------------------------------------------------------------------------
// Dispatcher
// ----------------------------------------------------------------------------

/// Producer handle. Cloneable; `send` never blocks.
#[derive(Clone, Debug)]
pub struct AlertSender {
    tx: mpsc::Sender<AlertAttempt>,
}

impl AlertSender {
    /// A sender wired to a bare receiver, for driving the loop without a dispatcher.
    pub fn channel() -> (Self, mpsc::Receiver<AlertAttempt>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }

    /// Enqueue an attempt. Returns false when the consumer is gone.
    pub fn send(&self, attempt: AlertAttempt) -> bool {
        self.tx.send(attempt).is_ok()
    }
}

/// Counters reported by the dispatcher on shutdown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub attempts: u64,
    pub fired: u64,
    pub suppressed: u64,
    pub failed: u64,
}

/// Single consumer of alert attempts.
pub struct AlertDispatcher {
    sender: Option<AlertSender>,
    join: Option<JoinHandle<DispatchStats>>,
}

impl AlertDispatcher {
    pub fn spawn<N: Notifier + 'static>(notifier: N, throttle: AlertThrottle) -> Result<Self> {
        let (sender, rx) = AlertSender::channel();
        let join = std::thread::Builder::new()
            .name("alert-dispatch".to_string())
            .spawn(move || consume(rx, notifier, throttle))
            .map_err(|e| anyhow!("failed to spawn alert dispatcher: {}", e))?;
        Ok(Self {
            sender: Some(sender),
            join: Some(join),
        })
    }

    pub fn sender(&self) -> Result<AlertSender> {
        self.sender
            .clone()
            .ok_or_else(|| anyhow!("alert dispatcher already shut down"))
    }

    /// Stop accepting attempts and wait for the queue to drain.
    ///
    /// Returns once every outstanding `AlertSender` clone has been dropped.
    pub fn shutdown(mut self) -> Result<DispatchStats> {
        self.sender = None;
        let join = self
            .join
            .take()
            .ok_or_else(|| anyhow!("alert dispatcher already joined"))?;
        join.join()
            .map_err(|_| anyhow!("alert dispatcher thread panicked"))
    }
}

fn consume<N: Notifier>(
    rx: mpsc::Receiver<AlertAttempt>,
    mut notifier: N,
    mut throttle: AlertThrottle,
) -> DispatchStats {
    let mut stats = DispatchStats::default();
    for attempt in rx {
        stats.attempts += 1;
        if !throttle.attempt(attempt.at) {
            stats.suppressed += 1;
            log::debug!(
                "alert attempt (cycle {}) suppressed by throttle",
                attempt.cycle
            );
            continue;
        }

        stats.fired += 1;
        let alert = Alert::from_attempt(&attempt);
        match notifier.notify(&alert) {
            Ok(()) => log::info!(
                "alert fired: cycle={} counter={} score={} via {}",
                alert.cycle,
                alert.counter,
                alert.score,
                notifier.name()
            ),
            Err(e) => {
                stats.failed += 1;
                log::warn!("notifier {} failed: {:#}", notifier.name(), e);
            }
        }
    }
    log::debug!(
        "alert dispatcher stopped: {} attempts, {} fired",
        stats.attempts,
        stats.fired
    );
    stats
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::AnomalyScore;
    use std::time::{Duration, Instant};

    struct FailingNotifier;

    impl Notifier for FailingNotifier {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn notify(&mut self, _alert: &Alert) -> Result<()> {
            Err(anyhow!("actuator offline"))
        }
    }

    fn attempt(at: Instant, cycle: u64) -> AlertAttempt {
        AlertAttempt {
            at,
            cycle,
            score: AnomalyScore(0),
            counter: 1,
        }
    }

    #[test]
    fn dispatcher_throttles_attempts() -> Result<()> {
        let recorder = RecordingNotifier::new();
        let alerts = recorder.alerts();
        let dispatcher = AlertDispatcher::spawn(recorder, AlertThrottle::new())?;
        let sender = dispatcher.sender()?;

        let t0 = Instant::now();
        assert!(sender.send(attempt(t0, 1)));
        assert!(sender.send(attempt(t0 + Duration::from_secs(3), 2)));
        assert!(sender.send(attempt(t0 + Duration::from_secs(11), 3)));
        drop(sender);

        let stats = dispatcher.shutdown()?;
        assert_eq!(stats.attempts, 3);
        assert_eq!(stats.fired, 2);
        assert_eq!(stats.suppressed, 1);

        let fired: Vec<u64> = alerts.snapshot()?.iter().map(|a| a.cycle).collect();
        assert_eq!(fired, vec![1, 3]);
        Ok(())
    }

    #[test]
    fn notifier_failures_stay_in_dispatcher() -> Result<()> {
        let dispatcher = AlertDispatcher::spawn(FailingNotifier, AlertThrottle::new())?;
        let sender = dispatcher.sender()?;
        assert!(sender.send(attempt(Instant::now(), 1)));
        drop(sender);

        let stats = dispatcher.shutdown()?;
        assert_eq!(stats.fired, 1);
        assert_eq!(stats.failed, 1);
        Ok(())
    }

    #[test]
    fn alert_carries_attempt_details() {
        let alert = Alert::from_attempt(&AlertAttempt {
            at: Instant::now(),
            cycle: 42,
            score: AnomalyScore(765),
            counter: 3,
        });
        assert_eq!(alert.message, MOTION_MESSAGE);
        assert_eq!(alert.cycle, 42);
        assert_eq!(alert.score, 765);
        assert_eq!(alert.counter, 3);
        assert!(alert.unix_time_s > 0);
    }

    #[test]
    fn bare_channel_collects_attempts() {
        let (sender, rx) = AlertSender::channel();
        assert!(sender.send(attempt(Instant::now(), 9)));
        assert_eq!(rx.try_recv().map(|a| a.cycle).ok(), Some(9));
        drop(rx);
        assert!(!sender.send(attempt(Instant::now(), 10)));
    }

    #[test]
    fn console_only_settings_build() -> Result<()> {
        let notifier = build_notifier(&AlertSettings::default())?;
        assert_eq!(notifier.name(), "multi");
        Ok(())
    }
}
