use anyhow::{anyhow, Result};
use std::sync::{Arc, Mutex};

use super::{Alert, Notifier};

/// Keeps every alert it receives.
#[derive(Default)]
pub struct RecordingNotifier {
    alerts: RecordedAlerts,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared view of the recorded alerts; stays valid after the notifier moves.
    pub fn alerts(&self) -> RecordedAlerts {
        self.alerts.clone()
    }
}

impl Notifier for RecordingNotifier {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn notify(&mut self, alert: &Alert) -> Result<()> {
        self.alerts
            .inner
            .lock()
            .map_err(|_| anyhow!("recorded alerts lock poisoned"))?
            .push(alert.clone());
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct RecordedAlerts {
    inner: Arc<Mutex<Vec<Alert>>>,
}

impl RecordedAlerts {
    pub fn snapshot(&self) -> Result<Vec<Alert>> {
        let guard = self
            .inner
            .lock()
            .map_err(|_| anyhow!("recorded alerts lock poisoned"))?;
        Ok(guard.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
