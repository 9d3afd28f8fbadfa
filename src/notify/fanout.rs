use anyhow::{anyhow, Result};

use super::{Alert, Notifier};

/// Delivers each alert to every inner notifier.
///
/// A failing notifier does not prevent delivery to the rest; the returned error
/// lists every failure.
#[derive(Default)]
pub struct MultiNotifier {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl MultiNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<N: Notifier + 'static>(mut self, notifier: N) -> Self {
        self.push(notifier);
        self
    }

    pub fn push<N: Notifier + 'static>(&mut self, notifier: N) {
        self.notifiers.push(Box::new(notifier));
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl Notifier for MultiNotifier {
    fn name(&self) -> &'static str {
        "multi"
    }

    fn notify(&mut self, alert: &Alert) -> Result<()> {
        let failures: Vec<String> = self
            .notifiers
            .iter_mut()
            .filter_map(|n| n.notify(alert).err().map(|e| format!("{}: {:#}", n.name(), e)))
            .collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(anyhow!("{}", failures.join("; ")))
        }
    }
}
