//! HTTP webhook notifier.
//!
//! POSTs each fired alert as a JSON object to a configured endpoint, e.g. a relay
//! service in front of a siren or actuator. Only http(s) URLs are accepted.

use anyhow::{anyhow, Context, Result};
use std::time::Duration;

use super::{Alert, Notifier};

pub struct WebhookNotifier {
    url: String,
    agent: ureq::Agent,
}

impl WebhookNotifier {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(anyhow!("webhook url must be http(s): {}", url));
        }
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Ok(Self {
            url: url.to_string(),
            agent,
        })
    }
}

impl Notifier for WebhookNotifier {
    fn name(&self) -> &'static str {
        "webhook"
    }

    fn notify(&mut self, alert: &Alert) -> Result<()> {
        let body = serde_json::to_string(alert).context("encode alert")?;
        match self
            .agent
            .post(&self.url)
            .set("Content-Type", "application/json")
            .send_string(&body)
        {
            Ok(_) => Ok(()),
            // ureq reports every non-2xx answer as a status error.
            Err(ureq::Error::Status(code, _)) => {
                Err(anyhow!("webhook {} answered {}", self.url, code))
            }
            Err(err) => Err(err).with_context(|| format!("post alert to {}", self.url)),
        }
    }
}
