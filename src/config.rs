use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::alarm::{ALERT_INTERVAL, AREA_THRESHOLD, DEFAULT_COUNTER_CAP};
use crate::detect::INTENSITY_DELTA;
use crate::display::POLL_BUDGET;
use crate::frame::CANONICAL_WIDTH;
use crate::pipeline::MonitorSettings;

const DEFAULT_SOURCE_URL: &str = "stub://camera";
const DEFAULT_CAPTURE_WIDTH: u32 = 640;
const DEFAULT_CAPTURE_HEIGHT: u32 = 480;
const DEFAULT_WEBHOOK_TIMEOUT_MS: u64 = 2_000;

#[derive(Debug, Deserialize, Default)]
struct SentryConfigFile {
    source: Option<SourceConfigFile>,
    detect: Option<DetectConfigFile>,
    alert: Option<AlertConfigFile>,
    display: Option<DisplayConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    url: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    canonical_width: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectConfigFile {
    intensity_delta: Option<u8>,
    area_threshold: Option<u64>,
    counter_cap: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct AlertConfigFile {
    interval_secs: Option<u64>,
    console: Option<bool>,
    webhook_url: Option<String>,
    webhook_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize, Default)]
struct DisplayConfigFile {
    poll_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct SentryConfig {
    pub source: SourceSettings,
    pub detect: DetectSettings,
    pub alert: AlertSettings,
    pub display: DisplaySettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSettings {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub canonical_width: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectSettings {
    pub intensity_delta: u8,
    pub area_threshold: u64,
    pub counter_cap: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertSettings {
    pub interval: Duration,
    pub console: bool,
    pub webhook_url: Option<String>,
    pub webhook_timeout: Duration,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            interval: ALERT_INTERVAL,
            console: true,
            webhook_url: None,
            webhook_timeout: Duration::from_millis(DEFAULT_WEBHOOK_TIMEOUT_MS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplaySettings {
    pub poll: Duration,
}

impl SentryConfig {
    /// Defaults, then the JSON file named by `SENTRY_CONFIG`, then env overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("SENTRY_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Like `load`, but reads an explicit file and skips the environment.
    pub fn from_path(path: &Path) -> Result<Self> {
        let mut cfg = Self::from_file(read_config_file(path)?);
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: SentryConfigFile) -> Self {
        let source = file.source.unwrap_or_default();
        let detect = file.detect.unwrap_or_default();
        let alert = file.alert.unwrap_or_default();
        let display = file.display.unwrap_or_default();
        let alert_defaults = AlertSettings::default();

        Self {
            source: SourceSettings {
                url: source
                    .url
                    .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
                width: source.width.unwrap_or(DEFAULT_CAPTURE_WIDTH),
                height: source.height.unwrap_or(DEFAULT_CAPTURE_HEIGHT),
                canonical_width: source.canonical_width.unwrap_or(CANONICAL_WIDTH),
            },
            detect: DetectSettings {
                intensity_delta: detect.intensity_delta.unwrap_or(INTENSITY_DELTA),
                area_threshold: detect.area_threshold.unwrap_or(AREA_THRESHOLD),
                counter_cap: detect.counter_cap.unwrap_or(DEFAULT_COUNTER_CAP),
            },
            alert: AlertSettings {
                interval: alert
                    .interval_secs
                    .map(Duration::from_secs)
                    .unwrap_or(alert_defaults.interval),
                console: alert.console.unwrap_or(alert_defaults.console),
                webhook_url: alert.webhook_url.filter(|url| !url.trim().is_empty()),
                webhook_timeout: alert
                    .webhook_timeout_ms
                    .map(Duration::from_millis)
                    .unwrap_or(alert_defaults.webhook_timeout),
            },
            display: DisplaySettings {
                poll: display
                    .poll_ms
                    .map(Duration::from_millis)
                    .unwrap_or(POLL_BUDGET),
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("SENTRY_SOURCE_URL") {
            if !url.trim().is_empty() {
                self.source.url = url;
            }
        }
        if let Ok(width) = std::env::var("SENTRY_CANONICAL_WIDTH") {
            self.source.canonical_width = width
                .parse()
                .map_err(|_| anyhow!("SENTRY_CANONICAL_WIDTH must be an integer pixel width"))?;
        }
        if let Ok(threshold) = std::env::var("SENTRY_AREA_THRESHOLD") {
            self.detect.area_threshold = threshold
                .parse()
                .map_err(|_| anyhow!("SENTRY_AREA_THRESHOLD must be a non-negative integer"))?;
        }
        if let Ok(interval) = std::env::var("SENTRY_ALERT_INTERVAL_SECS") {
            let seconds: u64 = interval.parse().map_err(|_| {
                anyhow!("SENTRY_ALERT_INTERVAL_SECS must be an integer number of seconds")
            })?;
            self.alert.interval = Duration::from_secs(seconds);
        }
        if let Ok(url) = std::env::var("SENTRY_WEBHOOK_URL") {
            if !url.trim().is_empty() {
                self.alert.webhook_url = Some(url);
            }
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if self.source.width == 0 || self.source.height == 0 {
            return Err(anyhow!("capture size must be non-zero"));
        }
        if self.source.canonical_width == 0 {
            return Err(anyhow!("canonical width must be greater than zero"));
        }
        if self.detect.counter_cap == 0 {
            return Err(anyhow!("counter cap must be at least 1"));
        }
        if self.alert.interval.is_zero() {
            return Err(anyhow!("alert interval must be greater than zero"));
        }
        let poll_ms = self.display.poll.as_millis();
        if !(1..=1000).contains(&poll_ms) {
            return Err(anyhow!("display poll must be between 1 and 1000 ms"));
        }
        Ok(())
    }

    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            intensity_delta: self.detect.intensity_delta,
            area_threshold: self.detect.area_threshold,
            counter_cap: self.detect.counter_cap,
            poll_budget: self.display.poll,
            max_cycles: None,
        }
    }
}

impl Default for SentryConfig {
    fn default() -> Self {
        Self::from_file(SentryConfigFile::default())
    }
}

fn read_config_file(path: &Path) -> Result<SentryConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
