//! sentryd - motion sentry daemon
//!
//! This daemon:
//! 1. Opens the configured capture source and seeds the baseline
//! 2. Reads operator keys from the terminal (t = arm/disarm, q = quit)
//! 3. While armed, scores every frame against the rolling baseline
//! 4. Hands alert attempts to the dispatcher, which throttles and notifies

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use motion_sentry::{
    notify, open_device, AlertDispatcher, AlertThrottle, FrameSource, Monitor, SentryConfig,
    TerminalDisplay,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON config file (overrides SENTRY_CONFIG).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Capture source URL (stub://<name>, /dev/videoN).
    #[arg(long)]
    source: Option<String>,
    /// Webhook endpoint notified on every fired alert.
    #[arg(long)]
    webhook: Option<String>,
    /// Do not print alerts to stdout.
    #[arg(long)]
    quiet: bool,
    /// Stop after this many cycles.
    #[arg(long)]
    max_cycles: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = match &args.config {
        Some(path) => SentryConfig::from_path(path)?,
        None => SentryConfig::load()?,
    };
    if let Some(source) = args.source {
        cfg.source.url = source;
    }
    if let Some(webhook) = args.webhook {
        cfg.alert.webhook_url = Some(webhook);
    }
    if args.quiet {
        cfg.alert.console = false;
    }

    log::info!(
        "sentryd {} source={} canonical_width={} area_threshold={} alert_interval={}s",
        env!("CARGO_PKG_VERSION"),
        cfg.source.url,
        cfg.source.canonical_width,
        cfg.detect.area_threshold,
        cfg.alert.interval.as_secs()
    );

    let notifier = notify::build_notifier(&cfg.alert)?;
    let dispatcher =
        AlertDispatcher::spawn(notifier, AlertThrottle::with_interval(cfg.alert.interval))?;

    let device = open_device(&cfg.source.url, cfg.source.width, cfg.source.height)?;
    let source = FrameSource::with_canonical_width(device, cfg.source.canonical_width);
    let display = TerminalDisplay::spawn()?;

    let mut settings = cfg.monitor_settings();
    settings.max_cycles = args.max_cycles;

    let run = Monitor::start(source, display, dispatcher.sender()?, settings)
        .and_then(|mut monitor| monitor.run());
    eprintln!();

    let stats = dispatcher.shutdown()?;
    log::info!(
        "alerts: {} attempts, {} fired, {} suppressed, {} failed",
        stats.attempts,
        stats.fired,
        stats.suppressed,
        stats.failed
    );

    let summary = run?;
    log::info!(
        "sentryd stopped after {} cycles ({} armed)",
        summary.cycles,
        summary.armed_cycles
    );
    Ok(())
}
