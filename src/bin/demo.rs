//! demo - headless end-to-end run of the motion sentry on a synthetic scene

use anyhow::{anyhow, Result};
use clap::Parser;
use std::time::Duration;

use motion_sentry::{
    AlertDispatcher, AlertThrottle, ConsoleNotifier, FrameSource, Key, Monitor, MonitorSettings,
    MultiNotifier, Presented, RecordingNotifier, Scene, SceneScript, ScriptedDisplay,
    SyntheticConfig, SyntheticDevice,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Number of cycles to run before quitting.
    #[arg(long, default_value_t = 120)]
    frames: u64,
    /// Cycle on which the sentry is armed.
    #[arg(long, default_value_t = 5)]
    arm_at: u64,
    /// Minimum spacing between notifications, in milliseconds.
    #[arg(long, default_value_t = 10_000)]
    interval_ms: u64,
    /// Seed for the synthetic sensor noise.
    #[arg(long, default_value_t = 7)]
    seed: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.frames == 0 || args.arm_at == 0 || args.arm_at >= args.frames {
        return Err(anyhow!("need 0 < arm_at < frames"));
    }

    stage("build synthetic scene");
    let moving = Scene::Moving { size: 48, speed: 6 };
    let script = SceneScript::new()
        .then(20, Scene::Still)
        .then(15, moving)
        .then(30, Scene::Still)
        .then(10, moving)
        .then(u64::MAX, Scene::Still);
    let device = SyntheticDevice::new(SyntheticConfig {
        name: "demo".to_string(),
        seed: args.seed,
        script,
        ..SyntheticConfig::default()
    });

    stage("start alert dispatcher");
    let recorder = RecordingNotifier::new();
    let alerts = recorder.alerts();
    let notifier = MultiNotifier::new()
        .with(ConsoleNotifier::stdout())
        .with(recorder);
    let dispatcher = AlertDispatcher::spawn(
        notifier,
        AlertThrottle::with_interval(Duration::from_millis(args.interval_ms)),
    )?;

    stage("run detection loop");
    let display = ScriptedDisplay::new()
        .key_at(args.arm_at, Key::Toggle)
        .key_at(args.frames, Key::Quit);
    let settings = MonitorSettings {
        poll_budget: Duration::ZERO,
        ..MonitorSettings::default()
    };
    let mut monitor = Monitor::start(
        FrameSource::new(device),
        display,
        dispatcher.sender()?,
        settings,
    )?;
    let summary = monitor.run()?;
    let display = monitor.into_sink();
    let stats = dispatcher.shutdown()?;

    let masks = display
        .presented()
        .iter()
        .filter(|p| matches!(p, Presented::Mask { .. }))
        .count();

    println!("demo summary:");
    println!("  cycles: {} ({} armed)", summary.cycles, summary.armed_cycles);
    println!("  masks presented: {}", masks);
    println!("  alert attempts: {}", summary.attempts);
    println!(
        "  notifications: {} fired, {} suppressed, {} failed",
        stats.fired, stats.suppressed, stats.failed
    );
    for alert in alerts.snapshot()? {
        println!(
            "  - cycle {} counter {} score {}",
            alert.cycle, alert.counter, alert.score
        );
    }
    Ok(())
}

fn stage(msg: &str) {
    eprintln!("demo: {}", msg);
}
