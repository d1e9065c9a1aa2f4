use anyhow::{bail, Context, Result};
use awarewalk::alert::AlertEvent;
use awarewalk::types::Locale;
use awarewalk::{
    AwarenessConfig, AwarenessEngine, AwarenessPipeline, HudState, LiveStatus, ScriptedProvider,
    SensorEvent, VelocityMode,
};
use chrono::Utc;
use clap::Parser;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tokio::time::{sleep_until, Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "awarewalk")]
#[command(about = "Replay recorded surface updates through the awareness pipeline", long_about = None)]
struct Args {
    /// JSON-lines file of sensor events
    #[arg(value_name = "SCENARIO")]
    scenario: PathBuf,

    /// JSON config overriding the defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tick interval in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Alert language (en, ja, ko)
    #[arg(long)]
    locale: Option<Locale>,

    /// Estimate closing speed from range history
    #[arg(long)]
    multi_frame_velocity: bool,

    /// Replay in real time through the async engine
    #[arg(long)]
    live: bool,

    /// Where to write live_status.json
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = load_config(&args)?;
    let events = load_events(&args.scenario)?;
    if events.is_empty() {
        bail!("{} contains no sensor events", args.scenario.display());
    }

    println!("[{}] AwareWalk replay starting", ts_now());
    println!("  Scenario: {} ({} events)", args.scenario.display(), events.len());
    println!("  Tick: {}ms", config.tick_interval_ms);
    println!("  Locale: {:?}", config.locale);
    println!("  Velocity: {:?}", config.velocity_mode);
    println!("  Mode: {}", if args.live { "live" } else { "simulated clock" });

    let status = if args.live {
        run_live(config, events).await?
    } else {
        run_simulated(config, &events)?
    };

    println!(
        "[{}] Done: {} ticks, {} updates, {} alerts",
        ts_now(),
        status.ticks,
        status.updates_ingested,
        status.alerts_triggered
    );

    if let Some(dir) = &args.output_dir {
        std::fs::create_dir_all(dir)?;
        let path = dir.join("live_status.json");
        status
            .save(&path.to_string_lossy())
            .with_context(|| format!("writing {}", path.display()))?;
        println!("[{}] Status written to {}", ts_now(), path.display());
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<AwarenessConfig> {
    let mut config = match &args.config {
        Some(path) => AwarenessConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AwarenessConfig::default(),
    };
    if let Some(tick_ms) = args.tick_ms {
        config.tick_interval_ms = tick_ms;
    }
    if let Some(locale) = args.locale {
        config.locale = locale;
    }
    if args.multi_frame_velocity {
        config.velocity_mode = VelocityMode::MultiFrame;
    }
    config.validate()?;
    Ok(config)
}

fn load_events(path: &Path) -> Result<Vec<SensorEvent>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut events = Vec::new();
    for (n, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let event: SensorEvent = serde_json::from_str(line)
            .with_context(|| format!("{}:{}: bad sensor event", path.display(), n + 1))?;
        events.push(event);
    }
    Ok(events)
}

/// Seconds to keep ticking after the last event so tracks age out and
/// alerts settle.
fn settle_time(config: &AwarenessConfig) -> f64 {
    config.stale_after_secs + config.tick_interval_ms as f64 / 1000.0
}

fn run_simulated(config: AwarenessConfig, events: &[SensorEvent]) -> Result<LiveStatus> {
    let dt = config.tick_interval_ms as f64 / 1000.0;
    let start = events.iter().map(|e| e.timestamp).fold(f64::INFINITY, f64::min);
    let end = events.iter().map(|e| e.timestamp).fold(f64::NEG_INFINITY, f64::max);
    let end = end + settle_time(&config);

    // events are pushed by the loop below, the provider only gates start
    let mut pipeline = AwarenessPipeline::new(config, Box::new(ScriptedProvider::new(Vec::new())))?;
    let feed = pipeline.feed();
    pipeline.start(start)?;

    let mut pending = events.iter().peekable();
    let mut step = 0u64;
    loop {
        let now = start + step as f64 * dt;
        if now > end {
            break;
        }
        while let Some(event) = pending.next_if(|e| e.timestamp <= now) {
            feed.push(event.clone());
        }
        let report = pipeline.tick(now);
        for event in &report.alerts {
            print_alert(now - start, event);
        }
        step += 1;
    }

    let status = pipeline.status().clone();
    pipeline.stop();
    Ok(status)
}

async fn run_live(config: AwarenessConfig, events: Vec<SensorEvent>) -> Result<LiveStatus> {
    let first = events.first().map(|e| e.timestamp).unwrap_or_default();
    let last = events.last().map(|e| e.timestamp).unwrap_or_default();
    let deadline = Instant::now() + Duration::from_secs_f64((last - first).max(0.0) + settle_time(&config));

    let pipeline = AwarenessPipeline::new(config, Box::new(ScriptedProvider::new(events)))?;
    let mut engine = AwarenessEngine::new(pipeline);
    let mut rx = engine.subscribe();
    engine.start()?;

    let mut shown: Option<f64> = None;
    loop {
        tokio::select! {
            _ = sleep_until(deadline) => break,
            _ = tokio::signal::ctrl_c() => {
                println!("[{}] Interrupted", ts_now());
                break;
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = rx.borrow_and_update().clone();
                report_live(engine.now(), &state, &mut shown);
            }
        }
    }

    let status = engine.status()?;
    engine.stop()?;
    Ok(status)
}

fn report_live(now: f64, state: &HudState, shown: &mut Option<f64>) {
    match &state.alert {
        Some(alert) if *shown != Some(alert.triggered_at) => {
            *shown = Some(alert.triggered_at);
            println!("[{}] t={:6.2}s {:?}: {}", ts_now(), now, alert.level, alert.message);
        }
        None if shown.is_some() => {
            *shown = None;
            println!("[{}] t={:6.2}s alert cleared", ts_now(), now);
        }
        _ => {}
    }
}

fn print_alert(elapsed: f64, event: &AlertEvent) {
    match event {
        AlertEvent::Triggered { alert, cue } => println!(
            "[{}] t={:6.2}s {:?}: {} (haptic {:.1}, sound {})",
            ts_now(),
            elapsed,
            alert.level,
            alert.message,
            cue.intensity,
            cue.sound.unwrap_or("off")
        ),
        AlertEvent::Dismissed { level, reason } => println!(
            "[{}] t={:6.2}s {:?} dismissed ({:?})",
            ts_now(),
            elapsed,
            level,
            reason
        ),
    }
}

fn ts_now() -> String {
    Utc::now().format("%H:%M:%S").to_string()
}
