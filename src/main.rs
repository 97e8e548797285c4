use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use crossbeam::channel::bounded;
use motion_classifier::replay::{load_samples, replay_samples};
use motion_classifier::sensors::{accel_loop, drive_classifier, SampleSource};
use motion_classifier::{ChannelSink, ClassifierConfig, MotionClassifier};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "motion_classifier")]
#[command(about = "Streaming step counter and activity classifier", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a recorded sample log (.json / .jsonl, optionally .gz) through the classifier
    Replay {
        /// Path to the sample log
        #[arg(long)]
        log: PathBuf,

        /// Write emitted events as JSON lines to this file
        #[arg(long)]
        events_out: Option<PathBuf>,

        #[command(flatten)]
        tuning: Tuning,
    },
    /// Classify live accelerometer samples and print events as JSON lines
    Live {
        /// Duration in seconds (0 = continuous)
        #[arg(value_name = "SECONDS", default_value = "0")]
        duration: u64,

        /// Sampling period in milliseconds (~UI rate by default)
        #[arg(long, default_value = "60")]
        period_ms: u64,

        /// Skip termux-sensor and use the synthetic walking waveform
        #[arg(long)]
        synthetic: bool,

        #[command(flatten)]
        tuning: Tuning,
    },
}

#[derive(Args, Debug)]
struct Tuning {
    /// JSON file with classifier settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the smoothing window capacity
    #[arg(long)]
    window: Option<usize>,

    /// Override the step threshold
    #[arg(long)]
    step_threshold: Option<f64>,

    /// Override samples per emitted event
    #[arg(long)]
    emit_interval: Option<u32>,
}

impl Tuning {
    fn resolve(&self) -> Result<ClassifierConfig> {
        let mut config = match &self.config {
            Some(path) => ClassifierConfig::from_json_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => ClassifierConfig::default(),
        };
        if let Some(window) = self.window {
            config.window_capacity = window;
        }
        if let Some(threshold) = self.step_threshold {
            config.step_threshold = threshold;
        }
        if let Some(interval) = self.emit_interval {
            config.emit_interval = interval;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Replay {
            log,
            events_out,
            tuning,
        } => run_replay(log, events_out, tuning.resolve()?),
        Command::Live {
            duration,
            period_ms,
            synthetic,
            tuning,
        } => run_live(duration, period_ms, synthetic, tuning.resolve()?).await,
    }
}

fn run_replay(log: PathBuf, events_out: Option<PathBuf>, config: ClassifierConfig) -> Result<()> {
    let samples =
        load_samples(&log).with_context(|| format!("loading sample log {}", log.display()))?;
    let report = replay_samples(config, &samples)?;

    if let Some(path) = events_out {
        let mut out = BufWriter::new(File::create(&path)?);
        for event in &report.events {
            writeln!(out, "{}", event.to_json()?)?;
        }
        out.flush()?;
        log::info!("wrote {} events to {}", report.events.len(), path.display());
    }

    let summary = serde_json::json!({
        "log": log.display().to_string(),
        "samples": report.samples,
        "events": report.events.len(),
        "steps": report.final_step_count(),
        "final_activity": report.final_activity(),
        "activity_events": report.activity_events,
        "stats": report.stats,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn run_live(
    duration: u64,
    period_ms: u64,
    synthetic: bool,
    config: ClassifierConfig,
) -> Result<()> {
    let source = if synthetic {
        SampleSource::Synthetic
    } else {
        SampleSource::Termux
    };
    log::info!(
        "[{}] live classification: source {:?}, period {} ms, duration {} s (0=continuous)",
        ts_now(),
        source,
        period_ms,
        duration
    );

    let (sample_tx, mut sample_rx) = mpsc::channel(500);
    let _accel_handle = tokio::spawn(accel_loop(
        sample_tx,
        source,
        Duration::from_millis(period_ms.max(1)),
    ));

    let (event_tx, event_rx) = bounded(64);
    let mut classifier = MotionClassifier::with_config(config, ChannelSink::new(event_tx))?;
    classifier.start();

    let deadline = (duration > 0).then(|| Instant::now() + Duration::from_secs(duration));
    let stdout = std::io::stdout();
    let consumed = drive_classifier(
        &mut sample_rx,
        &mut classifier,
        tokio::signal::ctrl_c(),
        deadline,
        |_| {
            let mut out = stdout.lock();
            for event in event_rx.try_iter() {
                writeln!(out, "{}", event.to_json().map_err(std::io::Error::other)?)?;
            }
            Ok(())
        },
    )
    .await?;
    log::info!("[{}] stopped after {} samples", ts_now(), consumed);

    classifier.stop();
    println!("{}", serde_json::to_string_pretty(&classifier.snapshot())?);
    Ok(())
}

fn ts_now() -> String {
    Utc::now().format("%H:%M:%S").to_string()
}
