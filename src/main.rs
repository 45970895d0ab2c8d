use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use crossbeam_channel::{after, never, select, tick};

use soundrec::audio::{AudioSystem, SampleConsumer};
use soundrec::config::{HarnessConfig, OverrunPolicy, SourceKind, UnderrunPolicy};
use soundrec::output::{Formatter, OutputFormat, create_formatter};
use soundrec::processing::LevelMonitor;
use soundrec::save_wav;

#[derive(Parser, Debug)]
#[command(name = "soundrec")]
#[command(about = "Capture audio through a real-time ring buffer and report levels", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Sample source: device, tone
    #[arg(short = 's', long, value_enum)]
    source: Option<SourceKind>,

    /// Tone frequency in Hz (tone source)
    #[arg(long)]
    tone_hz: Option<f32>,

    /// Ring buffer capacity in samples
    #[arg(long)]
    capacity: Option<usize>,

    /// What a full ring does with an incoming sample
    #[arg(long, value_enum)]
    overrun_policy: Option<OverrunPolicy>,

    /// What an empty ring yields
    #[arg(long, value_enum)]
    underrun_policy: Option<UnderrunPolicy>,

    /// Capture duration in seconds (0 runs until interrupted)
    #[arg(short = 't', long, default_value = "0")]
    seconds: f32,

    /// Output format: text, json
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Write consumed audio to a WAV file
    #[arg(long)]
    dump_audio: Option<PathBuf>,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let mut config = match &args.config {
        Some(path) => HarnessConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => HarnessConfig::default(),
    };
    if let Some(source) = args.source {
        config.source.kind = source;
    }
    if let Some(hz) = args.tone_hz {
        config.source.tone_hz = hz;
    }
    if let Some(capacity) = args.capacity {
        config.buffer.capacity = capacity;
    }
    if let Some(policy) = args.overrun_policy {
        config.buffer.overrun_policy = policy;
    }
    if let Some(policy) = args.underrun_policy {
        config.buffer.underrun_policy = policy;
    }
    config.validate().context("Invalid configuration")?;

    log::info!("Sample rate: {} Hz", config.audio.sample_rate);
    log::info!(
        "Channels: {}, block size: {} frames",
        config.audio.channels,
        config.audio.block_size
    );
    log::info!(
        "Ring buffer: {} samples, overrun policy {:?}, underrun policy {:?}, report every {} events",
        config.buffer.capacity,
        config.buffer.overrun_policy,
        config.buffer.underrun_policy,
        config.buffer.report_interval
    );

    let formatter = create_formatter(args.format, args.verbose > 0);

    let mut system = AudioSystem::new(&config)?;

    let mut monitor = LevelMonitor::new(config.monitor.window);
    if args.dump_audio.is_some() {
        monitor = monitor.with_recording();
    }

    let duration = capture_duration(args.seconds)?;
    let consumer = system.start().context("Failed to start audio session")?;

    run_monitor_loop(
        consumer,
        &mut monitor,
        formatter.as_ref(),
        Duration::from_millis(config.monitor.report_interval_ms),
        duration,
    )?;

    system.stop()?;

    if let Some(stats) = system.stats() {
        println!(
            "Totals: {} overruns, {} underruns",
            stats.overruns(),
            stats.underruns()
        );
    }

    if let Some(path) = &args.dump_audio {
        let samples = monitor.take_recording();
        save_wav(path, &samples, config.audio.sample_rate, config.audio.channels)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Wrote {} samples to {}", samples.len(), path.display());
    }

    Ok(())
}

/// `0` means no deadline; anything else must be a representable duration
fn capture_duration(seconds: f32) -> anyhow::Result<Option<Duration>> {
    if seconds == 0.0 {
        return Ok(None);
    }
    Duration::try_from_secs_f32(seconds)
        .map(Some)
        .with_context(|| format!("Invalid capture duration {} s", seconds))
}

fn run_monitor_loop(
    mut consumer: SampleConsumer<f32>,
    monitor: &mut LevelMonitor,
    formatter: &dyn Formatter,
    report_interval: Duration,
    duration: Option<Duration>,
) -> anyhow::Result<()> {
    let ticker = tick(report_interval);
    let deadline = duration.map(after).unwrap_or_else(never);
    let mut stdout = std::io::stdout().lock();

    if let Some(header) = formatter.header() {
        writeln!(stdout, "{}", header)?;
    }

    loop {
        select! {
            recv(ticker) -> _ => {
                monitor.drain(&mut consumer);
                let report = monitor.report(&consumer);
                writeln!(stdout, "{}", formatter.format(&report))?;
            }
            recv(deadline) -> _ => {
                monitor.drain(&mut consumer);
                break;
            }
        }
    }

    Ok(())
}
