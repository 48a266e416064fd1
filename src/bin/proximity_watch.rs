//! proximity-watch - run a detector over a frame source and report the
//! tracked class's proximity trend.
//!
//! This binary:
//! 1. Loads configuration (file from --config / PROXIMITY_CONFIG, then env)
//! 2. Registers detector backends and selects the configured one
//! 3. Pulls frames until the stream ends, --frames is reached, or Ctrl-C
//! 4. Prints per-frame status and optionally writes JSON-lines reports

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use proximity_watch::{
    open_source, ui::Ui, BackendRegistry, ProximityConfig, ReplayBackend, ReportWriter,
    ScorePooling, StreamLoop, StubBackend,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Config file (.toml or .json).
    #[arg(long, env = "PROXIMITY_CONFIG")]
    config: Option<PathBuf>,
    /// Detector backend name (stub, replay).
    #[arg(long)]
    backend: Option<String>,
    /// Recorded detections (JSON lines); implies --backend replay.
    #[arg(long)]
    replay: Option<PathBuf>,
    /// Stop after this many frames.
    #[arg(long)]
    frames: Option<u64>,
    /// Confidence threshold (strictly greater-than).
    #[arg(long)]
    threshold: Option<f32>,
    /// Class whose proximity is tracked.
    #[arg(long)]
    track: Option<String>,
    /// How several tracked detections in one frame combine: max, mean, last.
    #[arg(long)]
    pooling: Option<ScorePooling>,
    /// Append per-frame reports to this file as JSON lines.
    #[arg(long)]
    report: Option<PathBuf>,
    /// Console output: auto, plain, pretty.
    #[arg(long)]
    ui: Option<String>,
    /// Process frames as fast as possible instead of pacing to target fps.
    #[arg(long)]
    no_pace: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let ui = Ui::from_args(args.ui.as_deref(), std::io::stderr().is_terminal());

    let config = {
        let _stage = ui.stage("load configuration");
        load_config(&args)?
    };
    log::info!(
        "tracking '{}' (threshold {}, history {}, window {})",
        config.tracking.tracked_class,
        config.detection.confidence_threshold,
        config.tracking.history_capacity,
        config.tracking.trend_window
    );

    let registry = {
        let _stage = ui.stage("register detector backends");
        build_registry(&config)?
    };
    let detector = registry
        .default_backend()
        .ok_or_else(|| anyhow!("no detector backend available"))?;
    log::info!(
        "detector backend: {} (registered: {})",
        registry.default_name().unwrap_or("?"),
        registry.list().join(", ")
    );

    let source = open_source(&config.source)?;
    let mut stream = StreamLoop::new(&config, source, detector)?;
    if args.no_pace || config.detection.backend == "replay" {
        stream = stream.without_pacing();
    }

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || {
            stop.store(true, Ordering::SeqCst);
        })
        .context("installing Ctrl-C handler")?;
    }

    let mut writer = match &args.report {
        Some(path) => Some(ReportWriter::open(path)?),
        None => None,
    };

    let status = ui.status();
    let stats = stream.run(&stop, |report| {
        status.show(report);
        if let Some(writer) = writer.as_mut() {
            writer.write(report)?;
        }
        Ok(())
    })?;
    status.finish();

    if let Some(writer) = writer {
        let path = writer.path().display().to_string();
        let written = writer.finish()?;
        log::info!("wrote {} frame reports to {}", written, path);
    }

    println!("proximity-watch summary:");
    println!("  frames processed: {}", stats.frames_processed);
    println!(
        "  frames with {}: {}",
        config.tracking.tracked_class, stats.frames_with_tracked
    );
    println!("  frames skipped for tracking: {}", stats.frames_skipped);
    if let Some(sample) = stream.tracker().latest() {
        println!("  last proximity score: {:.2}", sample.score);
    }
    let final_trend = stream.tracker().classify();
    println!("  last trend: {}", final_trend.label);
    Ok(())
}

fn load_config(args: &Args) -> Result<ProximityConfig> {
    let mut config = ProximityConfig::load_from(args.config.as_deref())?;
    if let Some(path) = &args.replay {
        config.detection.replay_path = Some(path.clone());
        config.detection.backend = "replay".to_string();
    }
    if let Some(backend) = &args.backend {
        config.detection.backend = backend.clone();
    }
    if let Some(frames) = args.frames {
        config.source.frame_limit = Some(frames);
    }
    if let Some(threshold) = args.threshold {
        config.detection.confidence_threshold = threshold;
    }
    if let Some(track) = &args.track {
        config.tracking.tracked_class = track.clone();
    }
    if let Some(pooling) = args.pooling {
        config.tracking.pooling = pooling;
    }
    config.validate()?;
    Ok(config)
}

fn build_registry(config: &ProximityConfig) -> Result<BackendRegistry> {
    let mut registry = BackendRegistry::new();
    registry.register(StubBackend::new());
    if let Some(path) = &config.detection.replay_path {
        let replay = ReplayBackend::from_path(path)?;
        if let Some(last) = replay.last_frame() {
            log::debug!("replay covers frames 0..={}", last);
        }
        registry.register(replay);
    }
    registry.set_default(&config.detection.backend)?;
    Ok(registry)
}
