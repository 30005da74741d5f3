//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::TrackerConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    tracker: TrackerConfig,
    geometry: GeometryInfo,
    timing: TimingInfo,
}

#[derive(Serialize)]
struct GeometryInfo {
    frame_len: usize,
    slot_len: usize,
    symbol_len: usize,
    history: usize,
    sync_symbol_start: usize,
}

#[derive(Serialize)]
struct TimingInfo {
    sample_rate_hz: f64,
    frame_duration_ms: f64,
    /// Samples accumulated before the first step can run
    startup_samples: usize,
    /// Half-frames between forced searches once locked
    search_interval_frames: u32,
    /// Minimum time from first qualifying frame to lock
    acquisition_ms: f64,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let tracker = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    let info = build_config_info(tracker);

    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(tracker: TrackerConfig) -> ConfigInfo {
    let geometry = tracker.geometry();
    let sample_rate_hz = geometry.sample_rate_hz();
    let frame_duration_ms = geometry.frame_len as f64 / sample_rate_hz * 1000.0;

    ConfigInfo {
        geometry: GeometryInfo {
            frame_len: geometry.frame_len,
            slot_len: geometry.slot_len,
            symbol_len: geometry.symbol_len,
            history: geometry.history(),
            sync_symbol_start: geometry.sync_symbol_start(),
        },
        timing: TimingInfo {
            sample_rate_hz,
            frame_duration_ms,
            startup_samples: 2 * geometry.frame_len,
            search_interval_frames: tracker.track_every + 1,
            acquisition_ms: f64::from(tracker.track_after) * frame_duration_ms,
        },
        tracker,
    }
}

fn print_config_info(info: &ConfigInfo) {
    let tracker = &info.tracker;
    println!("\n=== Tracker ===");
    println!("  Cell id:          {}", tracker.cell_id);
    println!("  Threshold:        {}", tracker.psr_threshold);
    println!("  Lock after:       {} frames", tracker.track_after);
    println!("  Re-search every:  {} frames", tracker.track_every);
    println!("  Smoothing:        {} frames", tracker.smoothing_len);
    println!("  Search averaging: {}", tracker.search_alpha);

    let geometry = &info.geometry;
    println!("\n=== Geometry (samples) ===");
    println!("  Frame:            {}", geometry.frame_len);
    println!("  Slot:             {}", geometry.slot_len);
    println!("  Symbol:           {}", geometry.symbol_len);
    println!("  History:          {}", geometry.history);
    println!("  Sync symbol at:   {}", geometry.sync_symbol_start);

    let timing = &info.timing;
    println!("\n=== Timing ===");
    println!("  Sample rate:      {:.0} Hz", timing.sample_rate_hz);
    println!("  Frame duration:   {:.3} ms", timing.frame_duration_ms);
    println!("  Startup:          {} samples", timing.startup_samples);
    println!("  Search interval:  {} frames", timing.search_interval_frames);
    println!("  Acquisition:      {:.3} ms", timing.acquisition_ms);
    println!();
}
