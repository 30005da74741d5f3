//! Synthetic Tracking Demo
//!
//! Generates a noisy signal with a carrier offset and a fade, tracks it, and
//! prints lock transitions as they happen.
//!
//! Run with: cargo run -p demos --bin track_synthetic [tracker.toml]

use config_loader::ConfigLoader;
use contracts::TrackerConfig;
use ingestion::{GeneratorConfig, SignalGenerator, StreamDriver};
use observability::{record_work_metrics, TrackerMetricsAggregator};
use sync_engine::ReferenceTracker;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // ==== Stage 1: Tracker config from file or defaults ====
    let config = if let Some(path) = std::env::args().nth(1) {
        tracing::info!(path = %path, "Loading tracker config");
        ConfigLoader::load_from_path(std::path::Path::new(&path))?
    } else {
        TrackerConfig::new(0, 3.0, 4, 4)
    };

    // ==== Stage 2: Signal with an offset and a fade ====
    let mut generator = SignalGenerator::new(GeneratorConfig {
        cell_id: config.cell_id,
        fft_size: config.fft_size,
        snr_db: 10.0,
        frequency_offset: 0.15,
        timing_offset: 4321,
        fade: Some(40..50),
        seed: 7,
    })?;
    let samples = generator.generate(100);
    tracing::info!(samples = samples.len(), "Signal generated");

    // ==== Stage 3: Track chunk by chunk ====
    let tracker = ReferenceTracker::from_config(config)?;
    let mut driver = StreamDriver::new(tracker);
    let mut aggregator = TrackerMetricsAggregator::new();
    let mut was_locked = false;

    for chunk in samples.chunks(4096) {
        driver.extend(chunk);
        while let Some(result) = driver.step()? {
            let status = driver.processor().status();
            record_work_metrics(&result, &status);
            aggregator.update(&result, &status);

            if status.locked != was_locked {
                println!(
                    "step {:>4}: {} (quality {:.1}, offset {:+.3})",
                    aggregator.total_steps,
                    if status.locked { "LOCKED" } else { "unlocked" },
                    status.peak_quality,
                    status.frequency_offset_mean,
                );
                was_locked = status.locked;
            }
            for tag in &result.tags {
                println!("step {:>4}: tag '{}' at {}", aggregator.total_steps, tag.key, tag.offset);
            }
        }
    }

    // ==== Stage 4: Summary ====
    println!();
    print!("{}", aggregator.summary());
    let snapshot = driver.metrics().snapshot();
    println!(
        "Driver: {} samples in, {} consumed",
        snapshot.samples_received, snapshot.samples_consumed
    );
    Ok(())
}
