//! `run` command implementation.

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::TrackerConfig;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let mut tracker = ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    apply_overrides(&mut tracker, args);
    ConfigLoader::validate(&tracker).context("Invalid configuration after CLI overrides")?;

    info!(
        cell_id = tracker.cell_id,
        psr_threshold = tracker.psr_threshold,
        track_after = tracker.track_after,
        track_every = tracker.track_every,
        fft_size = tracker.fft_size,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&tracker);
        return Ok(());
    }

    if !args.input.exists() {
        anyhow::bail!("Input recording not found: {}", args.input.display());
    }

    let pipeline_config = PipelineConfig {
        tracker,
        input: args.input.clone(),
        output: args.output.clone(),
        tags: args.tags.clone(),
        max_frames: if args.max_frames == 0 {
            None
        } else {
            Some(args.max_frames)
        },
        chunk_size: args.chunk_size,
        buffer_size: args.buffer_size,
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    let pipeline = Pipeline::new(pipeline_config);
    let shutdown_signal = setup_shutdown_signal();

    info!(input = %args.input.display(), "Starting pipeline...");

    tokio::select! {
        result = pipeline.run() => {
            let stats = result.context("Pipeline execution failed")?;
            info!(
                frames_emitted = stats.frames_emitted,
                frames_dropped = stats.frames_dropped,
                tags = stats.tags,
                duration_secs = stats.duration.as_secs_f64(),
                "Pipeline completed successfully"
            );
            stats.print_summary();
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, output may be incomplete");
        }
    }

    info!("PSS tracker finished");
    Ok(())
}

fn apply_overrides(tracker: &mut TrackerConfig, args: &RunArgs) {
    if let Some(cell_id) = args.cell_id {
        info!(cell_id, "Overriding cell id from CLI");
        tracker.cell_id = cell_id;
    }
    if let Some(threshold) = args.threshold {
        info!(threshold, "Overriding threshold from CLI");
        tracker.psr_threshold = threshold;
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(tracker: &TrackerConfig) {
    let geometry = tracker.geometry();
    println!("\n=== Configuration Summary ===\n");
    println!("Tracker:");
    println!("  Cell id: {}", tracker.cell_id);
    println!("  Threshold: {}", tracker.psr_threshold);
    println!("  Lock after: {} frames", tracker.track_after);
    println!("  Re-search every: {} frames", tracker.track_every);
    println!("\nGeometry:");
    println!("  Frame: {} samples", geometry.frame_len);
    println!("  Slot: {} samples", geometry.slot_len);
    println!("  Symbol: {} samples", geometry.symbol_len);
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::cli::{Cli, Commands};

    fn run_args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["pss-tracker", "run", "-i", "in.cf32", "-o", "out.cf32"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Run(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let mut tracker = TrackerConfig::new(0, 3.0, 4, 4);
        apply_overrides(&mut tracker, &run_args(&["--cell-id", "1", "--threshold", "6"]));
        assert_eq!(tracker.cell_id, 1);
        assert_eq!(tracker.psr_threshold, 6.0);
        assert_eq!(tracker.track_after, 4);
    }

    #[test]
    fn test_no_overrides_keep_file_values() {
        let mut tracker = TrackerConfig::new(2, 3.5, 4, 4);
        apply_overrides(&mut tracker, &run_args(&[]));
        assert_eq!(tracker, TrackerConfig::new(2, 3.5, 4, 4));
    }
}
