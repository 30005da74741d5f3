//! `simulate` command implementation.

use anyhow::{Context, Result};
use ingestion::{write_iq_file, GeneratorConfig, SignalGenerator};
use tracing::info;

use crate::cli::SimulateArgs;

/// Execute the `simulate` command
pub fn run_simulate(args: &SimulateArgs) -> Result<()> {
    let config = generator_config(args);
    info!(
        output = %args.output.display(),
        frames = args.frames,
        snr_db = config.snr_db,
        cell_id = config.cell_id,
        fade = ?config.fade,
        "Generating synthetic recording"
    );

    let mut generator = SignalGenerator::new(config).context("Invalid generator parameters")?;
    let samples = generator.generate(args.frames);
    write_iq_file(&args.output, &samples)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!(
        "Wrote {} samples ({} half-frames) to {}",
        samples.len(),
        args.frames,
        args.output.display()
    );
    Ok(())
}

fn generator_config(args: &SimulateArgs) -> GeneratorConfig {
    GeneratorConfig {
        cell_id: args.cell_id,
        fft_size: args.fft_size,
        snr_db: args.snr_db,
        frequency_offset: args.frequency_offset,
        timing_offset: args.timing_offset,
        fade: match (args.fade_start, args.fade_frames) {
            (Some(start), Some(len)) => Some(start..start + len),
            _ => None,
        },
        seed: args.seed,
    }
}
