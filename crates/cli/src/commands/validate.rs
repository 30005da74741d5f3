//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::TrackerConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<TrackerConfig>,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            config: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                config: Some(config),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            config: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &TrackerConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    // A peak-to-sidelobe ratio of 1 is what noise alone produces
    if config.psr_threshold <= 1.0 {
        warnings.push(format!(
            "psr_threshold {} is at or below the noise floor - noise may acquire lock",
            config.psr_threshold
        ));
    }

    if config.track_every == 0 {
        warnings.push("track_every is 0 - a full search runs on every frame".to_string());
    }

    if config.track_after == 1 {
        warnings.push("track_after is 1 - a single qualifying frame locks".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("OK  Configuration is valid: {}", result.config_path);

        if let Some(ref config) = result.config {
            println!("\n  Cell id: {}", config.cell_id);
            println!("  Threshold: {}", config.psr_threshold);
            println!("  Lock after: {} frames", config.track_after);
            println!("  Re-search every: {} frames", config.track_every);
            println!("  FFT size: {}", config.fft_size);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\nWarnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("ERR Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
