//! Configuration validation
//!
//! Rules:
//! - cell_id within the sequence table (0..=2)
//! - psr_threshold finite
//! - track_after >= 1
//! - smoothing_len >= 1
//! - fft_size is a supported symbol length
//! - search_alpha in (0, 1]

use contracts::{ContractError, TrackerConfig, SUPPORTED_FFT_SIZES};

/// Largest valid cell identity within a group
pub const MAX_CELL_ID: u8 = 2;

/// Validate a tracker configuration
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &TrackerConfig) -> Result<(), ContractError> {
    validate_cell_id(config)?;
    validate_threshold(config)?;
    validate_tracking(config)?;
    validate_geometry(config)?;
    validate_search(config)?;
    Ok(())
}

fn validate_cell_id(config: &TrackerConfig) -> Result<(), ContractError> {
    if config.cell_id > MAX_CELL_ID {
        return Err(ContractError::config_validation(
            "cell_id",
            format!(
                "cell_id must be in 0..={MAX_CELL_ID}, got {}",
                config.cell_id
            ),
        ));
    }
    Ok(())
}

fn validate_threshold(config: &TrackerConfig) -> Result<(), ContractError> {
    if !config.psr_threshold.is_finite() {
        return Err(ContractError::config_validation(
            "psr_threshold",
            format!("psr_threshold must be finite, got {}", config.psr_threshold),
        ));
    }
    Ok(())
}

fn validate_tracking(config: &TrackerConfig) -> Result<(), ContractError> {
    if config.track_after == 0 {
        return Err(ContractError::config_validation(
            "track_after",
            "track_after must be >= 1",
        ));
    }
    if config.smoothing_len == 0 {
        return Err(ContractError::config_validation(
            "smoothing_len",
            "smoothing_len must be >= 1",
        ));
    }
    Ok(())
}

fn validate_geometry(config: &TrackerConfig) -> Result<(), ContractError> {
    if !SUPPORTED_FFT_SIZES.contains(&config.fft_size) {
        return Err(ContractError::config_validation(
            "fft_size",
            format!(
                "fft_size must be one of {:?}, got {}",
                SUPPORTED_FFT_SIZES, config.fft_size
            ),
        ));
    }
    Ok(())
}

fn validate_search(config: &TrackerConfig) -> Result<(), ContractError> {
    let alpha = config.search_alpha;
    if !(alpha > 0.0 && alpha <= 1.0) {
        return Err(ContractError::config_validation(
            "search_alpha",
            format!("search_alpha must be in (0, 1], got {alpha}"),
        ));
    }
    Ok(())
}
