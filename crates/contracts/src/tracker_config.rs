//! Tracker configuration contracts that can be shared across crates.

use serde::{Deserialize, Serialize};

use crate::FrameGeometry;

/// Tracker configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Cell identity within its group (N_id_2), selects the sequence root
    pub cell_id: u8,

    /// Quality threshold, compared strictly greater-than
    pub psr_threshold: f32,

    /// Consecutive qualifying frames required to declare lock
    pub track_after: u32,

    /// Frames between forced re-searches while locked
    #[serde(default)]
    pub track_every: u32,

    /// Capacity of the quality and frequency-offset smoothing rings
    #[serde(default = "default_smoothing_len")]
    pub smoothing_len: usize,

    /// OFDM symbol (FFT) size
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,

    /// Exponential averaging factor of the correlation search (1.0 = off)
    #[serde(default = "default_search_alpha")]
    pub search_alpha: f32,
}

fn default_smoothing_len() -> usize {
    10
}

fn default_fft_size() -> usize {
    128
}

fn default_search_alpha() -> f32 {
    1.0
}

impl TrackerConfig {
    /// Create a configuration with default smoothing and geometry
    pub fn new(cell_id: u8, psr_threshold: f32, track_after: u32, track_every: u32) -> Self {
        Self {
            cell_id,
            psr_threshold,
            track_after,
            track_every,
            smoothing_len: default_smoothing_len(),
            fft_size: default_fft_size(),
            search_alpha: default_search_alpha(),
        }
    }

    /// Frame geometry implied by `fft_size`
    pub fn geometry(&self) -> FrameGeometry {
        FrameGeometry::from_fft_size(self.fft_size)
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::new(0, 3.0, 4, 4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied_on_deserialize() {
        let json = r#"{ "cell_id": 1, "psr_threshold": 2.5, "track_after": 3 }"#;
        let config: TrackerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.cell_id, 1);
        assert_eq!(config.track_every, 0);
        assert_eq!(config.smoothing_len, 10);
        assert_eq!(config.fft_size, 128);
        assert_eq!(config.search_alpha, 1.0);
        assert_eq!(config.geometry().frame_len, 9600);
    }
}
