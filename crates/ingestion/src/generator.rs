//! Synthetic test signal
//!
//! Repeating half-frames carrying the synchronization symbol at the end of
//! slot 0, with additive white Gaussian noise, a carrier frequency offset,
//! a leading timing offset and an optional fade during which only noise is
//! transmitted.

use std::f64::consts::PI;
use std::ops::Range;

use contracts::{FrameGeometry, Sample};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use sync_engine::PssSequence;
use tracing::debug;

use crate::error::{IngestionError, Result};

/// Generator configuration
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Cell identity of the transmitted sequence
    pub cell_id: u8,

    /// Symbol (FFT) size
    pub fft_size: usize,

    /// Signal-to-noise ratio of the synchronization symbol, in dB
    pub snr_db: f64,

    /// Carrier offset in subcarrier spacings
    pub frequency_offset: f64,

    /// Noise-only samples before the first frame
    pub timing_offset: usize,

    /// Half-frame indices transmitted without the synchronization symbol
    pub fade: Option<Range<usize>>,

    /// RNG seed
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            cell_id: 0,
            fft_size: 128,
            snr_db: 20.0,
            frequency_offset: 0.0,
            timing_offset: 0,
            fade: None,
            seed: 0x5eed,
        }
    }
}

/// Deterministic signal source
pub struct SignalGenerator {
    config: GeneratorConfig,
    geometry: FrameGeometry,
    replica: Vec<Sample>,
    noise: Normal<f64>,
    rng: StdRng,
}

impl SignalGenerator {
    /// # Errors
    /// [`IngestionError::Generator`] when the sequence cannot be built or
    /// the SNR is not finite.
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        let sequence = PssSequence::new(config.cell_id, config.fft_size)
            .map_err(|e| IngestionError::Generator(e.to_string()))?;
        if !config.snr_db.is_finite() {
            return Err(IngestionError::Generator(format!(
                "snr_db must be finite, got {}",
                config.snr_db
            )));
        }

        // The replica has unit power, so noise power is 10^(-snr/10),
        // split evenly over both components.
        let sigma = (10f64.powf(-config.snr_db / 10.0) / 2.0).sqrt();
        let noise = Normal::new(0.0, sigma)
            .map_err(|e| IngestionError::Generator(e.to_string()))?;

        Ok(Self {
            geometry: FrameGeometry::from_fft_size(config.fft_size),
            replica: sequence.time().to_vec(),
            rng: StdRng::seed_from_u64(config.seed),
            noise,
            config,
        })
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Stream offset of the first sample of half-frame `frame`
    pub fn frame_offset(&self, frame: usize) -> usize {
        self.config.timing_offset + frame * self.geometry.frame_len
    }

    /// Generate `frames` half-frames after the timing offset
    pub fn generate(&mut self, frames: usize) -> Vec<Sample> {
        let frame_len = self.geometry.frame_len;
        let symbol_start = self.geometry.sync_symbol_start();
        let total = self.config.timing_offset + frames * frame_len;

        let mut samples = vec![Sample::new(0.0, 0.0); total];
        for frame in 0..frames {
            if self.is_faded(frame) {
                continue;
            }
            let at = self.frame_offset(frame) + symbol_start;
            samples[at..at + self.replica.len()].copy_from_slice(&self.replica);
        }

        let step = 2.0 * PI * self.config.frequency_offset / self.config.fft_size as f64;
        for (n, s) in samples.iter_mut().enumerate() {
            let (sin, cos) = (step * n as f64).sin_cos();
            let rotated = *s * Sample::new(cos as f32, sin as f32);
            let noise = Sample::new(
                self.noise.sample(&mut self.rng) as f32,
                self.noise.sample(&mut self.rng) as f32,
            );
            *s = rotated + noise;
        }

        debug!(
            frames,
            samples = samples.len(),
            snr_db = self.config.snr_db,
            "generated signal"
        );
        samples
    }

    fn is_faded(&self, frame: usize) -> bool {
        self.config
            .fade
            .as_ref()
            .is_some_and(|range| range.contains(&frame))
    }
}
