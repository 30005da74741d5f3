//! Reference implementations of the search and correction primitives.
//!
//! The tracker only depends on the [`SyncSearch`](contracts::SyncSearch) and
//! [`FrequencyCorrection`](contracts::FrequencyCorrection) seams; these
//! implementations make the binary usable on recorded or synthetic signals.
//!
//! The synchronization symbol is a length-62 Zadoff-Chu sequence mapped onto
//! the subcarriers around DC (DC itself left empty).

mod cfo;
mod pss;

pub use cfo::PssCorrector;
pub use pss::{PssCorrelator, PssSequence};

use std::fmt;
use std::sync::Arc;

use contracts::{Sample, PSS_LEN};
use rustfft::{Fft, FftPlanner};

/// FFT bin carrying sequence element `n`: `-31..=-1` then `1..=31`
#[inline]
pub(crate) fn subcarrier_bin(n: usize, fft_size: usize) -> usize {
    if n < PSS_LEN / 2 {
        fft_size - PSS_LEN / 2 + n
    } else {
        n - PSS_LEN / 2 + 1
    }
}

/// Planned forward and inverse transforms of one symbol
#[derive(Clone)]
pub(crate) struct SymbolFft {
    size: usize,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    scratch: Vec<Sample>,
}

impl fmt::Debug for SymbolFft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymbolFft").field("size", &self.size).finish()
    }
}

impl SymbolFft {
    pub(crate) fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(size);
        let inverse = planner.plan_fft_inverse(size);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());

        Self {
            size,
            forward,
            inverse,
            scratch: vec![Sample::new(0.0, 0.0); scratch_len],
        }
    }

    /// Spectrum of the first `size` samples of `input`, zero padded
    pub(crate) fn forward(&mut self, input: &[Sample]) -> Vec<Sample> {
        let mut buffer = self.load(input);
        self.forward.process_with_scratch(&mut buffer, &mut self.scratch);
        buffer
    }

    /// Time signal of `spectrum`, normalized by `1 / size`
    pub(crate) fn inverse(&mut self, spectrum: &[Sample]) -> Vec<Sample> {
        let mut buffer = self.load(spectrum);
        self.inverse.process_with_scratch(&mut buffer, &mut self.scratch);

        let scale = (self.size as f32).recip();
        buffer.iter_mut().for_each(|s| *s *= scale);
        buffer
    }

    fn load(&self, input: &[Sample]) -> Vec<Sample> {
        let mut buffer: Vec<Sample> = input.iter().take(self.size).copied().collect();
        buffer.resize(self.size, Sample::new(0.0, 0.0));
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subcarrier_bins_skip_dc() {
        assert_eq!(subcarrier_bin(0, 128), 97);
        assert_eq!(subcarrier_bin(30, 128), 127);
        assert_eq!(subcarrier_bin(31, 128), 1);
        assert_eq!(subcarrier_bin(61, 128), 31);
        assert!((0..PSS_LEN).all(|n| subcarrier_bin(n, 128) != 0));
    }

    #[test]
    fn test_tone_lands_in_its_bin() {
        let n = 16;
        let tone: Vec<Sample> = (0..n)
            .map(|m| {
                let phase = 2.0 * std::f32::consts::PI * 3.0 * m as f32 / n as f32;
                Sample::new(phase.cos(), phase.sin())
            })
            .collect();

        let mut fft = SymbolFft::new(n);
        let spectrum = fft.forward(&tone);
        assert!((spectrum[3].norm() - n as f32).abs() < 1e-3);
        assert!(spectrum[4].norm() < 1e-3);

        let back = fft.inverse(&spectrum);
        for (a, b) in back.iter().zip(&tone) {
            assert!((a - b).norm() < 1e-4);
        }
    }
}
