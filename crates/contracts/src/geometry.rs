//! Sample, window and frame geometry primitives.

use num_complex::Complex32;
use serde::{Deserialize, Serialize};

/// One complex baseband sample
pub type Sample = Complex32;

/// Occupied subcarriers of the synchronization symbol
pub const PSS_LEN: usize = 62;

/// Symbol lengths (FFT sizes) supported by the frame geometry
pub const SUPPORTED_FFT_SIZES: [usize; 6] = [128, 256, 512, 1024, 1536, 2048];

/// Contiguous view of the input stream handed to one processing step.
///
/// The first `history` samples repeat the tail of the previous window so that
/// a frame may start before the current read position.
#[derive(Debug, Clone, Copy)]
pub struct Window<'a> {
    samples: &'a [Sample],
    history: usize,
}

impl<'a> Window<'a> {
    /// Create a window; `history` is clamped to the slice length.
    pub fn new(samples: &'a [Sample], history: usize) -> Self {
        Self {
            samples,
            history: history.min(samples.len()),
        }
    }

    /// Full view including the history prefix
    #[inline]
    pub fn samples(&self) -> &'a [Sample] {
        self.samples
    }

    /// Samples after the history prefix (the current read position onward)
    #[inline]
    pub fn current(&self) -> &'a [Sample] {
        &self.samples[self.history..]
    }

    /// Length of the history prefix
    #[inline]
    pub fn history(&self) -> usize {
        self.history
    }

    /// Number of samples available at or after the read position
    #[inline]
    pub fn available(&self) -> usize {
        self.samples.len() - self.history
    }
}

/// Frame geometry, fixed for the lifetime of a tracker.
///
/// `frame_len` is one half-frame: ten slots of 7.5 symbols each
/// (cyclic prefixes included).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameGeometry {
    pub frame_len: usize,
    pub slot_len: usize,
    pub symbol_len: usize,
}

impl FrameGeometry {
    /// Derive the geometry from the OFDM symbol (FFT) size
    pub fn from_fft_size(fft_size: usize) -> Self {
        let slot_len = fft_size * 15 / 2;
        Self {
            frame_len: slot_len * 10,
            slot_len,
            symbol_len: fft_size,
        }
    }

    /// History overlap the streaming engine must supply
    #[inline]
    pub fn history(&self) -> usize {
        self.frame_len - 1
    }

    /// Offset of the synchronization symbol inside an aligned frame
    #[inline]
    pub fn sync_symbol_start(&self) -> usize {
        self.slot_len - self.symbol_len
    }

    /// Sample rate in Hz implied by 15 kHz subcarrier spacing
    pub fn sample_rate_hz(&self) -> f64 {
        self.symbol_len as f64 * 15_000.0
    }
}

impl Default for FrameGeometry {
    fn default() -> Self {
        Self::from_fft_size(128)
    }
}
