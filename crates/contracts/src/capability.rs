//! Capability traits injected into the tracker and the streaming driver.
//!
//! The tracker core never touches correlation or OFDM math directly; it talks
//! to these seams so that state handling and alignment can be exercised with
//! fakes.

use serde::{Deserialize, Serialize};

use crate::{ContractError, PeakResult, Sample, Window, WorkOutput, PSS_LEN};

/// Synchronization search primitive
pub trait SyncSearch {
    /// Locate the synchronization symbol in `samples`.
    ///
    /// `samples` is the window's current region.
    fn search(&mut self, samples: &[Sample]) -> PeakResult;

    /// Discard any averaging state accumulated across searches
    fn reset_averaging(&mut self);
}

/// Frequency offset and channel estimation primitive
pub trait FrequencyCorrection {
    /// Estimate the frequency offset (subcarrier units) from one
    /// synchronization symbol
    fn estimate_offset(&mut self, symbol: &[Sample]) -> f32;

    /// Rotate `buffer` in place by `freq` cycles per sample
    fn correct(&mut self, buffer: &mut [Sample], freq: f32);

    /// Estimate the channel on the synchronization subcarriers
    ///
    /// # Errors
    /// Returns [`ContractError::ChannelEstimation`] on internal failure
    fn estimate_channel(&mut self, symbol: &[Sample]) -> Result<ChannelEstimate, ContractError>;

    /// Forget the frequency cached from the previous correction
    fn reset_carry_over(&mut self);
}

/// Per-subcarrier channel estimate over the synchronization symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelEstimate {
    taps: Vec<Sample>,
}

impl ChannelEstimate {
    /// All-zero estimate
    pub fn zeroed() -> Self {
        Self {
            taps: vec![Sample::new(0.0, 0.0); PSS_LEN],
        }
    }

    /// Wrap per-subcarrier taps
    pub fn from_taps(taps: Vec<Sample>) -> Self {
        Self { taps }
    }

    /// Per-subcarrier taps
    pub fn taps(&self) -> &[Sample] {
        &self.taps
    }

    /// Reset all taps to zero, keeping the length
    pub fn clear(&mut self) {
        self.taps.fill(Sample::new(0.0, 0.0));
    }

    /// Average tap power
    pub fn mean_power(&self) -> f32 {
        if self.taps.is_empty() {
            return 0.0;
        }
        self.taps.iter().map(|t| t.norm_sqr()).sum::<f32>() / self.taps.len() as f32
    }
}

impl Default for ChannelEstimate {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// A block driven by the streaming engine, one call at a time.
pub trait StreamProcessor {
    /// Output chunk size; also the minimum output buffer length
    fn frame_len(&self) -> usize;

    /// History overlap required in every window
    fn history(&self) -> usize;

    /// Process one window, writing at most `frame_len` samples to `output`
    ///
    /// # Errors
    /// Fatal errors must be propagated by the caller without retry
    fn work(
        &mut self,
        window: &Window<'_>,
        output: &mut [Sample],
    ) -> Result<WorkOutput, ContractError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_estimate_clear() {
        let mut estimate = ChannelEstimate::from_taps(vec![Sample::new(1.0, 1.0); PSS_LEN]);
        assert!((estimate.mean_power() - 2.0).abs() < 1e-6);
        estimate.clear();
        assert_eq!(estimate.taps().len(), PSS_LEN);
        assert_eq!(estimate.mean_power(), 0.0);
    }

    #[test]
    fn test_channel_estimate_serde() {
        let estimate = ChannelEstimate::zeroed();
        let json = serde_json::to_string(&estimate).unwrap();
        let back: ChannelEstimate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, estimate);
    }
}
