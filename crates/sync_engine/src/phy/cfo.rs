//! Frequency offset estimation, correction and channel estimation on the
//! synchronization symbol.

use std::f32::consts::PI;

use contracts::{
    ChannelEstimate, ContractError, FrequencyCorrection, FrameGeometry, Sample,
};

use super::{subcarrier_bin, PssSequence, SymbolFft};

/// Frequencies closer than this reuse the cached rotation table
const FREQ_TOLERANCE: f32 = 1e-7;

/// Reference frequency corrector.
///
/// Offsets are estimated from the phase drift between the two halves of the
/// received symbol correlated against the replica, in units of subcarrier
/// spacing. Every correction starts at phase zero; the rotation table built
/// for the last requested frequency is cached and reused while the next
/// request stays within tolerance of it.
#[derive(Debug, Clone)]
pub struct PssCorrector {
    replica: Vec<Sample>,
    reference_bins: Vec<Sample>,
    bins: Vec<usize>,
    fft: SymbolFft,
    last_freq: f32,
    table: Vec<Sample>,
}

impl PssCorrector {
    /// # Errors
    /// [`ContractError::Initialization`] when the sequence cannot be built.
    pub fn new(cell_id: u8, geometry: FrameGeometry) -> Result<Self, ContractError> {
        let sequence = PssSequence::new(cell_id, geometry.symbol_len)?;
        let fft_size = sequence.fft_size();
        let bins: Vec<usize> = (0..sequence.frequency().len())
            .map(|n| subcarrier_bin(n, fft_size))
            .collect();
        let mut fft = SymbolFft::new(fft_size);
        let reference = fft.forward(sequence.time());
        let reference_bins = bins.iter().map(|&bin| reference[bin]).collect();

        Ok(Self {
            replica: sequence.time().to_vec(),
            reference_bins,
            bins,
            fft,
            last_freq: 0.0,
            table: Vec::new(),
        })
    }

    /// Frequency of the cached rotation table
    pub fn last_freq(&self) -> f32 {
        self.last_freq
    }

    fn rebuild_table(&mut self, len: usize, freq: f32) {
        self.table = (0..len)
            .map(|n| {
                let phase = 2.0 * PI * freq * n as f32;
                Sample::new(phase.cos(), phase.sin())
            })
            .collect();
        self.last_freq = freq;
    }
}

impl FrequencyCorrection for PssCorrector {
    fn estimate_offset(&mut self, symbol: &[Sample]) -> f32 {
        let len = self.replica.len();
        if symbol.len() < len {
            return 0.0;
        }
        let half = len / 2;

        let correlate = |range: std::ops::Range<usize>| -> Sample {
            symbol[range.clone()]
                .iter()
                .zip(&self.replica[range])
                .map(|(s, r)| s * r.conj())
                .sum()
        };
        let first = correlate(0..half);
        let second = correlate(half..len);

        (first.conj() * second).arg() / PI
    }

    fn correct(&mut self, buffer: &mut [Sample], freq: f32) {
        if (freq - self.last_freq).abs() > FREQ_TOLERANCE || self.table.len() < buffer.len() {
            self.rebuild_table(buffer.len(), freq);
        }
        for (s, rot) in buffer.iter_mut().zip(&self.table) {
            *s *= rot;
        }
    }

    fn estimate_channel(&mut self, symbol: &[Sample]) -> Result<ChannelEstimate, ContractError> {
        let len = self.replica.len();
        if symbol.len() < len {
            return Err(ContractError::channel_estimation(format!(
                "symbol too short: need {len} samples, got {}",
                symbol.len()
            )));
        }
        let spectrum = self.fft.forward(&symbol[..len]);

        let taps: Vec<Sample> = self
            .bins
            .iter()
            .zip(&self.reference_bins)
            .map(|(&bin, reference)| spectrum[bin] / reference)
            .collect();

        if taps.iter().any(|t| !t.is_finite()) {
            return Err(ContractError::channel_estimation(
                "non-finite channel tap",
            ));
        }
        Ok(ChannelEstimate::from_taps(taps))
    }

    fn reset_carry_over(&mut self) {
        self.last_freq = 0.0;
        self.table.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::PSS_LEN;

    fn rotate(samples: &[Sample], freq: f32) -> Vec<Sample> {
        samples
            .iter()
            .enumerate()
            .map(|(n, s)| {
                let phase = 2.0 * PI * freq * n as f32;
                s * Sample::new(phase.cos(), phase.sin())
            })
            .collect()
    }

    #[test]
    fn test_offset_estimate_in_subcarriers() {
        let geometry = FrameGeometry::from_fft_size(128);
        let mut corrector = PssCorrector::new(0, geometry).unwrap();
        let sequence = PssSequence::new(0, 128).unwrap();

        // 0.3 subcarrier offset
        let received = rotate(sequence.time(), 0.3 / 128.0);
        let estimate = corrector.estimate_offset(&received);
        assert!((estimate - 0.3).abs() < 0.02, "estimate {estimate}");
    }

    #[test]
    fn test_correct_removes_offset() {
        let geometry = FrameGeometry::from_fft_size(128);
        let mut corrector = PssCorrector::new(1, geometry).unwrap();
        let sequence = PssSequence::new(1, 128).unwrap();

        let mut received = rotate(sequence.time(), 0.25 / 128.0);
        let estimate = corrector.estimate_offset(&received);
        corrector.correct(&mut received, -estimate / 128.0);

        assert!(corrector.estimate_offset(&received).abs() < 0.02);
        assert!((corrector.last_freq() + estimate / 128.0).abs() < 1e-6);
    }

    #[test]
    fn test_channel_estimate_of_clean_symbol_is_flat() {
        let geometry = FrameGeometry::from_fft_size(128);
        let mut corrector = PssCorrector::new(2, geometry).unwrap();
        let sequence = PssSequence::new(2, 128).unwrap();

        let scaled: Vec<Sample> = sequence
            .time()
            .iter()
            .map(|s| s * Sample::new(0.0, 2.0))
            .collect();
        let estimate = corrector.estimate_channel(&scaled).unwrap();

        assert_eq!(estimate.taps().len(), PSS_LEN);
        for tap in estimate.taps() {
            assert!((tap - Sample::new(0.0, 2.0)).norm() < 1e-2, "tap {tap}");
        }
    }

    #[test]
    fn test_channel_estimate_short_symbol_fails() {
        let geometry = FrameGeometry::from_fft_size(128);
        let mut corrector = PssCorrector::new(0, geometry).unwrap();
        let err = corrector
            .estimate_channel(&[Sample::new(1.0, 0.0); 10])
            .unwrap_err();
        assert!(matches!(err, ContractError::ChannelEstimation { .. }));
    }

    #[test]
    fn test_each_correction_starts_at_phase_zero() {
        let geometry = FrameGeometry::from_fft_size(128);
        let mut corrector = PssCorrector::new(0, geometry).unwrap();

        let mut first = vec![Sample::new(1.0, 0.0); 16];
        let mut second = vec![Sample::new(1.0, 0.0); 16];
        corrector.correct(&mut first, 0.05);
        corrector.correct(&mut second, 0.05);

        assert_eq!(first, second);
        assert_eq!(second[0], Sample::new(1.0, 0.0));
    }

    #[test]
    fn test_reset_carry_over() {
        let geometry = FrameGeometry::from_fft_size(128);
        let mut corrector = PssCorrector::new(0, geometry).unwrap();
        let mut buffer = vec![Sample::new(1.0, 0.0); 32];
        corrector.correct(&mut buffer, 0.01);
        assert!((corrector.last_freq() - 0.01).abs() < 1e-9);

        corrector.reset_carry_over();
        assert_eq!(corrector.last_freq(), 0.0);
    }
}
