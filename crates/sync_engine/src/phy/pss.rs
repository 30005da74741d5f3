//! Synchronization sequence generation and correlation search.

use std::f64::consts::PI;

use contracts::{ContractError, FrameGeometry, PeakResult, Sample, SyncSearch, PSS_LEN};
use tracing::trace;

use super::{subcarrier_bin, SymbolFft};

/// Zadoff-Chu roots indexed by cell identity
const ROOTS: [u32; 3] = [25, 29, 34];

/// Smallest symbol that fits 62 subcarriers plus DC
const MIN_FFT_SIZE: usize = 64;

/// Synchronization symbol for one cell identity, in both domains
#[derive(Debug, Clone)]
pub struct PssSequence {
    cell_id: u8,
    frequency: Vec<Sample>,
    time: Vec<Sample>,
}

impl PssSequence {
    /// Build the sequence for `cell_id` on a `fft_size`-point symbol.
    ///
    /// The time-domain replica is scaled to unit average power.
    ///
    /// # Errors
    /// [`ContractError::Initialization`] for an unknown cell identity or a
    /// symbol too short to carry the sequence.
    pub fn new(cell_id: u8, fft_size: usize) -> Result<Self, ContractError> {
        let root = *ROOTS.get(cell_id as usize).ok_or_else(|| {
            ContractError::initialization(
                "pss",
                format!("cell_id must be in 0..={}, got {cell_id}", ROOTS.len() - 1),
            )
        })?;
        if fft_size < MIN_FFT_SIZE {
            return Err(ContractError::initialization(
                "pss",
                format!("fft_size must be >= {MIN_FFT_SIZE}, got {fft_size}"),
            ));
        }

        let frequency = zadoff_chu(root);
        let time = to_time_domain(&frequency, fft_size);

        Ok(Self {
            cell_id,
            frequency,
            time,
        })
    }

    #[inline]
    pub fn cell_id(&self) -> u8 {
        self.cell_id
    }

    /// Sequence elements as mapped onto subcarriers
    #[inline]
    pub fn frequency(&self) -> &[Sample] {
        &self.frequency
    }

    /// Time-domain replica, one symbol long
    #[inline]
    pub fn time(&self) -> &[Sample] {
        &self.time
    }

    #[inline]
    pub fn fft_size(&self) -> usize {
        self.time.len()
    }
}

fn zadoff_chu(root: u32) -> Vec<Sample> {
    (0..PSS_LEN as u64)
        .map(|n| {
            let m = if n < 31 { n * (n + 1) } else { (n + 1) * (n + 2) };
            let phase = -PI * f64::from(root) * m as f64 / 63.0;
            Sample::new(phase.cos() as f32, phase.sin() as f32)
        })
        .collect()
}

fn to_time_domain(frequency: &[Sample], fft_size: usize) -> Vec<Sample> {
    let mut grid = vec![Sample::new(0.0, 0.0); fft_size];
    for (n, &x) in frequency.iter().enumerate() {
        grid[subcarrier_bin(n, fft_size)] = x;
    }
    let mut time = SymbolFft::new(fft_size).inverse(&grid);

    let power = time.iter().map(|s| s.norm_sqr()).sum::<f32>() / fft_size as f32;
    if power > 0.0 {
        let scale = power.sqrt().recip();
        time.iter_mut().for_each(|s| *s *= scale);
    }
    time
}

/// Sliding cross-correlation search over one frame of candidate offsets.
///
/// Candidate symbol starts begin at the last symbol of the first slot, so a
/// reported position never lies before the end of that slot and the frame it
/// implies never starts before the read position. Quality is the
/// correlation peak power over the strongest sidelobe outside a small guard
/// around the peak. With `alpha < 1` correlation powers are
/// exponentially averaged across searches, which only helps while the frame
/// phase of successive windows is stable.
#[derive(Debug, Clone)]
pub struct PssCorrelator {
    replica_conj: Vec<Sample>,
    frame_len: usize,
    first_start: usize,
    alpha: f32,
    guard: usize,
    averaged: Vec<f32>,
}

impl PssCorrelator {
    /// # Errors
    /// [`ContractError::Initialization`] when the sequence cannot be built
    /// or `alpha` is outside `(0, 1]`.
    pub fn new(cell_id: u8, geometry: FrameGeometry, alpha: f32) -> Result<Self, ContractError> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(ContractError::initialization(
                "pss",
                format!("averaging factor must be in (0, 1], got {alpha}"),
            ));
        }
        let sequence = PssSequence::new(cell_id, geometry.symbol_len)?;

        Ok(Self {
            replica_conj: sequence.time().iter().map(|s| s.conj()).collect(),
            frame_len: geometry.frame_len,
            first_start: geometry.sync_symbol_start(),
            alpha,
            guard: (geometry.symbol_len / 32).max(2),
            averaged: vec![0.0; geometry.frame_len],
        })
    }

    /// Earliest candidate symbol start
    pub fn first_start(&self) -> usize {
        self.first_start
    }

    /// Correlation power at each candidate start, from [`Self::first_start`]
    pub fn correlate(&self, samples: &[Sample]) -> Vec<f32> {
        let taps = self.replica_conj.len();
        let Some(last) = samples.len().checked_sub(taps) else {
            return Vec::new();
        };
        if last < self.first_start {
            return Vec::new();
        }
        let positions = (last - self.first_start + 1).min(self.frame_len);

        (self.first_start..self.first_start + positions)
            .map(|k| {
                samples[k..k + taps]
                    .iter()
                    .zip(&self.replica_conj)
                    .map(|(s, r)| s * r)
                    .sum::<Sample>()
                    .norm_sqr()
            })
            .collect()
    }

    fn peak_to_sidelobe(&self, powers: &[f32]) -> (usize, f32) {
        let (peak_idx, peak) = powers
            .iter()
            .copied()
            .enumerate()
            .fold((0, 0.0f32), |best, (i, p)| if p > best.1 { (i, p) } else { best });

        if peak <= 0.0 {
            return (peak_idx, 0.0);
        }

        let sidelobe = powers
            .iter()
            .enumerate()
            .filter(|(i, _)| i.abs_diff(peak_idx) > self.guard)
            .map(|(_, &p)| p)
            .fold(0.0f32, f32::max);

        (peak_idx, peak / sidelobe.max(f32::EPSILON * peak))
    }
}

impl SyncSearch for PssCorrelator {
    fn search(&mut self, samples: &[Sample]) -> PeakResult {
        let powers = self.correlate(samples);
        if powers.is_empty() {
            return PeakResult::default();
        }

        let (peak_idx, quality) = if self.alpha < 1.0 {
            let alpha = self.alpha;
            for (avg, p) in self.averaged.iter_mut().zip(&powers) {
                *avg = alpha * p + (1.0 - alpha) * *avg;
            }
            self.peak_to_sidelobe(&self.averaged[..powers.len()])
        } else {
            self.peak_to_sidelobe(&powers)
        };

        trace!(peak_idx, quality, "correlation peak");

        PeakResult {
            position: self.first_start + peak_idx + self.replica_conj.len(),
            quality,
        }
    }

    fn reset_averaging(&mut self) {
        self.averaged.fill(0.0);
    }
}
