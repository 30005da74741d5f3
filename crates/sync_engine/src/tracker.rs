//! The per-invocation processing step.

use contracts::{
    ChannelEstimate, ContractError, FrameGeometry, FrequencyCorrection, PeakResult, Sample,
    StreamProcessor, StreamTag, SyncSearch, TrackerConfig, TrackerStatus, Window, WorkOutput,
};
use tracing::{debug, error, info, instrument, warn};

use crate::aligner;
use crate::buffer::SmoothingRing;
use crate::tracking::{SearchDecision, TrackingMachine, TrackingState, Transition};

/// Synchronization tracker
///
/// Owns the lock state, the smoothing rings, the channel estimate and the
/// pending loss marker. The search and correction primitives are injected.
#[derive(Debug)]
pub struct PssTracker<S, C> {
    config: TrackerConfig,
    geometry: FrameGeometry,
    search: S,
    correction: C,
    machine: TrackingMachine,
    quality_ring: SmoothingRing,
    offset_ring: SmoothingRing,
    /// Last accepted peak, reused while the re-search timer runs
    last_peak: PeakResult,
    channel_estimate: ChannelEstimate,
    lost_pending: bool,
    peak_quality_max: f32,
    /// Output samples produced so far
    items_written: u64,
    status: TrackerStatus,
}

impl<S, C> PssTracker<S, C>
where
    S: SyncSearch,
    C: FrequencyCorrection,
{
    /// Create a tracker from a configuration and its primitives
    ///
    /// # Errors
    /// [`ContractError::Initialization`] when the geometry cannot hold a
    /// synchronization symbol.
    pub fn new(config: TrackerConfig, search: S, correction: C) -> Result<Self, ContractError> {
        let geometry = config.geometry();
        Self::with_geometry(config, geometry, search, correction)
    }

    /// Create a tracker with an explicit geometry (scaled-down streams)
    ///
    /// # Errors
    /// [`ContractError::Initialization`] unless
    /// `0 < symbol_len <= slot_len <= frame_len`.
    pub fn with_geometry(
        config: TrackerConfig,
        geometry: FrameGeometry,
        search: S,
        correction: C,
    ) -> Result<Self, ContractError> {
        if geometry.symbol_len == 0
            || geometry.slot_len < geometry.symbol_len
            || geometry.frame_len < geometry.slot_len
        {
            return Err(ContractError::initialization(
                "tracker",
                format!(
                    "invalid frame geometry: frame={}, slot={}, symbol={}",
                    geometry.frame_len, geometry.slot_len, geometry.symbol_len
                ),
            ));
        }

        let machine = TrackingMachine::new(config.track_after, config.track_every);
        let smoothing_len = config.smoothing_len;
        Ok(Self {
            config,
            geometry,
            search,
            correction,
            machine,
            quality_ring: SmoothingRing::new(smoothing_len),
            offset_ring: SmoothingRing::new(smoothing_len),
            last_peak: PeakResult::default(),
            channel_estimate: ChannelEstimate::zeroed(),
            lost_pending: false,
            peak_quality_max: 0.0,
            items_written: 0,
            status: TrackerStatus::default(),
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn geometry(&self) -> FrameGeometry {
        self.geometry
    }

    /// Current tracking state
    pub fn state(&self) -> TrackingState {
        self.machine.state()
    }

    pub fn is_locked(&self) -> bool {
        self.machine.is_locked()
    }

    /// Snapshot taken at the end of the last step
    pub fn status(&self) -> TrackerStatus {
        self.status
    }

    /// Channel estimate of the last corrected frame
    pub fn channel_estimate(&self) -> &ChannelEstimate {
        &self.channel_estimate
    }

    pub fn quality_ring(&self) -> &SmoothingRing {
        &self.quality_ring
    }

    pub fn offset_ring(&self) -> &SmoothingRing {
        &self.offset_ring
    }

    /// Peak the next skipped search will reuse
    pub fn last_peak(&self) -> PeakResult {
        self.last_peak
    }

    /// Whether a loss marker awaits the next aligned frame
    pub fn lost_pending(&self) -> bool {
        self.lost_pending
    }

    /// Output samples produced since construction
    pub fn items_written(&self) -> u64 {
        self.items_written
    }

    pub fn search(&self) -> &S {
        &self.search
    }

    pub fn correction(&self) -> &C {
        &self.correction
    }

    /// Run one processing step over `window`.
    ///
    /// Produces either exactly one aligned frame into `output` or nothing,
    /// and reports how many input samples to consume.
    ///
    /// # Errors
    /// Fatal: [`ContractError::OutputCapacity`],
    /// [`ContractError::AlignmentBounds`] or
    /// [`ContractError::ChannelEstimation`].
    #[instrument(
        level = "trace",
        name = "pss_tracker_process",
        skip(self, window, output),
        fields(available = window.available(), offset = self.items_written)
    )]
    pub fn process(
        &mut self,
        window: &Window<'_>,
        output: &mut [Sample],
    ) -> Result<WorkOutput, ContractError> {
        let frame_len = self.geometry.frame_len;
        if output.len() < frame_len {
            error!(required = frame_len, available = output.len(), "output buffer too small");
            return Err(ContractError::OutputCapacity {
                required: frame_len,
                available: output.len(),
            });
        }

        let searched = self.run_schedule(window);
        let quality = self.last_peak.quality;
        let over_threshold = quality > self.config.psr_threshold;

        match self.machine.on_metric(over_threshold) {
            Transition::None => {}
            Transition::Acquired => self.on_acquired(),
            Transition::Lost => self.on_lost(),
        }

        let result = if over_threshold || self.lost_pending {
            self.emit_frame(window, &mut output[..frame_len])?
        } else {
            WorkOutput::dropped(frame_len)
        };

        self.update_status(searched);
        Ok(result)
    }

    /// Search or reuse; returns whether a search ran
    fn run_schedule(&mut self, window: &Window<'_>) -> bool {
        match self.machine.schedule() {
            SearchDecision::Reuse => false,
            SearchDecision::Search => {
                let peak = self.search.search(window.current());
                debug!(
                    position = peak.position,
                    quality = peak.quality,
                    "synchronization search"
                );
                metrics::counter!("pss_searches_total").increment(1);

                self.quality_ring.push(peak.quality);
                self.peak_quality_max = self.peak_quality_max.max(peak.quality);
                self.last_peak = peak;
                true
            }
        }
    }

    fn on_acquired(&mut self) {
        info!(
            cell_id = self.config.cell_id,
            quality = self.last_peak.quality,
            position = self.last_peak.position,
            "lock acquired"
        );
        metrics::counter!("pss_lock_acquired_total").increment(1);
        self.search.reset_averaging();
    }

    fn on_lost(&mut self) {
        warn!(
            cell_id = self.config.cell_id,
            quality = self.last_peak.quality,
            offset = self.items_written,
            "tracking lost"
        );
        metrics::counter!("pss_tracking_lost_total").increment(1);

        self.search.reset_averaging();
        self.quality_ring.clear();
        self.offset_ring.clear();
        self.channel_estimate.clear();
        self.correction.reset_carry_over();
        self.lost_pending = true;
    }

    /// Align, copy and (when locked) correct one frame
    fn emit_frame(
        &mut self,
        window: &Window<'_>,
        output: &mut [Sample],
    ) -> Result<WorkOutput, ContractError> {
        let region = aligner::locate(&self.geometry, self.last_peak.position, window)
            .inspect_err(|e| error!(error = %e, "frame alignment failed"))?;
        output.copy_from_slice(region.slice(window));

        // The input advances to the frame end, so the next frame starts at
        // the read position.
        self.last_peak.position = self.geometry.slot_len;

        let mut tags = Vec::new();
        if self.machine.is_locked() {
            self.correct_frame(output)?;
        } else if self.lost_pending {
            tags.push(StreamTag::tracking_lost(self.items_written));
            self.lost_pending = false;
        }

        self.items_written += region.len as u64;
        Ok(WorkOutput {
            consumed: region.consume,
            produced: region.len,
            tags,
        })
    }

    fn correct_frame(&mut self, frame: &mut [Sample]) -> Result<(), ContractError> {
        let symbol_len = self.geometry.symbol_len;
        let symbol_end = self.geometry.slot_len;
        let symbol_start = self.geometry.sync_symbol_start();

        let offset = self
            .correction
            .estimate_offset(&frame[symbol_start..symbol_end]);
        self.offset_ring.push(offset);
        let mean = self.offset_ring.mean();

        self.correction
            .correct(frame, -mean / symbol_len as f32);

        self.channel_estimate = self
            .correction
            .estimate_channel(&frame[symbol_start..symbol_end])
            .inspect_err(|e| error!(error = %e, "channel estimation failed"))?;
        Ok(())
    }

    fn update_status(&mut self, searched: bool) {
        self.status = TrackerStatus {
            locked: self.machine.is_locked(),
            score: self.machine.score(),
            timer: self.machine.timer(),
            peak_quality: self.last_peak.quality,
            peak_quality_mean: self.quality_ring.mean(),
            peak_quality_max: self.peak_quality_max,
            frequency_offset_mean: self.offset_ring.mean(),
            searched,
        };
    }
}

impl<S, C> StreamProcessor for PssTracker<S, C>
where
    S: SyncSearch,
    C: FrequencyCorrection,
{
    fn frame_len(&self) -> usize {
        self.geometry.frame_len
    }

    fn history(&self) -> usize {
        self.geometry.history()
    }

    fn work(
        &mut self,
        window: &Window<'_>,
        output: &mut [Sample],
    ) -> Result<WorkOutput, ContractError> {
        self.process(window, output)
    }
}
