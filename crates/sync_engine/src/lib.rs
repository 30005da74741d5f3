//! # Sync Engine
//!
//! Synchronization tracker for periodic frame alignment of complex baseband
//! streams.
//!
//! Responsibilities:
//! - lock acquisition with hysteresis, re-search scheduling
//! - metric smoothing
//! - frame alignment and input consumption
//! - frequency correction and channel estimation on locked frames
//! - `tracking_lost` marker emission
//!
//! ## Example
//!
//! ```ignore
//! use contracts::{TrackerConfig, Window};
//! use sync_engine::ReferenceTracker;
//!
//! let config = TrackerConfig::new(0, 3.0, 4, 4);
//! let mut tracker = ReferenceTracker::from_config(config)?;
//!
//! let window = Window::new(&samples, tracker.geometry().history());
//! let result = tracker.process(&window, &mut output)?;
//! ```

mod aligner;
mod buffer;
pub mod phy;
mod tracker;
mod tracking;

pub use aligner::{locate, FrameRegion};
pub use buffer::SmoothingRing;
pub use phy::{PssCorrector, PssCorrelator, PssSequence};
pub use tracker::PssTracker;
pub use tracking::{SearchDecision, TrackingMachine, TrackingState, Transition};

// Re-export contracts types
pub use contracts::{
    ChannelEstimate, ContractError, FrameGeometry, PeakResult, StreamTag, TrackerConfig,
    TrackerStatus, WorkOutput,
};

/// Tracker wired to the bundled correlator and corrector
pub type ReferenceTracker = PssTracker<PssCorrelator, PssCorrector>;

impl ReferenceTracker {
    /// Build the reference primitives for `config` and wrap them
    ///
    /// # Errors
    /// [`ContractError::Initialization`] when a primitive rejects the
    /// configuration.
    pub fn from_config(config: TrackerConfig) -> Result<Self, ContractError> {
        let geometry = config.geometry();
        let search = PssCorrelator::new(config.cell_id, geometry, config.search_alpha)?;
        let correction = PssCorrector::new(config.cell_id, geometry)?;
        Self::new(config, search, correction)
    }
}
