//! Tracker outputs: peak results, stream tags, per-step work results and
//! status snapshots.

use serde::{Deserialize, Serialize};

/// Key of the marker attached to the first output sample after lock is lost.
///
/// Shared by every tracker instance in the process.
pub const TRACKING_LOST_TAG: &str = "tracking_lost";

/// Result of one synchronization search
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PeakResult {
    /// Offset into the window's current region, one past the end of the
    /// detected synchronization symbol
    pub position: usize,

    /// Peak-to-sidelobe style quality metric
    pub quality: f32,
}

/// Payload-less marker attached to an absolute output sample offset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamTag {
    /// Absolute output sample offset
    pub offset: u64,

    /// Tag key
    pub key: String,
}

impl StreamTag {
    /// Create a tracking-lost marker at `offset`
    pub fn tracking_lost(offset: u64) -> Self {
        Self {
            offset,
            key: TRACKING_LOST_TAG.to_string(),
        }
    }

    /// Whether this is a tracking-lost marker
    pub fn is_tracking_lost(&self) -> bool {
        self.key == TRACKING_LOST_TAG
    }
}

/// Flow-control result of one processing step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkOutput {
    /// Input samples to advance past
    pub consumed: usize,

    /// Output samples written (zero or exactly one frame)
    pub produced: usize,

    /// Tags attached to the produced samples
    pub tags: Vec<StreamTag>,
}

impl WorkOutput {
    /// Drop `consumed` samples without producing output
    pub fn dropped(consumed: usize) -> Self {
        Self {
            consumed,
            produced: 0,
            tags: Vec::new(),
        }
    }

    /// Whether a frame was produced this step
    pub fn produced_frame(&self) -> bool {
        self.produced > 0
    }
}

/// Tracker state snapshot (for diagnostics and metrics)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerStatus {
    /// Whether the tracker holds lock
    pub locked: bool,

    /// Consecutive qualifying frames (clamped at the lock threshold)
    pub score: u32,

    /// Frames left before the next forced re-search (0 when unlocked)
    pub timer: u32,

    /// Quality of the peak used this step
    pub peak_quality: f32,

    /// Mean of the quality ring
    pub peak_quality_mean: f32,

    /// Largest quality observed since construction
    pub peak_quality_max: f32,

    /// Mean of the frequency-offset ring (subcarrier units)
    pub frequency_offset_mean: f32,

    /// Whether a search ran this step
    pub searched: bool,
}
