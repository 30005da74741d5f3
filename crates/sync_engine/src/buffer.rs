//! Fixed-capacity smoothing rings for per-frame metrics.
//!
//! Values live in a `HeapRb` that overwrites its oldest slot once full, so
//! the occupied length is always `min(written, capacity)`. A separate
//! monotonically increasing counter records how many values were ever
//! written since the last clear.

use std::fmt;

use ringbuf::{traits::*, HeapRb};

/// Ring of recent `f32` readings with an arithmetic mean
pub struct SmoothingRing {
    values: HeapRb<f32>,
    written: u64,
}

impl fmt::Debug for SmoothingRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmoothingRing")
            .field("len", &self.values.occupied_len())
            .field("capacity", &self.capacity())
            .field("written", &self.written)
            .finish()
    }
}

impl SmoothingRing {
    /// Create an empty ring; a zero capacity is raised to one
    pub fn new(capacity: usize) -> Self {
        Self {
            values: HeapRb::new(capacity.max(1)),
            written: 0,
        }
    }

    /// Append a reading, overwriting the oldest once full
    #[inline]
    pub fn push(&mut self, value: f32) {
        self.values.push_overwrite(value);
        self.written += 1;
    }

    /// Mean over the `min(written, capacity)` available readings.
    ///
    /// Returns `0.0` for an empty ring.
    pub fn mean(&self) -> f32 {
        let count = self.values.occupied_len();
        if count == 0 {
            return 0.0;
        }
        let sum: f64 = self.values.iter().map(|&v| f64::from(v)).sum();
        (sum / count as f64) as f32
    }

    /// Drop every reading and reset the write counter
    pub fn clear(&mut self) {
        self.values.clear();
        self.written = 0;
    }

    /// Number of readings currently held
    #[inline]
    pub fn len(&self) -> usize {
        self.values.occupied_len()
    }

    /// Check if the ring holds no readings
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Maximum number of readings held
    #[inline]
    pub fn capacity(&self) -> usize {
        self.values.capacity().get()
    }

    /// Readings written since construction or the last clear
    #[inline]
    pub fn written(&self) -> u64 {
        self.written
    }
}
