//! Driver counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Driver metrics, shareable with a reporting task
#[derive(Debug, Default)]
pub struct DriverMetrics {
    /// Samples appended to the backlog
    pub samples_received: AtomicU64,

    /// Samples consumed by the processor
    pub samples_consumed: AtomicU64,

    /// Steps that produced a frame
    pub frames_emitted: AtomicU64,

    /// Steps that dropped their input
    pub frames_dropped: AtomicU64,

    /// Tags collected
    pub tags: AtomicU64,
}

impl DriverMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self, count: usize) {
        self.samples_received
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Record one processing step
    pub fn record_step(&self, consumed: usize, produced: usize, tags: usize) {
        self.samples_consumed
            .fetch_add(consumed as u64, Ordering::Relaxed);
        if produced > 0 {
            self.frames_emitted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.frames_dropped.fetch_add(1, Ordering::Relaxed);
        }
        self.tags.fetch_add(tags as u64, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            samples_received: self.samples_received.load(Ordering::Relaxed),
            samples_consumed: self.samples_consumed.load(Ordering::Relaxed),
            frames_emitted: self.frames_emitted.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            tags: self.tags.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub samples_received: u64,
    pub samples_consumed: u64,
    pub frames_emitted: u64,
    pub frames_dropped: u64,
    pub tags: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_accounting() {
        let metrics = DriverMetrics::new();
        metrics.record_received(100);
        metrics.record_step(20, 20, 1);
        metrics.record_step(20, 0, 0);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.samples_received, 100);
        assert_eq!(snapshot.samples_consumed, 40);
        assert_eq!(snapshot.frames_emitted, 1);
        assert_eq!(snapshot.frames_dropped, 1);
        assert_eq!(snapshot.tags, 1);
    }
}
