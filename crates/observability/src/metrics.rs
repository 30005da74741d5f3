//! Tracker metrics
//!
//! Per-step recording through the `metrics` facade and an in-memory
//! aggregator for end-of-run summaries.

use contracts::{StreamTag, TrackerStatus, WorkOutput};
use metrics::{counter, gauge, histogram};

/// Record one processing step.
///
/// Searches, acquisitions and losses are counted by the tracker itself;
/// this covers flow control and the smoothed readings.
pub fn record_work_metrics(output: &WorkOutput, status: &TrackerStatus) {
    if output.produced_frame() {
        counter!("pss_frames_emitted_total").increment(1);
    } else {
        counter!("pss_frames_dropped_total").increment(1);
    }
    counter!("pss_samples_consumed_total").increment(output.consumed as u64);

    gauge!("pss_locked").set(if status.locked { 1.0 } else { 0.0 });
    gauge!("pss_score").set(f64::from(status.score));

    if status.searched {
        histogram!("pss_peak_quality").record(f64::from(status.peak_quality));
    }
    gauge!("pss_peak_quality_mean").set(f64::from(status.peak_quality_mean));
    gauge!("pss_frequency_offset").set(f64::from(status.frequency_offset_mean));

    for tag in &output.tags {
        record_stream_tag(tag);
    }
}

/// Record an emitted stream tag
pub fn record_stream_tag(tag: &StreamTag) {
    counter!("pss_stream_tags_total", "key" => tag.key.clone()).increment(1);
}

/// Tracker metrics aggregator
#[derive(Debug, Clone, Default)]
pub struct TrackerMetricsAggregator {
    /// Processing steps seen
    pub total_steps: u64,

    /// Steps that produced a frame
    pub frames_emitted: u64,

    /// Steps that dropped their input
    pub frames_dropped: u64,

    /// Steps that ran a fresh search
    pub searches: u64,

    /// Steps ending locked
    pub locked_steps: u64,

    /// Unlocked to locked transitions
    pub acquisitions: u64,

    /// `tracking_lost` tags observed
    pub losses: u64,

    /// Input samples consumed
    pub samples_consumed: u64,

    /// Fresh peak qualities
    pub quality_stats: RunningStats,

    /// Smoothed frequency offsets on locked steps
    pub offset_stats: RunningStats,

    was_locked: bool,
}

impl TrackerMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one step into the aggregate
    pub fn update(&mut self, output: &WorkOutput, status: &TrackerStatus) {
        self.total_steps += 1;
        self.samples_consumed += output.consumed as u64;
        if output.produced_frame() {
            self.frames_emitted += 1;
        } else {
            self.frames_dropped += 1;
        }

        if status.searched {
            self.searches += 1;
            self.quality_stats.push(f64::from(status.peak_quality));
        }
        if status.locked {
            self.locked_steps += 1;
            self.offset_stats
                .push(f64::from(status.frequency_offset_mean));
            if !self.was_locked {
                self.acquisitions += 1;
            }
        }
        self.was_locked = status.locked;

        self.losses += output
            .tags
            .iter()
            .filter(|t| t.is_tracking_lost())
            .count() as u64;
    }

    /// Build the summary report
    pub fn summary(&self) -> MetricsSummary {
        let ratio = |n: u64| {
            if self.total_steps > 0 {
                n as f64 / self.total_steps as f64 * 100.0
            } else {
                0.0
            }
        };

        MetricsSummary {
            total_steps: self.total_steps,
            frames_emitted: self.frames_emitted,
            frames_dropped: self.frames_dropped,
            searches: self.searches,
            acquisitions: self.acquisitions,
            losses: self.losses,
            samples_consumed: self.samples_consumed,
            lock_rate: ratio(self.locked_steps),
            search_rate: ratio(self.searches),
            peak_quality: StatsSummary::from(&self.quality_stats),
            frequency_offset: StatsSummary::from(&self.offset_stats),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Metrics summary
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_steps: u64,
    pub frames_emitted: u64,
    pub frames_dropped: u64,
    pub searches: u64,
    pub acquisitions: u64,
    pub losses: u64,
    pub samples_consumed: u64,
    /// Percentage of steps ending locked
    pub lock_rate: f64,
    /// Percentage of steps running a search
    pub search_rate: f64,
    pub peak_quality: StatsSummary,
    pub frequency_offset: StatsSummary,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Tracker Summary ===")?;
        writeln!(f, "Steps: {}", self.total_steps)?;
        writeln!(
            f,
            "Frames: {} emitted, {} dropped",
            self.frames_emitted, self.frames_dropped
        )?;
        writeln!(
            f,
            "Searches: {} ({:.2}%)",
            self.searches, self.search_rate
        )?;
        writeln!(f, "Locked: {:.2}% of steps", self.lock_rate)?;
        writeln!(
            f,
            "Lock acquired: {}, tracking lost: {}",
            self.acquisitions, self.losses
        )?;
        writeln!(f, "Samples consumed: {}", self.samples_consumed)?;
        writeln!(f, "Peak quality: {}", self.peak_quality)?;
        writeln!(f, "Frequency offset (subcarriers): {}", self.frequency_offset)?;
        Ok(())
    }
}

/// Summary of a [`RunningStats`]
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            return write!(f, "N/A");
        }
        write!(
            f,
            "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
            self.min, self.max, self.mean, self.std_dev, self.count
        )
    }
}

/// Online mean/variance (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// 0.0 when empty
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(locked: bool, searched: bool, quality: f32) -> TrackerStatus {
        TrackerStatus {
            locked,
            searched,
            peak_quality: quality,
            ..Default::default()
        }
    }

    fn emitted(tags: Vec<StreamTag>) -> WorkOutput {
        WorkOutput {
            consumed: 100,
            produced: 100,
            tags,
        }
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_counts_transitions() {
        let mut aggregator = TrackerMetricsAggregator::new();

        aggregator.update(&WorkOutput::dropped(100), &status(false, true, 1.0));
        aggregator.update(&emitted(vec![]), &status(true, true, 9.0));
        aggregator.update(&emitted(vec![]), &status(true, false, 9.0));
        aggregator.update(
            &emitted(vec![StreamTag::tracking_lost(200)]),
            &status(false, true, 1.5),
        );
        aggregator.update(&emitted(vec![]), &status(true, true, 8.0));

        let summary = aggregator.summary();
        assert_eq!(summary.total_steps, 5);
        assert_eq!(summary.frames_emitted, 4);
        assert_eq!(summary.frames_dropped, 1);
        assert_eq!(summary.searches, 4);
        assert_eq!(summary.acquisitions, 2);
        assert_eq!(summary.losses, 1);
        assert_eq!(summary.samples_consumed, 500);
        assert!((summary.lock_rate - 60.0).abs() < 1e-9);
        assert_eq!(summary.peak_quality.count, 4);
    }

    #[test]
    fn test_summary_display() {
        let summary = MetricsSummary {
            total_steps: 100,
            frames_emitted: 90,
            frames_dropped: 10,
            searches: 30,
            search_rate: 30.0,
            lock_rate: 85.0,
            peak_quality: StatsSummary {
                count: 30,
                min: 4.0,
                max: 12.0,
                mean: 9.0,
                std_dev: 1.5,
            },
            ..Default::default()
        };

        let output = summary.to_string();
        assert!(output.contains("Frames: 90 emitted, 10 dropped"));
        assert!(output.contains("30.00%"));
        assert!(output.contains("Frequency offset (subcarriers): N/A"));
    }
}
