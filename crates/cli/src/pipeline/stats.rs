//! Pipeline statistics.

use std::time::Duration;

use observability::TrackerMetricsAggregator;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Steps that emitted an aligned frame
    pub frames_emitted: u64,

    /// Steps that dropped their input
    pub frames_dropped: u64,

    /// Stream tags emitted
    pub tags: u64,

    /// Samples read from the input recording
    pub samples_read: u64,

    /// Samples written to the output recording
    pub samples_written: u64,

    /// Total duration of the run
    pub duration: Duration,

    /// Tracker metrics aggregator
    pub metrics: TrackerMetricsAggregator,
}

impl PipelineStats {
    /// Input throughput in samples per second
    pub fn samples_per_sec(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.samples_read as f64 / secs
        } else {
            0.0
        }
    }

    /// Dropped steps as a percentage of all steps
    pub fn drop_rate(&self) -> f64 {
        let total = self.frames_emitted + self.frames_dropped;
        if total > 0 {
            (self.frames_dropped as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Pipeline Statistics ===\n");
        println!("Overview");
        println!("  Duration: {:.2}s", self.duration.as_secs_f64());
        println!("  Samples read: {}", self.samples_read);
        println!("  Samples written: {}", self.samples_written);
        println!("  Throughput: {:.0} samples/s", self.samples_per_sec());
        println!(
            "  Frames: {} emitted, {} dropped ({:.2}%)",
            self.frames_emitted,
            self.frames_dropped,
            self.drop_rate()
        );
        println!("  Tags: {}", self.tags);
        println!();
        print!("{}", self.metrics.summary());
        println!();
    }
}
