//! Streaming driver
//!
//! Plays the role of the host streaming engine: keeps a backlog prefixed by
//! the processor's history, hands out windows, and applies the consumption
//! and production counts each step reports.

use std::sync::Arc;

use contracts::{Sample, StreamProcessor, StreamTag, Window, WorkOutput};
use tracing::{debug, instrument, trace};

use crate::config::DriverMetrics;
use crate::error::{IngestionError, Result};

/// Everything a driver has produced so far
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamOutput {
    /// Concatenated output frames
    pub samples: Vec<Sample>,

    /// Tags at absolute output offsets
    pub tags: Vec<StreamTag>,

    /// Steps that produced a frame
    pub frames: u64,

    /// Steps that dropped their input
    pub dropped: u64,
}

impl StreamOutput {
    /// Offsets of `tracking_lost` markers
    pub fn lost_offsets(&self) -> Vec<u64> {
        self.tags
            .iter()
            .filter(|t| t.is_tracking_lost())
            .map(|t| t.offset)
            .collect()
    }
}

/// Drives a [`StreamProcessor`] over an incrementally supplied stream
pub struct StreamDriver<P> {
    processor: P,
    /// `history` samples followed by the unread stream
    backlog: Vec<Sample>,
    history: usize,
    frame_len: usize,
    scratch: Vec<Sample>,
    output: StreamOutput,
    metrics: Arc<DriverMetrics>,
}

impl<P: StreamProcessor> StreamDriver<P> {
    /// Create a driver; the history is primed with zeros
    pub fn new(processor: P) -> Self {
        let history = processor.history();
        let frame_len = processor.frame_len();
        Self {
            processor,
            backlog: vec![Sample::new(0.0, 0.0); history],
            history,
            frame_len,
            scratch: vec![Sample::new(0.0, 0.0); frame_len],
            output: StreamOutput::default(),
            metrics: Arc::new(DriverMetrics::new()),
        }
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    pub fn processor_mut(&mut self) -> &mut P {
        &mut self.processor
    }

    /// Shared counters
    pub fn metrics(&self) -> Arc<DriverMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn output(&self) -> &StreamOutput {
        &self.output
    }

    /// Take the collected output, leaving an empty one behind
    pub fn take_output(&mut self) -> StreamOutput {
        std::mem::take(&mut self.output)
    }

    pub fn into_output(self) -> StreamOutput {
        self.output
    }

    /// Recover the processor, discarding buffered samples
    pub fn into_processor(self) -> P {
        self.processor
    }

    /// Unread samples buffered after the history
    pub fn pending(&self) -> usize {
        self.backlog.len() - self.history
    }

    /// Whether enough samples are buffered for one step.
    ///
    /// A step consumes at most `frame_start + frame_len < 2 * frame_len`
    /// samples and searches `frame_len` positions, so two frames suffice.
    pub fn ready(&self) -> bool {
        self.pending() >= 2 * self.frame_len
    }

    /// Append samples to the backlog
    pub fn extend(&mut self, samples: &[Sample]) {
        self.backlog.extend_from_slice(samples);
        self.metrics.record_received(samples.len());
    }

    /// Run one step if enough samples are buffered
    ///
    /// # Errors
    /// Propagates processor errors without retry; an out-of-range
    /// consumption count is reported as [`IngestionError::Consumption`].
    #[instrument(level = "trace", name = "stream_driver_step", skip(self))]
    pub fn step(&mut self) -> Result<Option<WorkOutput>> {
        if !self.ready() {
            return Ok(None);
        }

        let window = Window::new(&self.backlog, self.history);
        let available = window.available();
        let result = self.processor.work(&window, &mut self.scratch)?;

        if result.consumed == 0 || result.consumed > available {
            return Err(IngestionError::Consumption {
                consumed: result.consumed,
                available,
            });
        }

        if result.produced > 0 {
            self.output
                .samples
                .extend_from_slice(&self.scratch[..result.produced]);
            self.output.frames += 1;
        } else {
            self.output.dropped += 1;
        }
        for tag in &result.tags {
            debug!(offset = tag.offset, key = %tag.key, "stream tag");
        }
        self.output.tags.extend(result.tags.iter().cloned());
        self.metrics
            .record_step(result.consumed, result.produced, result.tags.len());
        metrics::counter!("stream_driver_steps_total").increment(1);
        metrics::gauge!("stream_driver_backlog").set(self.pending() as f64);

        // Dropping the consumed prefix leaves exactly `history` samples
        // before the new read position.
        self.backlog.drain(..result.consumed);
        trace!(
            consumed = result.consumed,
            produced = result.produced,
            pending = self.pending(),
            "step complete"
        );

        Ok(Some(result))
    }

    /// Run steps until the backlog runs low; returns the number of steps
    ///
    /// # Errors
    /// See [`StreamDriver::step`].
    pub fn pump(&mut self) -> Result<usize> {
        let mut steps = 0;
        while self.step()?.is_some() {
            steps += 1;
        }
        Ok(steps)
    }

    /// Feed a whole stream and return everything produced
    ///
    /// # Errors
    /// See [`StreamDriver::step`].
    pub fn run(mut self, samples: &[Sample]) -> Result<StreamOutput> {
        self.extend(samples);
        self.pump()?;
        Ok(self.output)
    }
}

#[cfg(test)]
mod tests {
    use contracts::ContractError;

    use super::*;

    /// Emits the first frame of every current region, tagging every third
    struct Passthrough {
        frame_len: usize,
        steps: u64,
        written: u64,
        overconsume: bool,
    }

    impl Passthrough {
        fn new(frame_len: usize) -> Self {
            Self {
                frame_len,
                steps: 0,
                written: 0,
                overconsume: false,
            }
        }
    }

    impl StreamProcessor for Passthrough {
        fn frame_len(&self) -> usize {
            self.frame_len
        }

        fn history(&self) -> usize {
            self.frame_len - 1
        }

        fn work(
            &mut self,
            window: &Window<'_>,
            output: &mut [Sample],
        ) -> std::result::Result<WorkOutput, ContractError> {
            self.steps += 1;
            if self.overconsume {
                return Ok(WorkOutput::dropped(window.available() + 1));
            }
            if self.steps % 2 == 0 {
                return Ok(WorkOutput::dropped(self.frame_len));
            }
            output[..self.frame_len].copy_from_slice(&window.current()[..self.frame_len]);
            let mut tags = Vec::new();
            if self.steps % 3 == 0 {
                tags.push(StreamTag::tracking_lost(self.written));
            }
            self.written += self.frame_len as u64;
            Ok(WorkOutput {
                consumed: self.frame_len,
                produced: self.frame_len,
                tags,
            })
        }
    }

    fn ramp(len: usize) -> Vec<Sample> {
        (0..len).map(|i| Sample::new(i as f32, 0.0)).collect()
    }

    #[test]
    fn test_history_primed_with_zeros() {
        let driver = StreamDriver::new(Passthrough::new(8));
        assert_eq!(driver.pending(), 0);
        assert!(!driver.ready());
    }

    #[test]
    fn test_steps_wait_for_two_frames() {
        let mut driver = StreamDriver::new(Passthrough::new(8));
        driver.extend(&ramp(15));
        assert_eq!(driver.pump().unwrap(), 0);

        driver.extend(&ramp(1));
        assert_eq!(driver.pump().unwrap(), 1);
        assert_eq!(driver.pending(), 8);
    }

    #[test]
    fn test_consumption_and_output_ordering() {
        let output = StreamDriver::new(Passthrough::new(8))
            .run(&ramp(64))
            .unwrap();

        // Steps 1..=7 run (pending 64 -> 8); odd steps emit
        assert_eq!(output.frames, 4);
        assert_eq!(output.dropped, 3);
        let firsts: Vec<f32> = output.samples.chunks(8).map(|c| c[0].re).collect();
        assert_eq!(firsts, vec![0.0, 16.0, 32.0, 48.0]);
        assert_eq!(output.lost_offsets(), vec![8]);
    }

    #[test]
    fn test_overconsumption_rejected() {
        let mut processor = Passthrough::new(8);
        processor.overconsume = true;
        let mut driver = StreamDriver::new(processor);
        driver.extend(&ramp(16));

        let err = driver.step().unwrap_err();
        assert!(matches!(
            err,
            IngestionError::Consumption {
                consumed: 17,
                available: 16
            }
        ));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_metrics_follow_steps() {
        let mut driver = StreamDriver::new(Passthrough::new(4));
        let metrics = driver.metrics();
        driver.extend(&ramp(16));
        driver.pump().unwrap();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.samples_received, 16);
        assert_eq!(snapshot.samples_consumed, 12);
        assert_eq!(snapshot.frames_emitted + snapshot.frames_dropped, 3);
    }
}
