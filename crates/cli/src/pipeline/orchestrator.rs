//! Pipeline orchestrator - coordinates reader, tracker and writers.
//!
//! A blocking reader task streams recording chunks over a bounded channel;
//! the tracker loop feeds them through a [`StreamDriver`] and writes every
//! emitted frame and tag as it goes.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{Sample, StreamTag, TrackerConfig};
use ingestion::{IqReader, IqWriter, StreamDriver};
use observability::record_work_metrics;
use sync_engine::ReferenceTracker;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::PipelineStats;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Validated tracker configuration
    pub tracker: TrackerConfig,

    /// Input recording
    pub input: PathBuf,

    /// Output recording of aligned frames
    pub output: PathBuf,

    /// JSON-lines tag file (None = tags only logged)
    pub tags: Option<PathBuf>,

    /// Maximum number of frames to emit (None = unlimited)
    pub max_frames: Option<u64>,

    /// Samples per read
    pub chunk_size: usize,

    /// Chunks buffered between reader and tracker
    pub buffer_size: usize,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline to completion
    pub async fn run(self) -> Result<PipelineStats> {
        let start_time = Instant::now();

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let tracker = ReferenceTracker::from_config(self.config.tracker.clone())
            .context("Failed to initialize tracker")?;
        let geometry = tracker.geometry();
        info!(
            cell_id = self.config.tracker.cell_id,
            frame_len = geometry.frame_len,
            history = geometry.history(),
            "Tracker initialized"
        );

        let reader = IqReader::open(&self.config.input)
            .with_context(|| format!("Failed to open {}", self.config.input.display()))?;
        let mut writer = IqWriter::create(&self.config.output)
            .with_context(|| format!("Failed to create {}", self.config.output.display()))?;
        let mut tag_writer = match &self.config.tags {
            Some(path) => Some(BufWriter::new(
                File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?,
            )),
            None => None,
        };

        let (tx, mut rx) = mpsc::channel::<Vec<Sample>>(self.config.buffer_size.max(1));
        let reader_task = spawn_reader(reader, self.config.chunk_size.max(1), tx);

        let mut driver = StreamDriver::new(tracker);
        let mut stats = PipelineStats::default();
        let max_frames = self.config.max_frames;

        'chunks: while let Some(chunk) = rx.recv().await {
            stats.samples_read += chunk.len() as u64;
            driver.extend(&chunk);

            while let Some(result) = driver.step().context("Tracker step failed")? {
                let status = driver.processor().status();
                record_work_metrics(&result, &status);
                stats.metrics.update(&result, &status);

                for tag in &result.tags {
                    warn!(offset = tag.offset, "tracking lost");
                    if let Some(out) = tag_writer.as_mut() {
                        write_tag(out, tag)?;
                    }
                }

                if result.produced_frame() {
                    stats.frames_emitted += 1;
                } else {
                    stats.frames_dropped += 1;
                }
                stats.tags += result.tags.len() as u64;

                if let Some(max) = max_frames {
                    if stats.frames_emitted >= max {
                        info!(frames = stats.frames_emitted, "Reached max frames limit");
                        writer.write(&driver.take_output().samples)?;
                        break 'chunks;
                    }
                }
            }

            // Output accumulates per chunk; flush it to disk each time
            writer.write(&driver.take_output().samples)?;
            tokio::task::yield_now().await;
        }

        // Dropping the receiver stops the reader at its next send
        drop(rx);
        match reader_task.await {
            Ok(result) => result?,
            Err(e) => warn!(error = %e, "Reader task panicked"),
        }

        let written = writer.finish()?;
        if let Some(mut out) = tag_writer {
            out.flush().context("Failed to flush tag file")?;
        }

        stats.samples_written = written;
        stats.duration = start_time.elapsed();

        info!(
            frames = stats.frames_emitted,
            samples_written = written,
            duration_secs = stats.duration.as_secs_f64(),
            "Pipeline complete"
        );

        Ok(stats)
    }
}

/// Read chunks on the blocking pool until EOF or the receiver hangs up
fn spawn_reader(
    mut reader: IqReader,
    chunk_size: usize,
    tx: mpsc::Sender<Vec<Sample>>,
) -> tokio::task::JoinHandle<Result<()>> {
    tokio::task::spawn_blocking(move || {
        loop {
            let chunk = reader.read_chunk(chunk_size).context("Failed to read input")?;
            if chunk.is_empty() {
                debug!("Input exhausted");
                return Ok(());
            }
            if tx.blocking_send(chunk).is_err() {
                debug!("Tracker stopped reading");
                return Ok(());
            }
        }
    })
}

fn write_tag(out: &mut impl Write, tag: &StreamTag) -> Result<()> {
    serde_json::to_writer(&mut *out, tag).context("Failed to serialize tag")?;
    out.write_all(b"\n").context("Failed to write tag")?;
    Ok(())
}
