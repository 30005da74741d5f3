//! # Ingestion
//!
//! Sample stream plumbing around the tracker.
//!
//! Responsibilities:
//! - Maintain the history overlap and hand windows to a `StreamProcessor`
//! - Honour per-step consumption and production counts
//! - Read and write interleaved `f32` IQ recordings
//! - Synthesize test signals carrying the synchronization symbol
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{read_iq_file, StreamDriver};
//! use sync_engine::ReferenceTracker;
//!
//! let tracker = ReferenceTracker::from_config(config)?;
//! let mut driver = StreamDriver::new(tracker);
//! driver.extend(&read_iq_file("capture.cf32")?);
//! driver.pump()?;
//! let output = driver.into_output();
//! ```

mod config;
mod driver;
mod error;
mod generator;
mod iq;

// Re-exports
pub use config::{DriverMetrics, MetricsSnapshot};
pub use driver::{StreamDriver, StreamOutput};
pub use error::{IngestionError, Result};
pub use generator::{GeneratorConfig, SignalGenerator};
pub use iq::{read_iq_file, write_iq_file, IqReader, IqWriter, BYTES_PER_SAMPLE};
