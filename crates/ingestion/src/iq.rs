//! Interleaved `f32` IQ recordings (`.cf32`)
//!
//! Each sample is a little-endian `(re, im)` pair of `f32`, the layout of
//! `Complex32` on the supported targets.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use contracts::{ContractError, Sample};
use tracing::debug;

use crate::error::{IngestionError, Result};

/// Bytes per complex sample
pub const BYTES_PER_SAMPLE: usize = 2 * std::mem::size_of::<f32>();

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> IngestionError + '_ {
    move |source| IngestionError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn decode(bytes: &[u8]) -> Result<Vec<Sample>> {
    if bytes.len() % BYTES_PER_SAMPLE != 0 {
        return Err(ContractError::stream_format(format!(
            "{} bytes is not a whole number of {BYTES_PER_SAMPLE}-byte samples",
            bytes.len()
        ))
        .into());
    }
    Ok(bytemuck::pod_collect_to_vec::<u8, Sample>(bytes))
}

/// Read a whole recording
///
/// # Errors
/// [`IngestionError::Io`] on read failure; a `StreamFormat` processor error
/// when the file ends in a partial sample.
pub fn read_iq_file(path: impl AsRef<Path>) -> Result<Vec<Sample>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(io_error(path))?;
    let samples = decode(&bytes)?;
    debug!(path = %path.display(), samples = samples.len(), "read recording");
    Ok(samples)
}

/// Write a whole recording, replacing any existing file
///
/// # Errors
/// [`IngestionError::Io`] on write failure.
pub fn write_iq_file(path: impl AsRef<Path>, samples: &[Sample]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(io_error(path))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(bytemuck::cast_slice(samples))
        .and_then(|()| writer.flush())
        .map_err(io_error(path))?;
    debug!(path = %path.display(), samples = samples.len(), "wrote recording");
    Ok(())
}

/// Chunked reader for recordings too large to load at once
pub struct IqReader {
    path: PathBuf,
    reader: BufReader<File>,
    buffer: Vec<u8>,
}

impl IqReader {
    /// # Errors
    /// [`IngestionError::Io`] when the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(io_error(&path))?;
        Ok(Self {
            path,
            reader: BufReader::new(file),
            buffer: Vec::new(),
        })
    }

    /// Read up to `max_samples`; an empty result marks the end of the file
    ///
    /// # Errors
    /// [`IngestionError::Io`] on read failure; `StreamFormat` when the file
    /// ends in a partial sample.
    pub fn read_chunk(&mut self, max_samples: usize) -> Result<Vec<Sample>> {
        let want = max_samples * BYTES_PER_SAMPLE;
        self.buffer.clear();
        (&mut self.reader)
            .take(want as u64)
            .read_to_end(&mut self.buffer)
            .map_err(io_error(&self.path))?;
        decode(&self.buffer)
    }
}

/// Incremental writer for recordings produced frame by frame
pub struct IqWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    written: u64,
}

impl IqWriter {
    /// # Errors
    /// [`IngestionError::Io`] when the file cannot be created.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(io_error(&path))?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    /// # Errors
    /// [`IngestionError::Io`] on write failure.
    pub fn write(&mut self, samples: &[Sample]) -> Result<()> {
        self.writer
            .write_all(bytemuck::cast_slice(samples))
            .map_err(io_error(&self.path))?;
        self.written += samples.len() as u64;
        Ok(())
    }

    /// Samples written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush and close; returns the sample count
    ///
    /// # Errors
    /// [`IngestionError::Io`] on flush failure.
    pub fn finish(mut self) -> Result<u64> {
        self.writer.flush().map_err(io_error(&self.path))?;
        Ok(self.written)
    }
}
