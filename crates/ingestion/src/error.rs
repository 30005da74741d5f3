//! Ingestion error types

use std::path::PathBuf;

use contracts::ContractError;
use thiserror::Error;

/// Ingestion error
#[derive(Debug, Error)]
pub enum IngestionError {
    /// The processor failed (fatal tracker conditions included)
    #[error(transparent)]
    Processor(#[from] ContractError),

    /// Recording could not be read or written
    #[error("io error on {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The processor reported an impossible consumption count
    #[error("processor consumed {consumed} samples with {available} available")]
    Consumption {
        /// Samples the processor asked to consume
        consumed: usize,
        /// Samples in the current region
        available: usize,
    },

    /// Generator parameters rejected
    #[error("invalid generator config: {0}")]
    Generator(String),
}

impl IngestionError {
    /// Whether the underlying error is a fatal tracker condition
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Processor(e) => e.is_fatal(),
            Self::Consumption { .. } => true,
            _ => false,
        }
    }
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
