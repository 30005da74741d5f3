//! Layered error definitions
//!
//! Categorized by source: config / tracker / stream

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Tracker Errors (fatal) =====
    /// A search or correction primitive rejected its parameters
    #[error("failed to initialize {component}: {message}")]
    Initialization { component: String, message: String },

    /// The aligned frame region falls outside the supplied window
    #[error(
        "frame region out of bounds: start={frame_start}, len={frame_len}, available={available}"
    )]
    AlignmentBounds {
        /// Frame start relative to the window's current region (may be negative)
        frame_start: i64,
        frame_len: usize,
        available: usize,
    },

    /// The channel estimator reported an internal failure
    #[error("channel estimation failed: {message}")]
    ChannelEstimation { message: String },

    /// Output buffer cannot hold one frame
    #[error("output buffer too small: required={required}, available={available}")]
    OutputCapacity { required: usize, available: usize },

    // ===== Stream Errors =====
    /// Malformed sample stream
    #[error("stream format error: {message}")]
    StreamFormat { message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create initialization error
    pub fn initialization(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Initialization {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create channel estimation error
    pub fn channel_estimation(message: impl Into<String>) -> Self {
        Self::ChannelEstimation {
            message: message.into(),
        }
    }

    /// Create stream format error
    pub fn stream_format(message: impl Into<String>) -> Self {
        Self::StreamFormat {
            message: message.into(),
        }
    }

    /// Whether this error terminates the tracker.
    ///
    /// Fatal errors must be propagated to the host without retry.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Initialization { .. }
                | Self::AlignmentBounds { .. }
                | Self::ChannelEstimation { .. }
                | Self::OutputCapacity { .. }
        )
    }
}
