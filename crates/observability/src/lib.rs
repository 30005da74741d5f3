//! # Observability
//!
//! Tracing + Prometheus metrics for the tracker.
//!
//! ## Features
//!
//! - Tracing initialization (JSON/Pretty/Compact)
//! - Prometheus exporter
//! - Per-step tracker metrics and in-memory aggregation
//!
//! ## Usage Example
//!
//! ```ignore
//! use observability::{init_with_config, metrics, ObservabilityConfig};
//!
//! init_with_config(ObservabilityConfig::default())?;
//!
//! let result = tracker.process(&window, &mut output)?;
//! metrics::record_work_metrics(&result, &tracker.status());
//! ```

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

// Re-exports
pub use crate::metrics::{
    record_stream_tag, record_work_metrics, MetricsSummary, RunningStats, StatsSummary,
    TrackerMetricsAggregator,
};

/// Observability configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ObservabilityConfig {
    /// Log format
    pub log_format: LogFormat,
    /// Prometheus port (None = disabled)
    pub metrics_port: Option<u16>,
    /// Filter directive used when RUST_LOG is unset or ignored
    pub default_log_level: String,
    /// Whether RUST_LOG overrides `default_log_level`
    pub honor_rust_log: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            metrics_port: None,
            default_log_level: "info".to_string(),
            honor_rust_log: true,
        }
    }
}

/// Log format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Structured JSON
    #[default]
    Json,
    /// Multi-line human readable
    Pretty,
    /// Single line
    Compact,
}

impl ObservabilityConfig {
    fn env_filter(&self) -> EnvFilter {
        if self.honor_rust_log {
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&self.default_log_level))
        } else {
            EnvFilter::new(&self.default_log_level)
        }
    }
}

/// Install the global subscriber and, when a port is set, the Prometheus
/// recorder.
///
/// # Errors
/// Fails when a global subscriber or recorder is already installed.
pub fn init_with_config(config: ObservabilityConfig) -> Result<()> {
    let fmt_layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(false).boxed(),
    };

    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    if let Some(port) = config.metrics_port {
        init_metrics_only(port)?;
    }

    tracing::debug!(
        log_format = ?config.log_format,
        metrics_port = ?config.metrics_port,
        level = %config.default_log_level,
        "observability initialized"
    );

    Ok(())
}

/// Install only the Prometheus recorder and its HTTP listener
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus recorder")?;

    tracing::info!(port, "Prometheus metrics endpoint initialized");
    Ok(())
}
