//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use observability::ObservabilityConfig;
use std::path::PathBuf;

/// PSS Tracker - frame synchronization for complex baseband recordings
#[derive(Parser, Debug)]
#[command(
    name = "pss-tracker",
    author,
    version,
    about = "Primary synchronization signal tracker",
    long_about = "Locks onto the primary synchronization signal of a recorded\n\
                  baseband stream, emits aligned and frequency-corrected half-frames,\n\
                  and marks every loss of tracking in the output."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "PSS_TRACKER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "PSS_TRACKER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Track a recording and write the aligned frames
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration and derived frame geometry
    Info(InfoArgs),

    /// Generate a synthetic recording
    Simulate(SimulateArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "tracker.toml", env = "PSS_TRACKER_CONFIG")]
    pub config: PathBuf,

    /// Input recording (interleaved f32 IQ)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output recording of aligned frames
    #[arg(short, long)]
    pub output: PathBuf,

    /// Write stream tags as JSON lines
    #[arg(long)]
    pub tags: Option<PathBuf>,

    /// Override the cell identity from configuration
    #[arg(long)]
    pub cell_id: Option<u8>,

    /// Override the quality threshold from configuration
    #[arg(long)]
    pub threshold: Option<f32>,

    /// Maximum number of frames to emit (0 = unlimited)
    #[arg(long, default_value = "0", env = "PSS_TRACKER_MAX_FRAMES")]
    pub max_frames: u64,

    /// Samples read per chunk
    #[arg(long, default_value = "65536")]
    pub chunk_size: usize,

    /// Channel buffer size between reader and tracker (chunks)
    #[arg(long, default_value = "8")]
    pub buffer_size: usize,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "PSS_TRACKER_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "tracker.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "tracker.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `simulate` command
#[derive(Parser, Debug)]
pub struct SimulateArgs {
    /// Output recording
    #[arg(short, long)]
    pub output: PathBuf,

    /// Half-frames to generate
    #[arg(long, default_value = "200")]
    pub frames: usize,

    /// Signal-to-noise ratio in dB
    #[arg(long, default_value = "20.0", allow_hyphen_values = true)]
    pub snr_db: f64,

    /// Cell identity (0-2)
    #[arg(long, default_value = "0")]
    pub cell_id: u8,

    /// Symbol (FFT) size
    #[arg(long, default_value = "128")]
    pub fft_size: usize,

    /// Carrier offset in subcarrier spacings
    #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
    pub frequency_offset: f64,

    /// Noise-only samples before the first half-frame
    #[arg(long, default_value = "0")]
    pub timing_offset: usize,

    /// First faded half-frame (no synchronization symbol)
    #[arg(long, requires = "fade_frames")]
    pub fade_start: Option<usize>,

    /// Number of faded half-frames
    #[arg(long, requires = "fade_start")]
    pub fade_frames: Option<usize>,

    /// RNG seed
    #[arg(long, default_value = "24301")]
    pub seed: u64,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

impl Cli {
    /// Logging setup implied by `-v`, `-q` and `--log-format`.
    ///
    /// `--quiet` pins the level to `warn` even when RUST_LOG is set. The
    /// metrics endpoint is left to the `run` command.
    pub fn observability_config(&self) -> ObservabilityConfig {
        let default_log_level = if self.quiet {
            "warn"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        };

        ObservabilityConfig {
            log_format: self.log_format.into(),
            metrics_port: None,
            default_log_level: default_log_level.to_string(),
            honor_rust_log: !self.quiet,
        }
    }
}
