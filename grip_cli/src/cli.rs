//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "grip", version, about = "Force-controlled finger actuator")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/grip_config.toml")]
    pub config: PathBuf,

    /// Optional calibration CSV (headers: volts,newtons); replaces the configured force model
    #[arg(long, value_name = "FILE")]
    pub calibration: Option<PathBuf>,

    /// Log and report as JSON instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging] level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the control loop until interrupted
    Run {
        /// Start in OFF mode; the first button press activates the grip
        #[arg(long, action = ArgAction::SetTrue)]
        start_off: bool,
        /// Stop after this many ticks
        #[arg(long, value_name = "N")]
        ticks: Option<u64>,
        /// Override loop period in ms (10..=1000)
        #[arg(long, value_name = "MS")]
        period_ms: Option<u64>,
        /// Read the force sensor on a background sampler thread
        #[arg(long, action = ArgAction::SetTrue)]
        sampled: bool,
    },
    /// Read the force sensor and print the pipeline diagnostics
    Probe {
        /// Number of consecutive samples to evaluate
        #[arg(long, value_name = "N", default_value_t = 1)]
        samples: u32,
    },
    /// Validate config and calibration, acquire and release the hardware
    SelfCheck,
}
