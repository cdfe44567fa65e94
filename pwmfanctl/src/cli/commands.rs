//! CLI command and subcommand definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub use crate::format::OutputFormat;

/// pwmfan control CLI
#[derive(Parser, Debug)]
#[command(name = "pwmfanctl")]
#[command(version, about = "Calibrate and inspect pwmfan units", long_about = None)]
pub struct Cli {
    /// Configuration file (default: $PWMFAN_CONFIG, then ~/.config/pwmfan/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover the envelope of a fan unit by sweeping its drive level
    ///
    /// The fan is driven from full speed down to stall and back up. The unit
    /// is left at full speed afterwards, including when interrupted.
    Calibrate(CalibrateArgs),

    /// Print the drive level the curve of a unit yields per temperature
    Curve(CurveArgs),

    /// Read every configured unit once
    Status {
        /// Read simulated fans instead of the sysfs endpoints
        #[arg(long)]
        simulate: bool,
    },

    /// Configuration file helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Args, Debug, Clone)]
pub struct CalibrateArgs {
    /// Unit name from the configuration
    #[arg(short, long)]
    pub unit: String,

    /// Trailing window size (overrides [calibration] samples)
    #[arg(long)]
    pub samples: Option<usize>,

    /// Seconds between two samples (overrides [calibration] interval_secs)
    #[arg(long)]
    pub interval: Option<u64>,

    /// Maximum relative spread of a settled window (overrides [calibration] precision)
    #[arg(long)]
    pub precision: Option<f64>,

    /// Calibrate a simulated fan instead of the sysfs endpoints
    #[arg(long)]
    pub simulate: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CurveArgs {
    /// Unit name from the configuration
    #[arg(short, long)]
    pub unit: String,

    /// First temperature (default: min_temp - 5000)
    #[arg(long, allow_hyphen_values = true)]
    pub from: Option<i64>,

    /// Last temperature (default: max_temp + 5000)
    #[arg(long, allow_hyphen_values = true)]
    pub to: Option<i64>,

    /// Temperature increment
    #[arg(long, default_value_t = 1000)]
    pub step: i64,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print a documented example configuration
    Example,

    /// Load and validate the configuration file
    Check,

    /// Print the configuration file path in use
    Path,
}
