//! Error types for pwmfan

use std::path::PathBuf;
use thiserror::Error;

use crate::types::UnitSnapshot;

/// Core error type for pwmfan operations
#[derive(Error, Debug)]
pub enum PwmFanError {
    /// An endpoint could not be opened or did not yield an integer
    #[error("Unable to read {}: {reason}", endpoint.display())]
    DeviceRead { endpoint: PathBuf, reason: String },

    /// An endpoint could not be opened or the write did not complete
    #[error("Unable to write {value} to {}: {reason}", endpoint.display())]
    DeviceWrite {
        endpoint: PathBuf,
        value: i64,
        reason: String,
    },

    /// Sampled temperature reached the critical maximum
    #[error("Temperature too high: {temperature} >= {limit}")]
    OverTemperature { temperature: i64, limit: i64 },

    /// Start sequence reached the maximum drive level without spin-up
    #[error("Unable to start fan (drive level {max_drive} reached)")]
    FanStartFailure { max_drive: i64 },

    /// Upward calibration sweep found no confirmed start
    #[error("No fan start detected up to drive level {max_drive}")]
    FanStartNotDetected { max_drive: i64 },

    /// Unit parameters violate their invariants
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Configuration file errors (missing, unreadable, malformed)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Shutdown was requested before the operation completed
    #[error("Operation cancelled by shutdown request")]
    Cancelled,

    /// A fatal error attributed to one fan unit
    #[error("Fan unit '{unit}' failed ({last}): {source}")]
    Unit {
        unit: String,
        last: UnitSnapshot,
        #[source]
        source: Box<PwmFanError>,
    },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PwmFanError {
    /// Attach the unit name and its last known readings to an error.
    ///
    /// Errors that already carry a unit are returned unchanged.
    pub fn for_unit(self, last: UnitSnapshot) -> Self {
        match self {
            err @ PwmFanError::Unit { .. } => err,
            err => PwmFanError::Unit {
                unit: last.unit.clone(),
                last,
                source: Box::new(err),
            },
        }
    }

    /// The innermost error, looking through unit attribution.
    pub fn root(&self) -> &PwmFanError {
        match self {
            PwmFanError::Unit { source, .. } => source.root(),
            err => err,
        }
    }
}

impl From<toml::de::Error> for PwmFanError {
    fn from(err: toml::de::Error) -> Self {
        PwmFanError::Config(err.to_string())
    }
}

/// Result type alias for pwmfan operations
pub type Result<T> = std::result::Result<T, PwmFanError>;
