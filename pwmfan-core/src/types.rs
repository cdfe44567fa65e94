//! Core types shared between the daemon, the calibrator and the CLI

use serde::{Deserialize, Serialize};
use std::fmt;

/// Last observed readings of one fan unit.
///
/// Fields are `None` until the corresponding endpoint has been read during
/// the current tick, so a snapshot attached to an error shows exactly how far
/// the update got.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    /// Unit name from the configuration
    pub unit: String,
    /// Temperature reading (millidegrees Celsius for hwmon)
    pub temperature: Option<i64>,
    /// Fan speed reading (RPM for hwmon)
    pub fan_speed: Option<i64>,
    /// Applied drive level
    pub drive: Option<i64>,
}

impl UnitSnapshot {
    /// Snapshot with no readings yet.
    pub fn empty(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            temperature: None,
            fan_speed: None,
            drive: None,
        }
    }
}

impl fmt::Display for UnitSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn value(v: Option<i64>) -> String {
            v.map(|v| v.to_string()).unwrap_or_else(|| "?".to_string())
        }
        write!(
            f,
            "temperature: {}, fan speed: {}, drive: {}",
            value(self.temperature),
            value(self.fan_speed),
            value(self.drive)
        )
    }
}

/// Envelope parameters discovered by calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationResult {
    /// Lowest drive level that keeps a spinning fan spinning
    pub min_stop: i64,
    /// Settled fan speed closest to stall
    pub min_speed: i64,
    /// Settled temperature observed at that point
    pub min_temp: i64,
    /// Lowest drive level that reliably starts a stopped fan
    pub min_start: i64,
}
