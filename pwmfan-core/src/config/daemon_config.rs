//! Daemon configuration loaded once at startup
//!
//! This configuration is read-only after the daemon starts.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use super::unit::UnitConfig;
use crate::error::{PwmFanError, Result};

fn default_poll_interval_secs() -> u64 {
    2
}

fn default_start_delay_ms() -> u64 {
    1000
}

/// Calibration sweep settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSettings {
    /// Size of the trailing sample window
    pub samples: usize,
    /// Seconds between two samples
    pub interval_secs: u64,
    /// Maximum relative spread of a settled window (0.015 = 1.5%)
    pub precision: f64,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            samples: 15,
            interval_secs: 1,
            precision: 0.015,
        }
    }
}

impl CalibrationSettings {
    /// Delay between two samples.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Check `samples` and `precision`.
    pub fn validate(&self) -> Result<()> {
        if self.samples == 0 {
            return Err(PwmFanError::InvalidConfiguration(
                "calibration.samples must be at least 1".to_string(),
            ));
        }
        if !(self.precision > 0.0) {
            return Err(PwmFanError::InvalidConfiguration(format!(
                "calibration.precision must be positive, got {}",
                self.precision
            )));
        }
        Ok(())
    }
}

/// Configuration for the pwmfan daemon and CLI.
///
/// Located at `~/.config/pwmfan/config.toml` by default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Seconds between two control ticks
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Milliseconds between two increments of a start sequence
    #[serde(default = "default_start_delay_ms")]
    pub start_delay_ms: u64,

    /// Calibration sweep settings
    #[serde(default)]
    pub calibration: CalibrationSettings,

    /// Regulated fan units, processed in this order every tick
    #[serde(default)]
    pub units: Vec<UnitConfig>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            start_delay_ms: default_start_delay_ms(),
            calibration: CalibrationSettings::default(),
            units: Vec::new(),
        }
    }
}

impl DaemonConfig {
    /// Parse DaemonConfig from TOML string.
    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize DaemonConfig to TOML string.
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Read, parse and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PwmFanError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config = Self::from_toml(&content).map_err(|e| {
            PwmFanError::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Check global settings and every unit.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(PwmFanError::InvalidConfiguration(
                "poll_interval_secs must be at least 1".to_string(),
            ));
        }
        self.calibration.validate()?;

        if self.units.is_empty() {
            return Err(PwmFanError::InvalidConfiguration(
                "no [[units]] configured".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for unit in &self.units {
            unit.validate()?;
            if !names.insert(unit.name.as_str()) {
                return Err(PwmFanError::InvalidConfiguration(format!(
                    "duplicate unit name '{}'",
                    unit.name
                )));
            }
        }

        Ok(())
    }

    /// Delay between two control ticks.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Delay between two start-sequence increments.
    pub fn start_delay(&self) -> Duration {
        Duration::from_millis(self.start_delay_ms)
    }

    /// Look up a unit by name.
    pub fn unit(&self, name: &str) -> Option<&UnitConfig> {
        self.units.iter().find(|u| u.name == name)
    }

    /// Documented example configuration.
    pub fn example() -> &'static str {
        EXAMPLE_CONFIG
    }
}

const EXAMPLE_CONFIG: &str = r#"# pwmfan configuration

# Seconds between two control ticks
poll_interval_secs = 2

# Milliseconds between two drive increments while starting a stopped fan
start_delay_ms = 1000

[calibration]
# Trailing window size used to decide that readings have settled
samples = 15
# Seconds between two samples
interval_secs = 1
# Maximum relative spread of a settled window (0.015 = 1.5%)
precision = 0.015

[[units]]
name = "cpu"
# PWM control device (receives the drive level)
actuator = "/sys/class/hwmon/hwmon1/pwm2"
# Fan rotation speed sensor device
speed_sensor = "/sys/class/hwmon/hwmon1/fan2_input"
# Temperature sensor device
temp_sensor = "/sys/class/hwmon/hwmon1/temp1_input"
# Curve between min_temp and max_temp: "quadratic" or "linear"
algorithm = "quadratic"
# Minimum temperature for the curve (min_stop is applied here)
min_temp = 40000
# Maximum temperature for the curve (max_drive is applied at and above)
max_temp = 80000
# Subtracted from the temperature while the fan is stopped
temp_hysteresis = 2000
# Optional critical temperature; reaching it forces max_drive and exits
# critical_temp = 90000
# Minimum drive level to start fan rotation when stopped
min_start = 90
# Drive level applied at min_temp (must keep the fan rotating)
min_stop = 60
# Minimum fan rotation speed to consider it started
min_speed = 400
# Minimum allowed drive level (applied below min_temp)
min_drive = 0
# Maximum allowed drive level (applied above max_temp)
max_drive = 255
"#;
