//! Per-fan unit configuration
//!
//! A [`UnitConfig`] binds one PWM actuator to its speed and temperature
//! sensors and carries the envelope parameters the curve and the control
//! loop work with. It is immutable once validated.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{PwmFanError, Result};
use crate::types::CalibrationResult;

/// Curve shape used between `min_temp` and `max_temp`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Straight line from `(min_temp, min_stop)` to `(max_temp, max_drive)`
    Linear,
    /// Parabola with its vertex at `min_temp`
    #[default]
    Quadratic,
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Algorithm::Linear => write!(f, "linear"),
            Algorithm::Quadratic => write!(f, "quadratic"),
        }
    }
}

impl std::str::FromStr for Algorithm {
    type Err = PwmFanError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "linear" => Ok(Algorithm::Linear),
            "quadratic" => Ok(Algorithm::Quadratic),
            other => Err(PwmFanError::InvalidConfiguration(format!(
                "Unknown PWM algorithm '{}' (expected 'linear' or 'quadratic')",
                other
            ))),
        }
    }
}

/// Fully resolved configuration of one fan unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitConfig {
    /// Unit name, used in logs and error reports
    pub name: String,
    /// PWM control endpoint (e.g. `/sys/class/hwmon/hwmon1/pwm2`)
    pub actuator: PathBuf,
    /// Fan rotation speed endpoint (e.g. `.../fan2_input`)
    pub speed_sensor: PathBuf,
    /// Temperature endpoint (e.g. `.../temp1_input`)
    pub temp_sensor: PathBuf,
    /// Manual control switch; defaults to `<actuator>_enable`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable: Option<PathBuf>,

    /// Curve shape
    #[serde(default)]
    pub algorithm: Algorithm,

    /// Temperature at which the curve yields `min_stop`
    pub min_temp: i64,
    /// Temperature at and above which the curve yields `max_drive`
    pub max_temp: i64,
    /// Subtracted from the temperature while the fan is stopped
    #[serde(default)]
    pub temp_hysteresis: i64,
    /// Critical maximum temperature; reaching it is fatal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_temp: Option<i64>,

    /// Drive level the start sequence begins at
    pub min_start: i64,
    /// Drive level applied at `min_temp` (must keep the fan rotating)
    pub min_stop: i64,
    /// Fan speed at which a start sequence considers the fan started
    pub min_speed: i64,
    /// Drive level applied below `min_temp`
    pub min_drive: i64,
    /// Drive level applied above `max_temp`, and the fail-safe level
    pub max_drive: i64,
}

impl UnitConfig {
    /// Check the invariants between the envelope parameters.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| {
            Err(PwmFanError::InvalidConfiguration(format!(
                "unit '{}': {}",
                self.name, msg
            )))
        };

        if self.name.trim().is_empty() {
            return invalid("name must not be empty".to_string());
        }
        if self.min_temp >= self.max_temp {
            return invalid(format!(
                "min_temp ({}) must be below max_temp ({})",
                self.min_temp, self.max_temp
            ));
        }
        if self.min_drive > self.max_drive {
            return invalid(format!(
                "min_drive ({}) must not exceed max_drive ({})",
                self.min_drive, self.max_drive
            ));
        }
        if self.min_stop < self.min_drive || self.min_stop > self.max_drive {
            return invalid(format!(
                "min_stop ({}) must lie within [{}, {}]",
                self.min_stop, self.min_drive, self.max_drive
            ));
        }
        if self.min_start < self.min_drive || self.min_start > self.max_drive {
            return invalid(format!(
                "min_start ({}) must lie within [{}, {}]",
                self.min_start, self.min_drive, self.max_drive
            ));
        }
        if self.temp_hysteresis < 0 {
            return invalid(format!(
                "temp_hysteresis ({}) must not be negative",
                self.temp_hysteresis
            ));
        }
        if self.min_speed < 0 {
            return invalid(format!(
                "min_speed ({}) must not be negative",
                self.min_speed
            ));
        }
        if let Some(critical) = self.critical_temp {
            if critical <= self.min_temp {
                return invalid(format!(
                    "critical_temp ({}) must be above min_temp ({})",
                    critical, self.min_temp
                ));
            }
        }

        Ok(())
    }

    /// Endpoint receiving `1` to switch the actuator to manual control.
    pub fn enable_endpoint(&self) -> PathBuf {
        match &self.enable {
            Some(path) => path.clone(),
            None => {
                let mut os = self.actuator.clone().into_os_string();
                os.push("_enable");
                PathBuf::from(os)
            }
        }
    }

    /// Temperature limit used while calibrating.
    ///
    /// Falls back to `max_temp` when no critical temperature is configured.
    pub fn calibration_limit(&self) -> i64 {
        self.critical_temp.unwrap_or(self.max_temp)
    }

    /// Copy of this configuration with calibrated envelope parameters.
    pub fn with_calibration(&self, result: &CalibrationResult) -> Self {
        Self {
            min_stop: result.min_stop,
            min_speed: result.min_speed,
            min_temp: result.min_temp,
            min_start: result.min_start,
            ..self.clone()
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_unit() -> UnitConfig {
    UnitConfig {
        name: "cpu".to_string(),
        actuator: PathBuf::from("/sys/class/hwmon/hwmon1/pwm2"),
        speed_sensor: PathBuf::from("/sys/class/hwmon/hwmon1/fan2_input"),
        temp_sensor: PathBuf::from("/sys/class/hwmon/hwmon1/temp1_input"),
        enable: None,
        algorithm: Algorithm::Linear,
        min_temp: 40000,
        max_temp: 80000,
        temp_hysteresis: 2000,
        critical_temp: None,
        min_start: 90,
        min_stop: 60,
        min_speed: 400,
        min_drive: 0,
        max_drive: 255,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_unit() {
        assert!(sample_unit().validate().is_ok());
    }

    #[test]
    fn test_min_temp_must_be_below_max_temp() {
        let unit = UnitConfig {
            min_temp: 80000,
            ..sample_unit()
        };
        let err = unit.validate().unwrap_err();
        assert!(matches!(err, PwmFanError::InvalidConfiguration(_)));
        assert!(err.to_string().contains("min_temp"));
    }

    #[test]
    fn test_min_stop_out_of_range() {
        let unit = UnitConfig {
            min_stop: 300,
            ..sample_unit()
        };
        assert!(unit.validate().unwrap_err().to_string().contains("min_stop"));

        let unit = UnitConfig {
            min_drive: 70,
            ..sample_unit()
        };
        assert!(unit.validate().unwrap_err().to_string().contains("min_stop"));
    }

    #[test]
    fn test_min_start_out_of_range() {
        let unit = UnitConfig {
            min_start: 256,
            ..sample_unit()
        };
        assert!(unit
            .validate()
            .unwrap_err()
            .to_string()
            .contains("min_start"));
    }

    #[test]
    fn test_negative_hysteresis_rejected() {
        let unit = UnitConfig {
            temp_hysteresis: -1,
            ..sample_unit()
        };
        assert!(unit.validate().is_err());
    }

    #[test]
    fn test_enable_endpoint_default_and_override() {
        let unit = sample_unit();
        assert_eq!(
            unit.enable_endpoint(),
            PathBuf::from("/sys/class/hwmon/hwmon1/pwm2_enable")
        );

        let unit = UnitConfig {
            enable: Some(PathBuf::from("/tmp/enable")),
            ..sample_unit()
        };
        assert_eq!(unit.enable_endpoint(), PathBuf::from("/tmp/enable"));
    }

    #[test]
    fn test_calibration_limit() {
        assert_eq!(sample_unit().calibration_limit(), 80000);
        let unit = UnitConfig {
            critical_temp: Some(90000),
            ..sample_unit()
        };
        assert_eq!(unit.calibration_limit(), 90000);
    }

    #[test]
    fn test_with_calibration() {
        let result = CalibrationResult {
            min_stop: 51,
            min_speed: 310,
            min_temp: 38000,
            min_start: 70,
        };
        let unit = sample_unit().with_calibration(&result);
        assert_eq!(unit.min_stop, 51);
        assert_eq!(unit.min_speed, 310);
        assert_eq!(unit.min_temp, 38000);
        assert_eq!(unit.min_start, 70);
        assert_eq!(unit.max_temp, 80000);
    }

    #[test]
    fn test_algorithm_parsing() {
        assert_eq!("linear".parse::<Algorithm>().unwrap(), Algorithm::Linear);
        assert_eq!(
            "quadratic".parse::<Algorithm>().unwrap(),
            Algorithm::Quadratic
        );
        assert!("cubic".parse::<Algorithm>().is_err());
        assert_eq!(Algorithm::default(), Algorithm::Quadratic);
        assert_eq!(Algorithm::Linear.to_string(), "linear");
    }
}
