//! Configuration types for pwmfan
//!
//! # Architecture
//!
//! Configuration is split into:
//! - [`DaemonConfig`] - polling, start and calibration settings plus the unit list
//! - [`UnitConfig`] - one fan: its endpoints and envelope parameters
//!
//! Everything lives in a single TOML file, read once at startup.

mod daemon_config;
mod paths;
mod unit;

pub use daemon_config::{CalibrationSettings, DaemonConfig};
pub use paths::{default_config_path, resolve_config_path, CONFIG_ENV_VAR};
pub use unit::{Algorithm, UnitConfig};

#[cfg(test)]
pub(crate) use unit::sample_unit;
