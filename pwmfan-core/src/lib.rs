//! pwmfan Core Library
//!
//! Curve evaluation, step limiting, sample windows and configuration for the
//! pwmfan regulation daemon and its calibration CLI. Nothing in this crate
//! performs device I/O.

pub mod config;
pub mod curve;
pub mod error;
pub mod filter;
pub mod types;
pub mod window;

// Re-export commonly used types
pub use config::{
    default_config_path, resolve_config_path, Algorithm, CalibrationSettings, DaemonConfig,
    UnitConfig,
};
pub use curve::{CurveKind, CurveModel};
pub use error::*;
pub use filter::StepLimiter;
pub use types::*;
pub use window::SampleWindow;
