//! pwmfan CLI library
//!
//! Calibration, curve inspection, status readout and configuration helpers
//! behind the `pwmfanctl` binary.

// Internal CLI implementation - not part of public API
#[doc(hidden)]
pub mod cli;

/// Report formatting (table, JSON, TOML).
pub mod format;

#[cfg(test)]
pub mod test_utils;
