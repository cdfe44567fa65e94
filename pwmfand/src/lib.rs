//! pwmfand
//!
//! Daemon side of pwmfan: opens the configured fan units and regulates them
//! until a termination signal arrives or a unit fails.
//!
//! Public API:
//! - `control_loop::ControlLoop` - per-tick regulation of every unit
//! - `control_loop::regulate` - one update of one unit
//! - `units::open_units` - unit construction from a `DaemonConfig`
//! - `shutdown` - signal listener and the full-speed fail-safe

pub mod control_loop;
pub mod shutdown;
pub mod units;

pub use control_loop::{regulate, ControlLoop};
pub use shutdown::{apply_fail_safe, spawn_signal_listener};
pub use units::open_units;
