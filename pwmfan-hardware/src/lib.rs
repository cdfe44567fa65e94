//! pwmfan-hardware
//!
//! Device access and per-fan logic shared by the daemon and the CLI.
//!
//! Public API:
//! - `device::DeviceAccessor` - integer read/write seam over sysfs endpoints
//! - `device::SysfsDevice` - the real hwmon implementation
//! - `fan_unit::FanUnit` - one regulated fan: endpoints, envelope, curve, limiter
//! - `calibration::Calibrator` - envelope discovery by sweeping the drive level
//! - `shutdown` - cooperative cancellation and SIGINT/SIGTERM listening
//! - `sim::SimulatedFan` - in-memory fan for tests and dry runs

pub mod calibration;
pub mod device;
pub mod fan_unit;
pub mod shutdown;
pub mod sim;

pub use calibration::{Calibrator, LevelOutcome, StopPoint};
pub use device::{DeviceAccessor, SysfsDevice};
pub use fan_unit::{FanUnit, DEFAULT_START_DELAY};
pub use shutdown::{
    shutdown_channel, trigger_on_signal, ShutdownToken, ShutdownTrigger, TerminationSignals,
};
pub use sim::SimulatedFan;
