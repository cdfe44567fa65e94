//! Signal handling and the fail-safe applied on fatal errors
//!
//! The signal listener turns SIGINT/SIGTERM into a shutdown request; the
//! control loop finishes its current tick and returns. A second signal
//! exits at once, leaving the fans where they are.

use pwmfan_hardware::{FanUnit, ShutdownTrigger, TerminationSignals};
use std::io;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Force every unit to `max_drive`.
///
/// Failures are logged and skipped so one broken actuator does not keep the
/// others under-driven.
pub async fn apply_fail_safe(units: &[FanUnit]) {
    info!("Restoring fan max speed");
    for unit in units {
        if let Err(e) = unit.set_full_speed().await {
            warn!("Unit '{}': failed to set full speed: {}", unit.name(), e);
        }
    }
}

/// Listen for termination signals in the background.
///
/// The first SIGINT or SIGTERM fires `trigger`; a second one exits at once.
pub fn spawn_signal_listener(trigger: ShutdownTrigger) -> io::Result<JoinHandle<()>> {
    let mut signals = TerminationSignals::install()?;
    Ok(tokio::spawn(async move {
        let name = signals.recv().await;
        info!("Received {}, shutting down gracefully...", name);
        trigger.trigger();

        let name = signals.recv().await;
        warn!("Second {}, exiting immediately", name);
        std::process::exit(0);
    }))
}
