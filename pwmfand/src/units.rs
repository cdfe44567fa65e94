//! Fan unit construction from the daemon configuration

use pwmfan_core::{DaemonConfig, Result};
use pwmfan_hardware::{DeviceAccessor, FanUnit, SimulatedFan, SysfsDevice};
use std::sync::Arc;
use tracing::{error, info};

use crate::shutdown::apply_fail_safe;

/// Open every configured unit, in configuration order.
///
/// With `simulate`, each unit is backed by an in-memory fan instead of its
/// sysfs endpoints. If a unit cannot be opened, the units already opened are
/// forced to full speed before the error is returned.
pub async fn open_units(config: &DaemonConfig, simulate: bool) -> Result<Vec<FanUnit>> {
    let sysfs: Arc<dyn DeviceAccessor> = Arc::new(SysfsDevice::new());
    let mut units = Vec::with_capacity(config.units.len());

    for unit_config in &config.units {
        let device: Arc<dyn DeviceAccessor> = if simulate {
            Arc::new(SimulatedFan::new(unit_config))
        } else {
            sysfs.clone()
        };

        info!(
            "Unit '{}': {} algorithm, {}..{} m°C, drive {}..{}",
            unit_config.name,
            unit_config.algorithm,
            unit_config.min_temp,
            unit_config.max_temp,
            unit_config.min_drive,
            unit_config.max_drive
        );

        match FanUnit::open(unit_config.clone(), device).await {
            Ok(unit) => units.push(unit.with_start_delay(config.start_delay())),
            Err(err) => {
                error!("Unit '{}': {}", unit_config.name, err);
                apply_fail_safe(&units).await;
                return Err(err);
            }
        }
    }

    Ok(units)
}
