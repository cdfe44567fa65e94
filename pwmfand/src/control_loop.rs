//! Per-tick regulation of every fan unit
//!
//! One tick reads each unit's sensors, evaluates its curve, rate-limits the
//! result and writes the actuator. Units are processed in order; the first
//! fatal error aborts the tick, forces every unit to full speed and is
//! returned with the offending unit and its last readings attached.

use pwmfan_core::{PwmFanError, Result, UnitSnapshot};
use pwmfan_hardware::{FanUnit, ShutdownToken};
use std::time::Duration;
use tracing::{debug, error, info};

use crate::shutdown::apply_fail_safe;

/// Regulate one unit once.
///
/// Returns the readings taken and the drive level applied. On failure the
/// error is attributed to the unit with whatever was read before it failed.
pub async fn regulate(unit: &mut FanUnit) -> Result<UnitSnapshot> {
    let mut last = UnitSnapshot::empty(unit.name());
    match update(unit, &mut last).await {
        Ok(()) => Ok(last),
        Err(err) => Err(err.for_unit(last)),
    }
}

async fn update(unit: &mut FanUnit, last: &mut UnitSnapshot) -> Result<()> {
    let temperature = unit.read_temperature().await?;
    last.temperature = Some(temperature);

    if let Some(limit) = unit.config().critical_temp {
        if temperature >= limit {
            return Err(PwmFanError::OverTemperature { temperature, limit });
        }
    }

    let current = unit.read_drive().await?;
    last.drive = Some(current);
    let fan_speed = unit.read_fan_speed().await?;
    last.fan_speed = Some(fan_speed);

    let stopped = fan_speed == 0;
    let adjusted = if stopped {
        temperature - unit.config().temp_hysteresis
    } else {
        temperature
    };

    let computed = unit.curve().evaluate(adjusted);
    let min_stop = unit.config().min_stop;
    let limiter = unit.limiter_mut();
    let mut filtered = limiter.apply(current, computed);
    debug!("Computed: {}, Filtered: {}", computed, filtered);

    // Stalled fan below the stop level stays off; the skipped step is made up later
    if stopped && filtered < min_stop {
        filtered = 0;
        limiter.double();
        debug!("Zeroed, step now {}", limiter.accumulator());
    }

    if filtered != 0 && stopped {
        info!("Unit '{}': starting fan", unit.name());
        unit.start_fan().await?;
    }

    unit.set_drive(filtered).await?;
    last.drive = Some(filtered);
    Ok(())
}

/// Drives a set of fan units until shutdown.
#[derive(Debug)]
pub struct ControlLoop {
    units: Vec<FanUnit>,
    poll_interval: Duration,
}

impl ControlLoop {
    pub fn new(units: Vec<FanUnit>, poll_interval: Duration) -> Self {
        Self {
            units,
            poll_interval,
        }
    }

    /// Regulate every unit once, in order.
    ///
    /// On the first failure every unit is forced to `max_drive` before the
    /// error is returned.
    pub async fn tick(&mut self) -> Result<Vec<UnitSnapshot>> {
        let mut snapshots = Vec::with_capacity(self.units.len());

        for index in 0..self.units.len() {
            match regulate(&mut self.units[index]).await {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(err) => {
                    error!("Got error during update: {}", err);
                    apply_fail_safe(&self.units).await;
                    return Err(err);
                }
            }
        }

        Ok(snapshots)
    }

    /// Tick until `shutdown` is requested or a unit fails.
    ///
    /// `on_tick` receives the snapshots of each completed tick. A shutdown
    /// request never interrupts a tick; it is observed during the delay
    /// between two ticks.
    pub async fn run<F>(&mut self, shutdown: &mut ShutdownToken, mut on_tick: F) -> Result<()>
    where
        F: FnMut(&[UnitSnapshot]),
    {
        info!(
            "Regulating {} unit(s) every {:?}",
            self.units.len(),
            self.poll_interval
        );

        loop {
            let snapshots = self.tick().await?;
            on_tick(&snapshots);

            if shutdown.sleep(self.poll_interval).await {
                info!("Shutdown requested, leaving control loop");
                return Ok(());
            }
        }
    }

    /// Release every unit at full speed.
    ///
    /// All units are released even if one fails; the first error is returned.
    pub async fn release(self) -> Result<()> {
        let mut first_error = None;
        for unit in self.units {
            let name = unit.name().to_string();
            if let Err(err) = unit.release().await {
                error!("Unit '{}': failed to restore full speed: {}", name, err);
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
