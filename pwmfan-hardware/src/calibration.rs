//! Envelope discovery by sweeping the drive level
//!
//! Two phases, both "settle, then judge":
//!
//! 1. Downward from `max_drive`: at each level, sample fan speed and
//!    temperature until both trailing windows settle, then step down. The
//!    first zero speed marks the stop; `min_stop` is the level above it and
//!    the last settled pair gives `min_speed`/`min_temp`.
//! 2. Upward from `min_stop` with the fan stopped: the first level that
//!    starts the fan, and keeps it spinning at `min_stop` for a full window,
//!    is `min_start`.

use pwmfan_core::{CalibrationResult, CalibrationSettings, PwmFanError, Result, SampleWindow};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::fan_unit::FanUnit;
use crate::shutdown::ShutdownToken;

/// Outcome of sampling one drive level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelOutcome {
    /// Both windows settled; means of the window
    Settled { fan_speed: i64, temperature: i64 },
    /// A sample read zero speed
    Stopped {
        last_running: Option<(i64, i64)>,
        temperature: i64,
    },
}

/// Result of the downward sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopPoint {
    pub min_stop: i64,
    pub min_speed: i64,
    pub min_temp: i64,
    /// `false` when the sweep reached `min_drive` without a stop
    pub stop_observed: bool,
}

/// Sweep-and-settle calibration of one fan unit.
#[derive(Debug, Clone)]
pub struct Calibrator {
    samples: usize,
    interval: Duration,
    precision: f64,
}

impl Calibrator {
    pub fn new(settings: &CalibrationSettings) -> Self {
        Self {
            samples: settings.samples.max(1),
            interval: settings.interval(),
            precision: settings.precision,
        }
    }

    /// Override the delay between samples.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run both phases.
    pub async fn calibrate(
        &self,
        unit: &FanUnit,
        shutdown: &mut ShutdownToken,
    ) -> Result<CalibrationResult> {
        let stop = self.find_min_stop(unit, shutdown).await?;
        let min_start = self.find_min_start(unit, stop.min_stop, shutdown).await?;

        Ok(CalibrationResult {
            min_stop: stop.min_stop,
            min_speed: stop.min_speed,
            min_temp: stop.min_temp,
            min_start,
        })
    }

    /// Downward sweep: `min_stop`, `min_speed` and `min_temp`.
    pub async fn find_min_stop(
        &self,
        unit: &FanUnit,
        shutdown: &mut ShutdownToken,
    ) -> Result<StopPoint> {
        let config = unit.config();
        info!(
            "Unit '{}': downward from {} to fan stop",
            config.name, config.max_drive
        );

        let mut settled: Option<(i64, i64)> = None;
        let mut drive = config.max_drive;

        while drive > config.min_drive {
            unit.set_drive(drive).await?;

            match self.sample_level(unit, shutdown).await? {
                LevelOutcome::Settled {
                    fan_speed,
                    temperature,
                } => {
                    info!("{}\t{}\t{}", drive, fan_speed, temperature);
                    settled = Some((fan_speed, temperature));
                }
                LevelOutcome::Stopped {
                    last_running,
                    temperature,
                } => {
                    info!("Unit '{}': fan stopped at drive level {}", config.name, drive);
                    let (min_speed, min_temp) = settled
                        .or(last_running)
                        .unwrap_or((0, temperature));
                    return Ok(StopPoint {
                        min_stop: drive + 1,
                        min_speed,
                        min_temp,
                        stop_observed: true,
                    });
                }
            }

            drive -= 1;
        }

        warn!(
            "Unit '{}': no fan stop detected, setting min_stop to min_drive + 1, \
             min_speed and min_temp to current ones",
            config.name
        );
        Ok(StopPoint {
            min_stop: config.min_drive + 1,
            min_speed: unit.read_fan_speed().await?,
            min_temp: unit.read_temperature().await?,
            stop_observed: false,
        })
    }

    /// Upward sweep from a stopped fan: `min_start`.
    pub async fn find_min_start(
        &self,
        unit: &FanUnit,
        min_stop: i64,
        shutdown: &mut ShutdownToken,
    ) -> Result<i64> {
        let config = unit.config();
        let limit = config.calibration_limit();

        info!("Unit '{}': stopping fan", config.name);
        unit.stop_fan(self.interval, shutdown).await?;
        self.pause(shutdown).await?;

        info!(
            "Unit '{}': upward from {} to max drive level or fan start",
            config.name, min_stop
        );

        let mut drive = min_stop;
        while drive <= config.max_drive {
            debug!("Trying drive level {}", drive);
            unit.set_drive(drive).await?;
            self.pause(shutdown).await?;

            let temperature = unit.read_temperature().await?;
            if temperature >= limit {
                return Err(PwmFanError::OverTemperature { temperature, limit });
            }

            if unit.read_fan_speed().await? != 0 {
                info!("Fan started at {}, starting validation", drive);
                unit.set_drive(min_stop).await?;

                if self.confirm_running(unit, shutdown).await? {
                    info!("Unit '{}': min_start confirmed at {}", config.name, drive);
                    return Ok(drive);
                }
                info!("Fan stopped again at {}, continuing", min_stop);
            }

            drive += 1;
        }

        Err(PwmFanError::FanStartNotDetected {
            max_drive: config.max_drive,
        })
    }

    /// Sample the current drive level until it settles or the fan stops.
    async fn sample_level(
        &self,
        unit: &FanUnit,
        shutdown: &mut ShutdownToken,
    ) -> Result<LevelOutcome> {
        let limit = unit.config().calibration_limit();
        let mut speeds = SampleWindow::new(self.samples);
        let mut temperatures = SampleWindow::new(self.samples);
        let mut last_running = None;

        loop {
            self.pause(shutdown).await?;

            let fan_speed = unit.read_fan_speed().await?;
            speeds.push(fan_speed);
            let temperature = unit.read_temperature().await?;
            temperatures.push(temperature);

            if temperature >= limit {
                return Err(PwmFanError::OverTemperature { temperature, limit });
            }

            if fan_speed == 0 {
                return Ok(LevelOutcome::Stopped {
                    last_running,
                    temperature,
                });
            }
            last_running = Some((fan_speed, temperature));

            if speeds.is_settled(self.precision) && temperatures.is_settled(self.precision) {
                return Ok(LevelOutcome::Settled {
                    fan_speed: speeds.mean(),
                    temperature: temperatures.mean(),
                });
            }
        }
    }

    /// `samples` consecutive polls must all read a spinning fan.
    async fn confirm_running(&self, unit: &FanUnit, shutdown: &mut ShutdownToken) -> Result<bool> {
        for _ in 0..self.samples {
            self.pause(shutdown).await?;
            if unit.read_fan_speed().await? == 0 {
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn pause(&self, shutdown: &mut ShutdownToken) -> Result<()> {
        if shutdown.sleep(self.interval).await {
            return Err(PwmFanError::Cancelled);
        }
        Ok(())
    }
}
