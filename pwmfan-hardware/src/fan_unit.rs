//! Fan unit - one regulated fan
//!
//! Binds a validated [`UnitConfig`] to a [`DeviceAccessor`] and carries the
//! runtime state of the regulation (the step limiter) together with the
//! curve computed from the configuration.

use pwmfan_core::{
    CalibrationResult, CurveModel, PwmFanError, Result, StepLimiter, UnitConfig, UnitSnapshot,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::device::DeviceAccessor;
use crate::shutdown::ShutdownToken;

/// Default delay between two increments of a start sequence
pub const DEFAULT_START_DELAY: Duration = Duration::from_secs(1);

/// One fan: endpoints, envelope, curve and step limiter.
pub struct FanUnit {
    config: UnitConfig,
    device: Arc<dyn DeviceAccessor>,
    curve: CurveModel,
    limiter: StepLimiter,
    start_delay: Duration,
}

impl std::fmt::Debug for FanUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanUnit")
            .field("config", &self.config)
            .field("curve", &self.curve)
            .field("limiter", &self.limiter)
            .field("start_delay", &self.start_delay)
            .finish_non_exhaustive()
    }
}

impl FanUnit {
    /// Validate the configuration, check the endpoints and enable manual control.
    pub async fn open(config: UnitConfig, device: Arc<dyn DeviceAccessor>) -> Result<Self> {
        config.validate()?;

        debug!("Checking endpoints of unit '{}'", config.name);
        device.check_writable(&config.actuator).await?;
        device.check_readable(&config.speed_sensor).await?;
        device.check_readable(&config.temp_sensor).await?;

        let enable = config.enable_endpoint();
        device.enable(&enable).await?;
        info!(
            "Unit '{}': manual control enabled via {}",
            config.name,
            enable.display()
        );

        Ok(Self {
            curve: CurveModel::from_config(&config),
            config,
            device,
            limiter: StepLimiter::new(),
            start_delay: DEFAULT_START_DELAY,
        })
    }

    /// Set the delay between two increments of a start sequence.
    pub fn with_start_delay(mut self, start_delay: Duration) -> Self {
        self.start_delay = start_delay;
        self
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &UnitConfig {
        &self.config
    }

    pub fn curve(&self) -> &CurveModel {
        &self.curve
    }

    pub fn limiter(&self) -> &StepLimiter {
        &self.limiter
    }

    pub fn limiter_mut(&mut self) -> &mut StepLimiter {
        &mut self.limiter
    }

    /// Replace the envelope with calibrated values and rebuild the curve.
    pub fn apply_calibration(&mut self, result: &CalibrationResult) -> Result<()> {
        let config = self.config.with_calibration(result);
        config.validate()?;
        self.curve = CurveModel::from_config(&config);
        self.config = config;
        Ok(())
    }

    pub async fn read_temperature(&self) -> Result<i64> {
        self.device.read_integer(&self.config.temp_sensor).await
    }

    pub async fn read_fan_speed(&self) -> Result<i64> {
        self.device.read_integer(&self.config.speed_sensor).await
    }

    /// Drive level currently applied, as reported by the actuator.
    pub async fn read_drive(&self) -> Result<i64> {
        self.device.read_integer(&self.config.actuator).await
    }

    pub async fn set_drive(&self, drive: i64) -> Result<()> {
        self.device.write_integer(&self.config.actuator, drive).await
    }

    /// Apply `max_drive`.
    pub async fn set_full_speed(&self) -> Result<()> {
        self.set_drive(self.config.max_drive).await
    }

    /// Read temperature, fan speed and drive level once.
    pub async fn snapshot(&self) -> Result<UnitSnapshot> {
        Ok(UnitSnapshot {
            unit: self.config.name.clone(),
            temperature: Some(self.read_temperature().await?),
            fan_speed: Some(self.read_fan_speed().await?),
            drive: Some(self.read_drive().await?),
        })
    }

    /// Spin up a stopped fan.
    ///
    /// Raises the drive level from `min_start` by one step per start delay
    /// until the fan speed reaches `min_speed`. Fails with
    /// [`PwmFanError::FanStartFailure`] once `max_drive` did not start it.
    pub async fn start_fan(&self) -> Result<i64> {
        let mut drive = self.config.min_start;
        self.set_drive(drive).await?;
        tokio::time::sleep(self.start_delay).await;

        while self.read_fan_speed().await? < self.config.min_speed {
            if drive >= self.config.max_drive {
                warn!(
                    "Unit '{}': fan did not start up to drive level {}",
                    self.config.name, drive
                );
                return Err(PwmFanError::FanStartFailure {
                    max_drive: self.config.max_drive,
                });
            }
            drive += 1;
            self.set_drive(drive).await?;
            tokio::time::sleep(self.start_delay).await;
        }

        debug!("Unit '{}': fan started at drive level {}", self.config.name, drive);
        Ok(drive)
    }

    /// Write 0 and wait until the speed sensor reads 0.
    pub async fn stop_fan(&self, poll: Duration, shutdown: &mut ShutdownToken) -> Result<()> {
        self.set_drive(0).await?;
        while self.read_fan_speed().await? != 0 {
            if shutdown.sleep(poll).await {
                return Err(PwmFanError::Cancelled);
            }
        }
        Ok(())
    }

    /// Leave the fan at `max_drive` and drop the unit.
    pub async fn release(self) -> Result<()> {
        info!(
            "Unit '{}': restoring drive level {}",
            self.config.name, self.config.max_drive
        );
        self.set_full_speed().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{test_unit, SimulatedFan};

    async fn open_sim(fan: SimulatedFan) -> (FanUnit, Arc<SimulatedFan>) {
        let fan = Arc::new(fan);
        let unit = FanUnit::open(test_unit(), fan.clone())
            .await
            .unwrap()
            .with_start_delay(Duration::ZERO);
        (unit, fan)
    }

    #[tokio::test]
    async fn test_open_enables_manual_control() {
        let (unit, fan) = open_sim(SimulatedFan::new(&test_unit())).await;
        assert!(fan.is_enabled());
        assert_eq!(unit.name(), "test");
        assert_eq!(unit.limiter().accumulator(), 0);
    }

    #[tokio::test]
    async fn test_open_rejects_invalid_config() {
        let config = UnitConfig {
            min_temp: 90000,
            ..test_unit()
        };
        let fan = Arc::new(SimulatedFan::new(&config));
        let err = FanUnit::open(config, fan.clone()).await.unwrap_err();
        assert!(matches!(err, PwmFanError::InvalidConfiguration(_)));
        assert!(!fan.is_enabled());
    }

    #[tokio::test]
    async fn test_open_fails_on_unreadable_sensor() {
        let config = test_unit();
        let fan = Arc::new(SimulatedFan::new(&config));
        fan.fail_reads_on(&config.temp_sensor);

        let err = FanUnit::open(config, fan.clone()).await.unwrap_err();
        assert!(matches!(err, PwmFanError::DeviceRead { .. }));
        assert!(!fan.is_enabled());
    }

    #[tokio::test]
    async fn test_start_fan_ramps_from_min_start() {
        // 600 RPM at min_start already meets min_speed
        let (unit, fan) = open_sim(SimulatedFan::new(&test_unit()).with_levels(50, 58)).await;

        let drive = unit.start_fan().await.unwrap();
        assert_eq!(drive, 60);
        assert_eq!(fan.drive_writes(), vec![60]);
    }

    #[tokio::test]
    async fn test_start_fan_increments_until_started() {
        let (unit, fan) = open_sim(SimulatedFan::new(&test_unit()).with_levels(50, 63)).await;

        let drive = unit.start_fan().await.unwrap();
        assert_eq!(drive, 63);
        assert_eq!(fan.drive_writes(), vec![60, 61, 62, 63]);
    }

    #[tokio::test]
    async fn test_start_fan_failure_at_max_drive() {
        let (unit, fan) = open_sim(SimulatedFan::new(&test_unit()).with_levels(300, 300)).await;

        let err = unit.start_fan().await.unwrap_err();
        assert!(matches!(err, PwmFanError::FanStartFailure { max_drive: 255 }));
        assert_eq!(fan.drive(), 255);
    }

    #[tokio::test]
    async fn test_stop_fan() {
        let (unit, fan) = open_sim(SimulatedFan::new(&test_unit()).running_at(200)).await;
        let mut shutdown = ShutdownToken::never();

        unit.stop_fan(Duration::ZERO, &mut shutdown).await.unwrap();
        assert_eq!(fan.fan_speed(), 0);
        assert_eq!(fan.drive(), 0);
    }

    #[tokio::test]
    async fn test_snapshot() {
        let (unit, _fan) = open_sim(
            SimulatedFan::new(&test_unit())
                .running_at(100)
                .with_temperature(51000),
        )
        .await;

        let snapshot = unit.snapshot().await.unwrap();
        assert_eq!(snapshot.unit, "test");
        assert_eq!(snapshot.temperature, Some(51000));
        assert_eq!(snapshot.fan_speed, Some(1000));
        assert_eq!(snapshot.drive, Some(100));
    }

    #[tokio::test]
    async fn test_release_writes_max_drive() {
        let (unit, fan) = open_sim(SimulatedFan::new(&test_unit()).running_at(80)).await;
        unit.release().await.unwrap();
        assert_eq!(fan.drive_writes(), vec![255]);
    }

    #[tokio::test]
    async fn test_apply_calibration_rebuilds_curve() {
        let (mut unit, _fan) = open_sim(SimulatedFan::new(&test_unit())).await;
        assert_eq!(unit.curve().evaluate(30000), 55);

        unit.apply_calibration(&CalibrationResult {
            min_stop: 51,
            min_speed: 510,
            min_temp: 40000,
            min_start: 51,
        })
        .unwrap();

        assert_eq!(unit.config().min_stop, 51);
        assert_eq!(unit.curve().evaluate(40000), 51);
        assert_eq!(unit.curve().evaluate(30000), 0);
    }
}
