//! Simulated fan for tests and `--simulate` runs
//!
//! Models one fan behind the endpoints of a [`UnitConfig`]: the speed sensor
//! reports 10 RPM per drive level while the fan spins and 0 otherwise. A
//! spinning fan stalls at or below `stall_level`; a stopped fan only starts
//! at or above `start_level`. Temperatures come from a script whose last
//! value repeats; checking an endpoint does not advance the script.

use async_trait::async_trait;
use pwmfan_core::{PwmFanError, Result, UnitConfig};
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const RPM_PER_LEVEL: i64 = 10;

#[derive(Debug)]
struct SimState {
    drive: i64,
    spinning: bool,
    enabled: bool,
    temperatures: VecDeque<i64>,
    writes: Vec<(PathBuf, i64)>,
    failing_reads: HashSet<PathBuf>,
    failing_writes: HashSet<PathBuf>,
}

/// In-memory [`DeviceAccessor`](crate::DeviceAccessor) modelling one fan.
#[derive(Debug)]
pub struct SimulatedFan {
    actuator: PathBuf,
    speed_sensor: PathBuf,
    temp_sensor: PathBuf,
    enable: PathBuf,
    stall_level: i64,
    start_level: i64,
    state: Mutex<SimState>,
}

impl SimulatedFan {
    /// Fan behind the endpoints of `unit`, stopped, at 40 °C.
    ///
    /// Defaults: stalls at or below drive level 50, starts above it,
    /// 10 RPM per drive level.
    pub fn new(unit: &UnitConfig) -> Self {
        Self {
            actuator: unit.actuator.clone(),
            speed_sensor: unit.speed_sensor.clone(),
            temp_sensor: unit.temp_sensor.clone(),
            enable: unit.enable_endpoint(),
            stall_level: 50,
            start_level: 51,
            state: Mutex::new(SimState {
                drive: 0,
                spinning: false,
                enabled: false,
                temperatures: VecDeque::from(vec![40000]),
                writes: Vec::new(),
                failing_reads: HashSet::new(),
                failing_writes: HashSet::new(),
            }),
        }
    }

    /// Stall at or below `stall_level`; start at or above `start_level`.
    pub fn with_levels(mut self, stall_level: i64, start_level: i64) -> Self {
        self.stall_level = stall_level;
        self.start_level = start_level.max(stall_level + 1);
        self
    }

    /// Constant temperature.
    pub fn with_temperature(self, temperature: i64) -> Self {
        self.with_temperature_script(vec![temperature])
    }

    /// Temperatures returned by successive reads; the last one repeats.
    pub fn with_temperature_script(self, temperatures: Vec<i64>) -> Self {
        self.lock().temperatures = temperatures.into();
        self
    }

    /// Start with the fan already spinning at `drive`.
    pub fn running_at(self, drive: i64) -> Self {
        {
            let mut state = self.lock();
            state.drive = drive;
            state.spinning = drive > self.stall_level;
        }
        self
    }

    /// Make every read of `endpoint` fail.
    pub fn fail_reads_on(&self, endpoint: &Path) {
        self.lock().failing_reads.insert(endpoint.to_path_buf());
    }

    /// Make every write to `endpoint` fail.
    pub fn fail_writes_on(&self, endpoint: &Path) {
        self.lock().failing_writes.insert(endpoint.to_path_buf());
    }

    /// Current drive level.
    pub fn drive(&self) -> i64 {
        self.lock().drive
    }

    /// Whether manual control has been enabled.
    pub fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    /// Current fan speed.
    pub fn fan_speed(&self) -> i64 {
        let state = self.lock();
        self.speed_of(&state)
    }

    /// Every successful write, in order.
    pub fn writes(&self) -> Vec<(PathBuf, i64)> {
        self.lock().writes.clone()
    }

    /// Values written to the actuator, in order.
    pub fn drive_writes(&self) -> Vec<i64> {
        self.lock()
            .writes
            .iter()
            .filter(|(path, _)| *path == self.actuator)
            .map(|(_, value)| *value)
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        // A panicking test thread must not hide the state from the others
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn speed_of(&self, state: &SimState) -> i64 {
        if state.spinning {
            state.drive * RPM_PER_LEVEL
        } else {
            0
        }
    }

    fn next_temperature(state: &mut SimState) -> i64 {
        if state.temperatures.len() > 1 {
            state.temperatures.pop_front().unwrap_or_default()
        } else {
            state.temperatures.front().copied().unwrap_or_default()
        }
    }
}

#[async_trait]
impl crate::DeviceAccessor for SimulatedFan {
    async fn read_integer(&self, endpoint: &Path) -> Result<i64> {
        let mut state = self.lock();

        if state.failing_reads.contains(endpoint) {
            return Err(PwmFanError::DeviceRead {
                endpoint: endpoint.to_path_buf(),
                reason: "simulated read failure".to_string(),
            });
        }

        if endpoint == self.actuator {
            Ok(state.drive)
        } else if endpoint == self.speed_sensor {
            Ok(self.speed_of(&state))
        } else if endpoint == self.temp_sensor {
            Ok(Self::next_temperature(&mut state))
        } else if endpoint == self.enable {
            Ok(i64::from(state.enabled))
        } else {
            Err(PwmFanError::DeviceRead {
                endpoint: endpoint.to_path_buf(),
                reason: "no such simulated endpoint".to_string(),
            })
        }
    }

    async fn write_integer(&self, endpoint: &Path, value: i64) -> Result<()> {
        let mut state = self.lock();

        if state.failing_writes.contains(endpoint) {
            return Err(PwmFanError::DeviceWrite {
                endpoint: endpoint.to_path_buf(),
                value,
                reason: "simulated write failure".to_string(),
            });
        }

        if endpoint == self.actuator {
            state.drive = value;
            if value <= self.stall_level {
                state.spinning = false;
            } else if value >= self.start_level {
                state.spinning = true;
            }
        } else if endpoint == self.enable {
            state.enabled = value == 1;
        } else {
            return Err(PwmFanError::DeviceWrite {
                endpoint: endpoint.to_path_buf(),
                value,
                reason: "endpoint is read-only".to_string(),
            });
        }

        state.writes.push((endpoint.to_path_buf(), value));
        Ok(())
    }

    async fn check_readable(&self, endpoint: &Path) -> Result<()> {
        let state = self.lock();
        let known = [
            &self.actuator,
            &self.speed_sensor,
            &self.temp_sensor,
            &self.enable,
        ]
        .into_iter()
        .any(|known| known == endpoint);

        if known && !state.failing_reads.contains(endpoint) {
            Ok(())
        } else {
            Err(PwmFanError::DeviceRead {
                endpoint: endpoint.to_path_buf(),
                reason: "simulated endpoint unreadable".to_string(),
            })
        }
    }

    async fn check_writable(&self, endpoint: &Path) -> Result<()> {
        if endpoint == self.actuator || endpoint == self.enable {
            Ok(())
        } else {
            Err(PwmFanError::DeviceWrite {
                endpoint: endpoint.to_path_buf(),
                value: 0,
                reason: "endpoint is read-only".to_string(),
            })
        }
    }
}

#[cfg(test)]
pub(crate) fn test_unit() -> UnitConfig {
    UnitConfig {
        name: "test".to_string(),
        actuator: PathBuf::from("/sim/pwm1"),
        speed_sensor: PathBuf::from("/sim/fan1_input"),
        temp_sensor: PathBuf::from("/sim/temp1_input"),
        enable: None,
        algorithm: pwmfan_core::Algorithm::Linear,
        min_temp: 30000,
        max_temp: 80000,
        temp_hysteresis: 0,
        critical_temp: None,
        min_start: 60,
        min_stop: 55,
        min_speed: 500,
        min_drive: 0,
        max_drive: 255,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DeviceAccessor;

    #[tokio::test]
    async fn test_speed_follows_drive() {
        let unit = test_unit();
        let fan = SimulatedFan::new(&unit);

        assert_eq!(fan.read_integer(&unit.speed_sensor).await.unwrap(), 0);
        fan.write_integer(&unit.actuator, 100).await.unwrap();
        assert_eq!(fan.read_integer(&unit.speed_sensor).await.unwrap(), 1000);
        fan.write_integer(&unit.actuator, 50).await.unwrap();
        assert_eq!(fan.read_integer(&unit.speed_sensor).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_start_hysteresis() {
        let unit = test_unit();
        let fan = SimulatedFan::new(&unit).with_levels(50, 60);

        fan.write_integer(&unit.actuator, 55).await.unwrap();
        assert_eq!(fan.fan_speed(), 0);
        fan.write_integer(&unit.actuator, 60).await.unwrap();
        assert_eq!(fan.fan_speed(), 600);
        // Keeps spinning between stall and start levels
        fan.write_integer(&unit.actuator, 55).await.unwrap();
        assert_eq!(fan.fan_speed(), 550);
    }

    #[tokio::test]
    async fn test_temperature_script_repeats_last() {
        let unit = test_unit();
        let fan = SimulatedFan::new(&unit).with_temperature_script(vec![1, 2]);

        assert_eq!(fan.read_integer(&unit.temp_sensor).await.unwrap(), 1);
        assert_eq!(fan.read_integer(&unit.temp_sensor).await.unwrap(), 2);
        assert_eq!(fan.read_integer(&unit.temp_sensor).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let unit = test_unit();
        let fan = SimulatedFan::new(&unit);
        fan.fail_reads_on(&unit.temp_sensor);
        fan.fail_writes_on(&unit.actuator);

        assert!(matches!(
            fan.read_integer(&unit.temp_sensor).await,
            Err(PwmFanError::DeviceRead { .. })
        ));
        assert!(matches!(
            fan.write_integer(&unit.actuator, 10).await,
            Err(PwmFanError::DeviceWrite { .. })
        ));
        assert!(fan.writes().is_empty());
    }

    #[tokio::test]
    async fn test_sensors_are_read_only() {
        let unit = test_unit();
        let fan = SimulatedFan::new(&unit);
        assert!(fan.write_integer(&unit.speed_sensor, 1).await.is_err());
        assert!(fan.check_writable(&unit.temp_sensor).await.is_err());
        assert!(fan.check_writable(&unit.actuator).await.is_ok());
    }

    #[tokio::test]
    async fn test_enable_and_write_log() {
        let unit = test_unit();
        let fan = SimulatedFan::new(&unit).running_at(120);
        assert_eq!(fan.fan_speed(), 1200);

        fan.enable(&unit.enable_endpoint()).await.unwrap();
        fan.write_integer(&unit.actuator, 90).await.unwrap();

        assert!(fan.is_enabled());
        assert_eq!(fan.drive(), 90);
        assert_eq!(fan.drive_writes(), vec![90]);
        assert_eq!(fan.writes().len(), 2);
    }
}
