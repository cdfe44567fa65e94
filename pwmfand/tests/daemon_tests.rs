//! Daemon integration tests against simulated fans
//!
//! Each test writes a configuration file, loads it the way the daemon does
//! and regulates `--simulate` units.

use pwmfan_core::{DaemonConfig, PwmFanError};
use pwmfan_hardware::shutdown_channel;
use pwmfand::{open_units, ControlLoop};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

fn unit_block(name: &str, index: u32, extra: &str) -> String {
    format!(
        r#"
[[units]]
name = "{name}"
actuator = "/sim/hwmon0/pwm{index}"
speed_sensor = "/sim/hwmon0/fan{index}_input"
temp_sensor = "/sim/hwmon0/temp{index}_input"
algorithm = "linear"
min_temp = 30000
max_temp = 70000
min_start = 70
min_stop = 60
min_speed = 600
min_drive = 0
max_drive = 255
{extra}
"#
    )
}

fn write_config(dir: &TempDir, units: &[String]) -> PathBuf {
    let mut content = String::from("poll_interval_secs = 1\nstart_delay_ms = 0\n");
    for unit in units {
        content.push_str(unit);
    }
    let path = dir.path().join("config.toml");
    std::fs::write(&path, content).unwrap();
    path
}

#[tokio::test]
async fn test_regulates_until_shutdown() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        &[unit_block("cpu", 1, ""), unit_block("case", 2, "")],
    );
    let config = DaemonConfig::load(&path).unwrap();
    let units = open_units(&config, true).await.unwrap();

    let (trigger, mut shutdown) = shutdown_channel();
    let mut control = ControlLoop::new(units, Duration::from_millis(1));
    let mut history = Vec::new();

    control
        .run(&mut shutdown, |snapshots| {
            history.push(snapshots.to_vec());
            if history.len() == 20 {
                trigger.trigger();
            }
        })
        .await
        .unwrap();

    assert_eq!(history.len(), 20);
    for tick in &history {
        let names: Vec<_> = tick.iter().map(|s| s.unit.as_str()).collect();
        assert_eq!(names, vec!["cpu", "case"]);
    }

    // 40 °C on a 30-70 °C curve: the stopped fans end up started and running
    let last = &history[19];
    for snapshot in last {
        let drive = snapshot.drive.unwrap();
        assert!((60..=255).contains(&drive), "drive {drive} out of range");
    }

    control.release().await.unwrap();
}

#[tokio::test]
async fn test_critical_temperature_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        &[
            unit_block("cpu", 1, ""),
            unit_block("case", 2, "critical_temp = 40000"),
        ],
    );
    let config = DaemonConfig::load(&path).unwrap();
    let units = open_units(&config, true).await.unwrap();

    let mut control = ControlLoop::new(units, Duration::ZERO);
    let err = control.tick().await.unwrap_err();

    assert!(matches!(
        err.root(),
        PwmFanError::OverTemperature {
            temperature: 40000,
            limit: 40000
        }
    ));
    assert!(err.to_string().starts_with("Fan unit 'case' failed"));
}

#[tokio::test]
async fn test_invalid_unit_rejected_at_load() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, &[unit_block("cpu", 1, "").replace("70000", "20000")]);

    let err = DaemonConfig::load(&path).unwrap_err();
    assert!(matches!(err, PwmFanError::InvalidConfiguration(_)));
}

#[tokio::test]
async fn test_missing_config_file() {
    let dir = TempDir::new().unwrap();
    let err = DaemonConfig::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, PwmFanError::Config(_)));
}
