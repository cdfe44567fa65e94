//! Test helpers: a two-unit configuration backed by non-existent sysfs paths

use pwmfan_core::{DaemonConfig, UnitConfig};

pub const SAMPLE_CONFIG: &str = r#"
poll_interval_secs = 2

[[units]]
name = "cpu"
actuator = "/sim/hwmon1/pwm2"
speed_sensor = "/sim/hwmon1/fan2_input"
temp_sensor = "/sim/hwmon0/temp1_input"
min_temp = 45000
max_temp = 70000
temp_hysteresis = 2000
min_start = 110
min_stop = 90
min_speed = 600
min_drive = 0
max_drive = 255

[[units]]
name = "case"
actuator = "/sim/hwmon1/pwm3"
speed_sensor = "/sim/hwmon1/fan3_input"
temp_sensor = "/sim/hwmon0/temp2_input"
algorithm = "linear"
min_temp = 35000
max_temp = 60000
min_start = 90
min_stop = 70
min_speed = 300
min_drive = 0
max_drive = 200
"#;

/// Parsed and validated [`SAMPLE_CONFIG`].
pub fn sample_config() -> DaemonConfig {
    let config = DaemonConfig::from_toml(SAMPLE_CONFIG).unwrap();
    config.validate().unwrap();
    config
}

/// One unit of [`SAMPLE_CONFIG`].
pub fn unit_named(name: &str) -> UnitConfig {
    sample_config().unit(name).unwrap().clone()
}
