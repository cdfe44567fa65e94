//! Command execution handlers

use anyhow::{anyhow, bail, Result};
use pwmfan_core::{
    CalibrationSettings, CurveModel, DaemonConfig, PwmFanError, UnitConfig, UnitSnapshot,
};
use pwmfan_hardware::{
    shutdown_channel, trigger_on_signal, Calibrator, DeviceAccessor, FanUnit, ShutdownToken,
    SimulatedFan, SysfsDevice,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::format::{
    format_calibration, format_curve, format_status, format_success, format_warning, CurvePoint,
};

use super::commands::*;

/// Load and validate the configuration file.
pub fn load_config(path: &Path) -> Result<DaemonConfig> {
    Ok(DaemonConfig::load(path)?)
}

fn find_unit<'a>(config: &'a DaemonConfig, name: &str) -> Result<&'a UnitConfig> {
    config.unit(name).ok_or_else(|| {
        let known: Vec<_> = config.units.iter().map(|u| u.name.as_str()).collect();
        anyhow!("Unknown unit '{}' (configured: {})", name, known.join(", "))
    })
}

fn device_for(unit: &UnitConfig, simulate: bool) -> Arc<dyn DeviceAccessor> {
    if simulate {
        Arc::new(SimulatedFan::new(unit))
    } else {
        Arc::new(SysfsDevice::new())
    }
}

/// Calibration settings from the configuration, with command-line overrides.
pub fn calibration_settings(
    config: &DaemonConfig,
    args: &CalibrateArgs,
) -> Result<CalibrationSettings> {
    let mut settings = config.calibration.clone();
    if let Some(samples) = args.samples {
        settings.samples = samples;
    }
    if let Some(interval) = args.interval {
        settings.interval_secs = interval;
    }
    if let Some(precision) = args.precision {
        settings.precision = precision;
    }
    settings.validate()?;
    Ok(settings)
}

/// Calibrate one unit and return its configuration with the discovered envelope.
///
/// The fan is left at `max_drive` whether calibration succeeds, fails or is
/// cancelled. An envelope that violates the unit invariants is rejected with
/// [`PwmFanError::InvalidConfiguration`].
pub async fn calibrate_unit(
    unit_config: UnitConfig,
    settings: &CalibrationSettings,
    device: Arc<dyn DeviceAccessor>,
    shutdown: &mut ShutdownToken,
) -> pwmfan_core::Result<UnitConfig> {
    let mut unit = FanUnit::open(unit_config, device).await?;
    info!(
        "Calibrating unit '{}' ({} samples, {:?} interval, precision {})",
        unit.name(),
        settings.samples,
        settings.interval(),
        settings.precision
    );

    let calibrated = match Calibrator::new(settings).calibrate(&unit, shutdown).await {
        Ok(result) => match unit.apply_calibration(&result) {
            Ok(()) => Ok(unit.config().clone()),
            Err(e) => {
                warn!("Unit '{}': discarding calibration {:?}", unit.name(), result);
                Err(e)
            }
        },
        Err(e) => Err(e),
    };

    let name = unit.name().to_string();
    if let Err(e) = unit.release().await {
        warn!("Unit '{}': failed to restore full speed: {}", name, e);
    }

    calibrated
}

/// Handle calibrate command
pub async fn handle_calibrate(
    config_path: &Path,
    args: CalibrateArgs,
    format: &OutputFormat,
) -> Result<()> {
    let config = load_config(config_path)?;
    let unit_config = find_unit(&config, &args.unit)?.clone();
    let settings = calibration_settings(&config, &args)?;
    let device = device_for(&unit_config, args.simulate);

    let (trigger, mut shutdown) = shutdown_channel();
    let listener = trigger_on_signal(trigger)?;

    let result = calibrate_unit(unit_config, &settings, device, &mut shutdown).await;
    listener.abort();

    match result {
        Ok(calibrated) => {
            println!("{}", format_calibration(&calibrated, format)?);
            Ok(())
        }
        Err(e) if matches!(e.root(), PwmFanError::Cancelled) => {
            eprintln!(
                "{}",
                format_warning("Calibration cancelled, fan left at full speed")
            );
            std::process::exit(130);
        }
        Err(e) => Err(e.into()),
    }
}

/// Points of a unit's curve over the requested temperature range.
pub fn curve_points(unit: &UnitConfig, args: &CurveArgs) -> Result<Vec<CurvePoint>> {
    if args.step <= 0 {
        bail!("--step must be positive, got {}", args.step);
    }
    unit.validate()?;

    let from = args.from.unwrap_or(unit.min_temp - 5000);
    let to = args.to.unwrap_or(unit.max_temp + 5000);

    Ok(CurveModel::from_config(unit)
        .table(from, to, args.step)
        .into_iter()
        .map(|(temperature, drive)| CurvePoint { temperature, drive })
        .collect())
}

/// Handle curve command
pub fn handle_curve(config_path: &Path, args: CurveArgs, format: &OutputFormat) -> Result<()> {
    let config = load_config(config_path)?;
    let unit = find_unit(&config, &args.unit)?;
    let points = curve_points(unit, &args)?;
    println!("{}", format_curve(&unit.name, &points, format)?);
    Ok(())
}

async fn read_endpoint(device: &dyn DeviceAccessor, endpoint: &Path) -> Option<i64> {
    match device.read_integer(endpoint).await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{}", e);
            None
        }
    }
}

/// Read every unit once without taking control of it.
///
/// Unreadable endpoints are reported as missing readings.
pub async fn read_status(config: &DaemonConfig, simulate: bool) -> Vec<UnitSnapshot> {
    let mut snapshots = Vec::with_capacity(config.units.len());
    for unit in &config.units {
        let device = device_for(unit, simulate);
        snapshots.push(UnitSnapshot {
            unit: unit.name.clone(),
            temperature: read_endpoint(device.as_ref(), &unit.temp_sensor).await,
            fan_speed: read_endpoint(device.as_ref(), &unit.speed_sensor).await,
            drive: read_endpoint(device.as_ref(), &unit.actuator).await,
        });
    }
    snapshots
}

/// Handle status command
pub async fn handle_status(
    config_path: &Path,
    simulate: bool,
    format: &OutputFormat,
) -> Result<()> {
    let config = load_config(config_path)?;
    let snapshots = read_status(&config, simulate).await;
    println!("{}", format_status(&snapshots, format)?);
    Ok(())
}

/// Handle config commands
pub fn handle_config(command: ConfigCommands, config_path: &Path) -> Result<()> {
    match command {
        ConfigCommands::Example => {
            print!("{}", DaemonConfig::example());
        }
        ConfigCommands::Check => {
            let config = load_config(config_path)?;
            let names: Vec<_> = config.units.iter().map(|u| u.name.as_str()).collect();
            println!(
                "{}",
                format_success(&format!(
                    "{} is valid: {} unit(s) ({})",
                    config_path.display(),
                    names.len(),
                    names.join(", ")
                ))
            );
        }
        ConfigCommands::Path => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Generate shell completion script
pub fn generate_completion(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}
