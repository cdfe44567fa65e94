//! Output formatting for the CLI
//!
//! Every report is available as a colored table, JSON, or TOML.

use anyhow::Result;
use colored::*;
use pwmfan_core::{UnitConfig, UnitSnapshot};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty table output
    Table,
    /// JSON output
    Json,
    /// TOML output (a `[[units]]` fragment for calibration)
    Toml,
}

/// Envelope of a calibrated unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalibrationReport {
    pub unit: String,
    pub min_temp: i64,
    pub max_temp: i64,
    pub min_start: i64,
    pub min_stop: i64,
    pub min_speed: i64,
    pub min_drive: i64,
    pub max_drive: i64,
}

impl From<&UnitConfig> for CalibrationReport {
    fn from(config: &UnitConfig) -> Self {
        Self {
            unit: config.name.clone(),
            min_temp: config.min_temp,
            max_temp: config.max_temp,
            min_start: config.min_start,
            min_stop: config.min_stop,
            min_speed: config.min_speed,
            min_drive: config.min_drive,
            max_drive: config.max_drive,
        }
    }
}

#[derive(Serialize)]
struct UnitsFragment<'a> {
    units: &'a [UnitConfig],
}

/// Format the envelope of a calibrated unit.
///
/// TOML output is the full `[[units]]` entry, ready to replace the one in the
/// configuration file.
pub fn format_calibration(calibrated: &UnitConfig, format: &OutputFormat) -> Result<String> {
    let report = CalibrationReport::from(calibrated);
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&report)?),
        OutputFormat::Toml => Ok(toml::to_string_pretty(&UnitsFragment {
            units: std::slice::from_ref(calibrated),
        })?),
        OutputFormat::Table => {
            #[derive(Tabled)]
            struct ParameterRow {
                #[tabled(rename = "Parameter")]
                name: String,
                #[tabled(rename = "Value")]
                value: String,
            }

            let rows: Vec<ParameterRow> = [
                ("min_temp", report.min_temp),
                ("max_temp", report.max_temp),
                ("min_start", report.min_start),
                ("min_stop", report.min_stop),
                ("min_speed", report.min_speed),
                ("min_drive", report.min_drive),
                ("max_drive", report.max_drive),
            ]
            .into_iter()
            .map(|(name, value)| ParameterRow {
                name: name.cyan().to_string(),
                value: value.to_string(),
            })
            .collect();

            let table = Table::new(rows).with(Style::rounded()).to_string();
            Ok(format!(
                "{} {}\n{}",
                "Calibration report:".bold(),
                report.unit.yellow(),
                table
            ))
        }
    }
}

/// One point of a drive curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Tabled)]
pub struct CurvePoint {
    #[tabled(rename = "Temperature")]
    pub temperature: i64,
    #[tabled(rename = "Drive")]
    pub drive: i64,
}

#[derive(Serialize)]
struct CurveDump<'a> {
    unit: &'a str,
    points: &'a [CurvePoint],
}

/// Format the drive levels a curve yields over a temperature range.
pub fn format_curve(unit: &str, points: &[CurvePoint], format: &OutputFormat) -> Result<String> {
    let dump = CurveDump { unit, points };
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&dump)?),
        OutputFormat::Toml => Ok(toml::to_string_pretty(&dump)?),
        OutputFormat::Table => {
            let table = Table::new(points).with(Style::rounded()).to_string();
            Ok(format!("{} {}\n{}", "Curve:".bold(), unit.yellow(), table))
        }
    }
}

#[derive(Serialize)]
struct StatusDump<'a> {
    units: &'a [UnitSnapshot],
}

/// Format one reading per unit.
pub fn format_status(snapshots: &[UnitSnapshot], format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(snapshots)?),
        OutputFormat::Toml => Ok(toml::to_string_pretty(&StatusDump { units: snapshots })?),
        OutputFormat::Table => {
            #[derive(Tabled)]
            struct StatusRow {
                #[tabled(rename = "Unit")]
                unit: String,
                #[tabled(rename = "Temperature")]
                temperature: String,
                #[tabled(rename = "Fan speed")]
                fan_speed: String,
                #[tabled(rename = "Drive")]
                drive: String,
            }

            fn reading(value: Option<i64>) -> String {
                value
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "?".dimmed().to_string())
            }

            let rows: Vec<StatusRow> = snapshots
                .iter()
                .map(|s| StatusRow {
                    unit: s.unit.cyan().to_string(),
                    temperature: reading(s.temperature),
                    fan_speed: match s.fan_speed {
                        Some(0) => "0".red().to_string(),
                        Some(speed) => speed.to_string().green().to_string(),
                        None => reading(None),
                    },
                    drive: reading(s.drive),
                })
                .collect();

            let table = Table::new(rows).with(Style::rounded()).to_string();
            Ok(format!("{}\n{}", "Fan Status:".bold(), table))
        }
    }
}

/// Format success message
pub fn format_success(message: &str) -> String {
    format!("{} {}", "✓".green().bold(), message)
}

/// Format warning message
pub fn format_warning(message: &str) -> String {
    format!("{} {}", "!".yellow().bold(), message)
}
