//! pwmfand
//!
//! Temperature-driven PWM fan regulation daemon.
//!
//! Every `poll_interval_secs` each configured unit reads its temperature and
//! fan speed, evaluates its curve and writes the rate-limited drive level.
//! On SIGINT/SIGTERM the current tick completes, every fan is left at full
//! speed and the daemon exits. On any fatal error every fan is forced to full
//! speed and the daemon exits with status 1.

use anyhow::Result;
use clap::Parser;
use pwmfan_core::{resolve_config_path, DaemonConfig};
use pwmfan_hardware::shutdown_channel;
use pwmfand::{open_units, spawn_signal_listener, ControlLoop};
use std::path::PathBuf;
use tracing::{error, info};

/// pwmfan regulation daemon
#[derive(Parser, Debug)]
#[command(name = "pwmfand")]
#[command(version, about = "Temperature-driven PWM fan regulation daemon", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Regulate simulated fans instead of the configured sysfs endpoints
    #[arg(long)]
    simulate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(args.verbose);

    info!("pwmfand starting...");

    // CLI flag > env var > default
    let config_path = resolve_config_path(args.config);
    info!("Reading parameters from {}", config_path.display());

    let config = match DaemonConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    info!(
        "Configuration loaded: {} unit(s), poll interval {}s",
        config.units.len(),
        config.poll_interval_secs
    );

    if args.simulate {
        info!("Simulation mode: no sysfs endpoint is touched");
    }

    let units = match open_units(&config, args.simulate).await {
        Ok(units) => units,
        Err(e) => {
            error!("Failed to set up fan units: {}", e);
            std::process::exit(1);
        }
    };

    let (trigger, mut shutdown) = shutdown_channel();
    spawn_signal_listener(trigger)?;

    let mut control = ControlLoop::new(units, config.poll_interval());
    let outcome = control
        .run(&mut shutdown, |snapshots| {
            for snapshot in snapshots {
                info!("[{}] {}", snapshot.unit, snapshot);
            }
        })
        .await;

    if let Err(e) = outcome {
        // Every unit has already been forced to full speed
        error!("Regulation stopped: {}", e);
        std::process::exit(1);
    }

    control.release().await?;
    info!("Leaving.");
    Ok(())
}

/// Initialize tracing subscriber for logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
