//! pwmfan CLI
//!
//! Operator tool for pwmfan: calibrates fan units, prints curves and
//! readings, and helps with the configuration file.

use anyhow::Result;
use clap::Parser;
use pwmfan_core::resolve_config_path;
use pwmfanctl::cli::{
    generate_completion, handle_calibrate, handle_config, handle_curve, handle_status, Cli,
    Commands,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    // CLI flag > env var > default
    let config_path = resolve_config_path(cli.config.clone());
    if cli.verbose {
        eprintln!("Configuration file: {}", config_path.display());
        eprintln!("Output format: {:?}", cli.format);
    }

    let result = match cli.command {
        Commands::Calibrate(args) => handle_calibrate(&config_path, args, &cli.format).await,
        Commands::Curve(args) => handle_curve(&config_path, args, &cli.format),
        Commands::Status { simulate } => handle_status(&config_path, simulate, &cli.format).await,
        Commands::Config { command } => handle_config(command, &config_path),
        Commands::Completion { shell } => {
            generate_completion(shell);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        if cli.verbose {
            eprintln!("Error details: {:?}", e);
        }
        std::process::exit(1);
    }

    Ok(())
}

/// Log to stderr so reports on stdout stay machine-readable
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
