//! Binary entry point for geolog.
//!
//! This binary provides the CLI interface for the geolog check-in service.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

mod commands;

use clap::{Parser, Subcommand};
use geolog::config::GeologConfig;
use geolog::observability::{self, InitOptions};
use std::path::PathBuf;
use std::process::ExitCode;

use commands::{cmd_config, cmd_init_db, cmd_serve};

/// Geolog - record and query geolocation check-ins over HTTP.
#[derive(Parser)]
#[command(name = "geolog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server.
    Serve {
        /// Port to listen on (overrides config).
        #[arg(short, long)]
        port: Option<u16>,

        /// Database file (overrides config).
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Create the database and the `log` table, then exit.
    InitDb {
        /// Database file (overrides config).
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Show configuration.
    Config {
        /// Show current configuration.
        #[arg(short, long)]
        show: bool,
    },
}

/// Main entry point.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // A missing .env file is not an error.
    let _ = dotenvy::dotenv();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config.with_env_overrides(),
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let telemetry = match observability::init_from_config(
        &config.observability,
        InitOptions {
            verbose: cli.verbose,
        },
    ) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Failed to initialize observability: {e}");
            return ExitCode::FAILURE;
        },
    };
    tracing::debug!(
        metrics_enabled = telemetry.metrics_enabled(),
        config_sources = config.config_sources.len(),
        "Observability initialized"
    );

    let result = run_command(cli.command, config).await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
async fn run_command(
    command: Commands,
    config: GeologConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Serve { port, database } => cmd_serve(config, port, database).await,
        Commands::InitDb { database } => cmd_init_db(&config, database),
        Commands::Config { show } => cmd_config(&config, show),
    }
}

/// Loads configuration.
fn load_config(path: Option<&str>) -> Result<GeologConfig, Box<dyn std::error::Error>> {
    // If a path is provided, load from that file
    if let Some(config_path) = path {
        return GeologConfig::load_from_file(std::path::Path::new(config_path))
            .map_err(std::convert::Into::into);
    }

    // Environment override for config path
    if let Ok(config_path) = std::env::var("GEOLOG_CONFIG_PATH") {
        if !config_path.trim().is_empty() {
            return GeologConfig::load_from_file(std::path::Path::new(&config_path))
                .map_err(std::convert::Into::into);
        }
    }

    // Otherwise, load from default location
    Ok(GeologConfig::load_default())
}
