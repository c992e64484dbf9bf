//! RouteTrack CLI - Command-line interface
//!
//! Replays recorded position fixes against a route through the synchronized
//! navigator and prints what the engine reports, one JSON object per line.
//! Logs go to `~/.routetrack/logs/routetrack.log` and stderr.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use routetrack::config::ConfigFile;
use routetrack::logging::{init_logging, LoggingGuard};

use commands::config::ConfigCommands;
use commands::geometry::GeometryArgs;
use commands::status::StatusArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "routetrack")]
#[command(about = "Replay position fixes against a route", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Replay fixes and print the status after each one
    Status(StatusArgs),

    /// Print the route geometry or its buffer as GeoJSON
    Geometry(GeometryArgs),

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = ConfigFile::load()?;

    match cli.command {
        Commands::Status(args) => {
            let _guard = start_logging(&config)?;
            commands::status::run(args, &config)
        }
        Commands::Geometry(args) => {
            let _guard = start_logging(&config)?;
            commands::geometry::run(args, &config)
        }
        Commands::Config(command) => commands::config::run(command, &config),
    }
}

fn start_logging(config: &ConfigFile) -> Result<LoggingGuard, CliError> {
    let guard = init_logging(&config.logging.directory, &config.logging.file)
        .map_err(CliError::LoggingInit)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "routetrack starting");
    Ok(guard)
}
