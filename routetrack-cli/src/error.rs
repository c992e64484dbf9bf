//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and exit codes.

use std::fmt;
use std::io;
use std::process;

use routetrack::config::ConfigFileError;
use routetrack::navigator::NavigationError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(io::Error),
    /// Configuration file could not be loaded
    Config(ConfigFileError),
    /// Failed to read an input file
    FileRead { path: String, error: io::Error },
    /// Failed to write an output file
    FileWrite { path: String, error: io::Error },
    /// Input file is not the expected JSON
    Parse {
        path: String,
        error: serde_json::Error,
    },
    /// Navigator rejected an argument
    Navigation(NavigationError),
    /// The engine did not accept the route
    RouteRejected { path: String },
}

impl CliError {
    /// Exit the process with an error message and code 1.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        if let CliError::RouteRejected { .. } = self {
            eprintln!();
            eprintln!("The route must be a route object with a LineString geometry");
            eprintln!("and a legs array, or a directions response with a routes array.");
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::FileRead { path, error } => {
                write!(f, "Failed to read file '{}': {}", path, error)
            }
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path, error)
            }
            CliError::Parse { path, error } => {
                write!(f, "Failed to parse '{}': {}", path, error)
            }
            CliError::Navigation(e) => write!(f, "{}", e),
            CliError::RouteRejected { path } => write!(f, "Route in '{}' was rejected", path),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::LoggingInit(e) => Some(e),
            CliError::Config(e) => Some(e),
            CliError::FileRead { error, .. } => Some(error),
            CliError::FileWrite { error, .. } => Some(error),
            CliError::Parse { error, .. } => Some(error),
            CliError::Navigation(e) => Some(e),
            CliError::RouteRejected { .. } => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<NavigationError> for CliError {
    fn from(e: NavigationError) -> Self {
        CliError::Navigation(e)
    }
}
