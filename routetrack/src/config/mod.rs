//! User configuration for routetrack components.
//!
//! Settings are read from `~/.routetrack/config.ini`. A missing file yields
//! the defaults; a present file only needs the keys it wants to override.
//!
//! # Example
//!
//! ```ignore
//! use routetrack::config::ConfigFile;
//!
//! let config = ConfigFile::load()?;
//! let navigator = Navigator::with_config(
//!     BasicEngine::with_config(config.engine_config()),
//!     config.navigator_config(),
//! );
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    BufferSettings, ConfigFile, EngineSettings, FreeDriveSettings, LoggingSettings,
    StatusSettings,
};
