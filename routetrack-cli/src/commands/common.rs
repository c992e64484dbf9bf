//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;

use routetrack::config::ConfigFile;
use routetrack::engine::BasicEngine;
use routetrack::navigator::{Navigator, PRIMARY_ROUTE_INDEX};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::error::CliError;

/// Read a whole file as UTF-8.
pub fn read_file(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|error| CliError::FileRead {
        path: path.display().to_string(),
        error,
    })
}

/// Read and deserialize a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let text = read_file(path)?;
    serde_json::from_str(&text).map_err(|error| CliError::Parse {
        path: path.display().to_string(),
        error,
    })
}

/// Write `contents` to `path`.
pub fn write_file(path: &Path, contents: &str) -> Result<(), CliError> {
    fs::write(path, contents).map_err(|error| CliError::FileWrite {
        path: path.display().to_string(),
        error,
    })
}

/// Build a navigator over the reference engine from user configuration.
pub fn build_navigator(config: &ConfigFile) -> Navigator<BasicEngine> {
    Navigator::with_config(
        BasicEngine::with_config(config.engine_config()),
        config.navigator_config(),
    )
}

/// Load the route at `path` into `navigator` at `leg_index`.
///
/// Fails when the engine answers with an invalid status.
pub fn load_route(
    navigator: &Navigator<BasicEngine>,
    path: &Path,
    leg_index: u32,
) -> Result<(), CliError> {
    let payload = read_file(path)?;
    let status = navigator.set_route(&payload, PRIMARY_ROUTE_INDEX, leg_index)?;

    if !status.route_state.is_valid() {
        return Err(CliError::RouteRejected {
            path: path.display().to_string(),
        });
    }

    info!(route = %path.display(), leg_index, state = %status.route_state, "Route loaded");
    Ok(())
}
