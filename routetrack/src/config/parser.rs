//! INI parsing: `Ini` → `ConfigFile`.
//!
//! Starts from the defaults and overlays every key present in the file.

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::ConfigFile;

fn invalid(section: &str, key: &str, value: &str, reason: impl Into<String>) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Parse `section.key` if present.
fn parse_key<T>(
    properties: &Properties,
    section: &str,
    key: &str,
) -> Result<Option<T>, ConfigFileError>
where
    T: FromStr,
    T::Err: Display,
{
    match properties.get(key).map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e: T::Err| invalid(section, key, raw, e.to_string())),
    }
}

fn expand_tilde(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest),
        None => PathBuf::from(path),
    }
}

pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [buffer] section
    if let Some(section) = ini.section(Some("buffer")) {
        if let Some(v) = parse_key::<f32>(section, "buffer", "grid_size")? {
            if !v.is_finite() || v <= 0.0 {
                return Err(invalid(
                    "buffer",
                    "grid_size",
                    &v.to_string(),
                    "must be a positive number of degrees",
                ));
            }
            config.buffer.grid_size = v;
        }
        if let Some(v) = parse_key(section, "buffer", "dilation")? {
            config.buffer.dilation = v;
        }
    }

    // [status] section
    if let Some(section) = ini.section(Some("status")) {
        if let Some(v) = parse_key(section, "status", "lag_ms")? {
            config.status.lag_ms = v;
        }
    }

    // [free_drive] section
    if let Some(section) = ini.section(Some("free_drive")) {
        if let Some(v) = parse_key::<u64>(section, "free_drive", "poll_interval_ms")? {
            if v == 0 {
                return Err(invalid(
                    "free_drive",
                    "poll_interval_ms",
                    "0",
                    "must be at least 1",
                ));
            }
            config.free_drive.poll_interval_ms = v;
        }
        if let Some(v) = parse_key(section, "free_drive", "initial_delay_ms")? {
            config.free_drive.initial_delay_ms = v;
        }
        if let Some(v) = parse_key(section, "free_drive", "cache_size")? {
            config.free_drive.cache_size = v;
        }
    }

    // [engine] section
    if let Some(section) = ini.section(Some("engine")) {
        if let Some(v) = parse_key(section, "engine", "off_route_threshold_m")? {
            config.engine.off_route_threshold_m = v;
        }
        if let Some(v) = parse_key(section, "engine", "arrival_threshold_m")? {
            config.engine.arrival_threshold_m = v;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("directory").map(str::trim) {
            if !v.is_empty() {
                config.logging.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("file").map(str::trim) {
            if !v.is_empty() {
                config.logging.file = v.to_string();
            }
        }
    }

    Ok(config)
}
