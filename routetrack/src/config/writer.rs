//! INI serialization: `ConfigFile` → `Ini`.

use ini::Ini;

use super::settings::ConfigFile;

/// Every setting as `(section, key, value)`, in file order.
pub(super) fn entries(config: &ConfigFile) -> Vec<(&'static str, &'static str, String)> {
    vec![
        ("buffer", "grid_size", config.buffer.grid_size.to_string()),
        ("buffer", "dilation", config.buffer.dilation.to_string()),
        ("status", "lag_ms", config.status.lag_ms.to_string()),
        (
            "free_drive",
            "poll_interval_ms",
            config.free_drive.poll_interval_ms.to_string(),
        ),
        (
            "free_drive",
            "initial_delay_ms",
            config.free_drive.initial_delay_ms.to_string(),
        ),
        (
            "free_drive",
            "cache_size",
            config.free_drive.cache_size.to_string(),
        ),
        (
            "engine",
            "off_route_threshold_m",
            config.engine.off_route_threshold_m.to_string(),
        ),
        (
            "engine",
            "arrival_threshold_m",
            config.engine.arrival_threshold_m.to_string(),
        ),
        (
            "logging",
            "directory",
            config.logging.directory.to_string_lossy().into_owned(),
        ),
        ("logging", "file", config.logging.file.clone()),
    ]
}

pub(super) fn to_ini(config: &ConfigFile) -> Ini {
    let mut ini = Ini::new();
    for (section, key, value) in entries(config) {
        ini.with_section(Some(section)).set(key, value);
    }
    ini
}
