//! Settings structs, one per `[section]` of the INI file.

use std::path::PathBuf;
use std::time::Duration;

use crate::engine::BasicEngineConfig;
use crate::free_drive::FreeDriveConfig;
use crate::navigator::{BufferConfig, NavigatorConfig};

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Buffered route geometry
    pub buffer: BufferSettings,
    /// Status queries
    pub status: StatusSettings,
    /// Free-drive polling
    pub free_drive: FreeDriveSettings,
    /// Reference engine thresholds
    pub engine: EngineSettings,
    /// Log file location
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BufferSettings {
    /// Lattice cell size in degrees.
    pub grid_size: f32,
    /// Buffer width in cells.
    pub dilation: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusSettings {
    /// Lag compensation added to status requests, in milliseconds.
    pub lag_ms: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FreeDriveSettings {
    pub poll_interval_ms: u64,
    pub initial_delay_ms: u64,
    pub cache_size: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub off_route_threshold_m: f64,
    pub arrival_threshold_m: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Directory holding the log file.
    pub directory: PathBuf,
    /// Log file name.
    pub file: String,
}

impl ConfigFile {
    pub fn navigator_config(&self) -> NavigatorConfig {
        NavigatorConfig::default().with_buffer(BufferConfig {
            grid_size: self.buffer.grid_size,
            dilation: self.buffer.dilation,
        })
    }

    pub fn free_drive_config(&self) -> FreeDriveConfig {
        FreeDriveConfig::default()
            .with_poll_interval(Duration::from_millis(self.free_drive.poll_interval_ms))
            .with_initial_delay(Duration::from_millis(self.free_drive.initial_delay_ms))
            .with_lag_millis(self.status.lag_ms)
            .with_cache_size(self.free_drive.cache_size)
    }

    pub fn engine_config(&self) -> BasicEngineConfig {
        BasicEngineConfig::default()
            .with_off_route_threshold(self.engine.off_route_threshold_m)
            .with_arrival_threshold(self.engine.arrival_threshold_m)
    }

    /// Lag compensation for status requests.
    pub fn status_lag_millis(&self) -> i64 {
        self.status.lag_ms
    }
}
