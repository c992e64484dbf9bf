//! Default values for every configuration setting.

use super::file::config_directory;
use super::settings::*;
use crate::engine::{DEFAULT_ARRIVAL_THRESHOLD_M, DEFAULT_OFF_ROUTE_THRESHOLD_M};
use crate::free_drive::{
    DEFAULT_CACHE_SIZE, DEFAULT_INITIAL_DELAY, DEFAULT_LAG_MILLIS, DEFAULT_POLL_INTERVAL,
};
use crate::navigator::{DEFAULT_BUFFER_DILATION, DEFAULT_BUFFER_GRID_SIZE};

/// Default status lag compensation in milliseconds.
pub const DEFAULT_STATUS_LAG_MS: i64 = DEFAULT_LAG_MILLIS;

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "routetrack.log";

/// Default log directory name under the config directory.
pub const DEFAULT_LOG_DIR_NAME: &str = "logs";

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            buffer: BufferSettings {
                grid_size: DEFAULT_BUFFER_GRID_SIZE,
                dilation: DEFAULT_BUFFER_DILATION,
            },
            status: StatusSettings {
                lag_ms: DEFAULT_STATUS_LAG_MS,
            },
            free_drive: FreeDriveSettings {
                poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
                initial_delay_ms: DEFAULT_INITIAL_DELAY.as_millis() as u64,
                cache_size: DEFAULT_CACHE_SIZE,
            },
            engine: EngineSettings {
                off_route_threshold_m: DEFAULT_OFF_ROUTE_THRESHOLD_M,
                arrival_threshold_m: DEFAULT_ARRIVAL_THRESHOLD_M,
            },
            logging: LoggingSettings {
                directory: config_directory().join(DEFAULT_LOG_DIR_NAME),
                file: DEFAULT_LOG_FILE.to_string(),
            },
        }
    }
}
