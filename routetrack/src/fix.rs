//! Position sample translation.
//!
//! Converts a raw positioning sample into the engine's [`FixLocation`].
//!
//! # Zero means absent
//!
//! A speed, bearing, altitude or accuracy of exactly `0.0` is translated to
//! `None`, the same as a value that was never measured. Callers of the
//! translated fix cannot tell a vehicle standing still (speed 0) or heading
//! due north (bearing 0) from one whose source reported nothing. This is a
//! known limitation kept for compatibility with the engine's input contract.
//!
//! # Example
//!
//! ```ignore
//! let sample = PositionSample::new(52.5200, 13.4050).with_speed(12.5);
//! let fix = translate(&sample);
//! assert_eq!(fix.speed, Some(12.5));
//! assert_eq!(fix.bearing, None);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::FixLocation;
use crate::geometry::Coordinate;

/// A raw position sample as reported by a positioning source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSample {
    /// Longitude in degrees.
    pub longitude: f64,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Speed in metres per second.
    #[serde(default)]
    pub speed: Option<f32>,
    /// Course over ground in degrees.
    #[serde(default)]
    pub bearing: Option<f32>,
    /// Altitude in metres.
    #[serde(default)]
    pub altitude: Option<f64>,
    /// Horizontal accuracy radius in metres.
    #[serde(default)]
    pub horizontal_accuracy: Option<f32>,
    /// Source tag, e.g. `gps` or `fused`.
    #[serde(default)]
    pub provider: String,
    /// When the source captured the sample.
    #[serde(default = "Utc::now")]
    pub captured_at: DateTime<Utc>,
}

impl PositionSample {
    /// Create a sample at the given position, captured now.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            longitude,
            latitude,
            speed: None,
            bearing: None,
            altitude: None,
            horizontal_accuracy: None,
            provider: String::new(),
            captured_at: Utc::now(),
        }
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_bearing(mut self, bearing: f32) -> Self {
        self.bearing = Some(bearing);
        self
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    pub fn with_accuracy(mut self, accuracy: f32) -> Self {
        self.horizontal_accuracy = Some(accuracy);
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn with_captured_at(mut self, captured_at: DateTime<Utc>) -> Self {
        self.captured_at = captured_at;
        self
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.longitude, self.latitude)
    }
}

/// Treat an exact zero as "not measured".
///
/// `-0.0` compares equal to zero and is dropped too. Every other value,
/// including NaN and tiny non-zero values, passes through unchanged.
pub fn absent_if_zero(value: Option<f32>) -> Option<f32> {
    value.filter(|v| *v != 0.0)
}

/// Translate a sample, stamping it with `now` as the authoritative fix time.
///
/// Altitude is narrowed to `f32` before the zero check. An empty provider
/// becomes `None`.
pub fn translate_at(sample: &PositionSample, now: DateTime<Utc>) -> FixLocation {
    FixLocation {
        coordinate: sample.coordinate(),
        time: now,
        speed: absent_if_zero(sample.speed),
        bearing: absent_if_zero(sample.bearing),
        altitude: absent_if_zero(sample.altitude.map(|a| a as f32)),
        horizontal_accuracy: absent_if_zero(sample.horizontal_accuracy),
        provider: Some(sample.provider.clone()).filter(|p| !p.is_empty()),
    }
}

/// Translate a sample at the current processing time.
pub fn translate(sample: &PositionSample) -> FixLocation {
    translate_at(sample, Utc::now())
}
