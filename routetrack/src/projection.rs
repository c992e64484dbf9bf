//! Caller-facing projections of engine results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::NavigationStatus;
use crate::fix::PositionSample;
use crate::geometry::{Coordinate, Geometry};

/// Provider tag for locations snapped to the active route.
pub const MAP_MATCHED_PROVIDER: &str = "map_matched";

/// Provider tag for locations matched during free drive.
pub const ENHANCED_PROVIDER: &str = "enhanced";

/// A location record as handed to consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub bearing: Option<f32>,
    pub speed: Option<f32>,
    pub altitude: Option<f64>,
    pub accuracy: Option<f32>,
    pub provider: String,
    pub time: DateTime<Utc>,
}

impl From<&PositionSample> for Location {
    fn from(sample: &PositionSample) -> Self {
        Self {
            latitude: sample.latitude,
            longitude: sample.longitude,
            bearing: sample.bearing,
            speed: sample.speed,
            altitude: sample.altitude,
            accuracy: sample.horizontal_accuracy,
            provider: sample.provider.clone(),
            time: sample.captured_at,
        }
    }
}

/// Merge the engine's matched position into `fallback`, tagged
/// [`MAP_MATCHED_PROVIDER`].
pub fn project_snapped_location(status: &NavigationStatus, fallback: &Location) -> Location {
    project_snapped_location_as(status, fallback, MAP_MATCHED_PROVIDER)
}

/// Merge the engine's matched position into `fallback` with an explicit
/// provider tag.
///
/// Coordinate and time always come from the engine. Bearing comes from the
/// engine only when it reported one; otherwise the fallback's bearing stays.
/// Every other field is the fallback's.
pub fn project_snapped_location_as(
    status: &NavigationStatus,
    fallback: &Location,
    provider: &str,
) -> Location {
    let matched = &status.location;
    let mut location = fallback.clone();
    location.latitude = matched.coordinate.latitude;
    location.longitude = matched.coordinate.longitude;
    location.provider = provider.to_string();
    if let Some(bearing) = matched.bearing {
        location.bearing = Some(bearing);
    }
    location.time = matched.time;
    location
}

/// Wrap an ordered coordinate sequence as a `LineString`.
pub fn line_geometry(coordinates: Vec<Coordinate>) -> Geometry {
    Geometry::LineString { coordinates }
}

/// Parse a serialized GeoJSON geometry.
pub fn geometry_from_geojson(json: &str) -> Result<Geometry, serde_json::Error> {
    serde_json::from_str(json)
}
