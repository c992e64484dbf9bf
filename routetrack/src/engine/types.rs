//! Values exchanged with a tracking engine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geometry::Coordinate;

/// A translated position fix in the engine's representation.
///
/// Optional fields are `None` when the positioning source did not measure
/// them. A measured value of exactly zero is also `None` (see
/// [`crate::fix::absent_if_zero`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixLocation {
    pub coordinate: Coordinate,
    /// Authoritative fix time (processing time, not capture time).
    pub time: DateTime<Utc>,
    /// Speed in metres per second.
    pub speed: Option<f32>,
    /// Course over ground in degrees from north.
    pub bearing: Option<f32>,
    /// Altitude in metres, single precision.
    pub altitude: Option<f32>,
    /// Horizontal accuracy radius in metres.
    pub horizontal_accuracy: Option<f32>,
    /// Positioning source tag.
    pub provider: Option<String>,
}

impl FixLocation {
    /// A fix with only a coordinate and time.
    pub fn at(coordinate: Coordinate, time: DateTime<Utc>) -> Self {
        Self {
            coordinate,
            time,
            speed: None,
            bearing: None,
            altitude: None,
            horizontal_accuracy: None,
            provider: None,
        }
    }
}

/// Engine progress state for the active route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteState {
    /// No usable route, or the request was rejected.
    #[default]
    Invalid,
    /// Route loaded, no location received yet.
    Initialized,
    /// Following the route.
    Tracking,
    /// Arrived at the end of the final leg.
    Complete,
    /// Location too far from the route.
    OffRoute,
}

impl RouteState {
    /// True for every state except [`RouteState::Invalid`].
    pub fn is_valid(self) -> bool {
        self != RouteState::Invalid
    }
}

impl fmt::Display for RouteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RouteState::Invalid => "invalid",
            RouteState::Initialized => "initialized",
            RouteState::Tracking => "tracking",
            RouteState::Complete => "complete",
            RouteState::OffRoute => "off_route",
        };
        f.write_str(name)
    }
}

/// The engine's point-in-time answer to "where is the vehicle now".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationStatus {
    pub route_state: RouteState,
    /// Matched position. `bearing` is present only when the engine derived one.
    pub location: FixLocation,
    pub route_index: u32,
    pub leg_index: u32,
    pub step_index: u32,
    /// Metres left on the current leg.
    pub remaining_leg_distance: f64,
    /// Seconds left on the current leg.
    pub remaining_leg_duration: f64,
}

impl NavigationStatus {
    /// An `Invalid` status carrying `location`, with zeroed progress.
    pub fn invalid(location: FixLocation) -> Self {
        Self {
            route_state: RouteState::Invalid,
            location,
            route_index: 0,
            leg_index: 0,
            step_index: 0,
            remaining_leg_distance: 0.0,
            remaining_leg_duration: 0.0,
        }
    }
}

/// A spoken guidance instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceInstruction {
    /// Distance from the end of the step at which to announce, in metres.
    pub distance_along_geometry: f64,
    pub announcement: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssml_announcement: Option<String>,
}

/// A visual guidance banner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerInstruction {
    pub distance_along_geometry: f64,
    pub primary: BannerSection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<BannerSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<BannerSection>,
}

/// One line of a banner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BannerSection {
    pub text: String,
    /// Maneuver type, e.g. `turn`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Maneuver modifier, e.g. `left`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier: Option<String>,
}
