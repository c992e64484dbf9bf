//! Route payload documents understood by [`super::BasicEngine`].
//!
//! Accepts either a single route object or a directions response wrapping a
//! `routes` array. Unknown fields are ignored.

use serde::Deserialize;
use serde_json::Value;

use super::types::{BannerInstruction, VoiceInstruction};
use crate::geometry::Coordinate;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RoutePayload {
    Directions { routes: Vec<RouteDocument> },
    Single(RouteDocument),
}

impl RoutePayload {
    pub(crate) fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Take the route at `index`. A single route only answers to index 0.
    pub(crate) fn into_route(self, index: u32) -> Option<RouteDocument> {
        match self {
            RoutePayload::Directions { routes } => routes.into_iter().nth(index as usize),
            RoutePayload::Single(route) if index == 0 => Some(route),
            RoutePayload::Single(_) => None,
        }
    }
}

impl RouteDocument {
    /// True when the route geometry and every step geometry hold only WGS84
    /// positions.
    pub(crate) fn has_wgs84_coordinates(&self) -> bool {
        let steps = self
            .legs
            .iter()
            .flat_map(|leg| &leg.steps)
            .filter_map(|step| step.geometry.as_ref());
        std::iter::once(&self.geometry)
            .chain(steps)
            .flat_map(|line| &line.coordinates)
            .all(Coordinate::is_wgs84)
    }
}

/// A GeoJSON LineString, the only geometry form routes carry.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct LineDocument {
    #[serde(default)]
    pub coordinates: Vec<Coordinate>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RouteDocument {
    pub geometry: LineDocument,
    pub legs: Vec<LegDocument>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct LegDocument {
    #[serde(default)]
    pub steps: Vec<StepDocument>,
    #[serde(default)]
    pub annotation: Option<Value>,
    /// Seconds for the whole leg; the step durations are summed when absent.
    #[serde(default)]
    pub duration: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StepDocument {
    #[serde(default)]
    pub geometry: Option<LineDocument>,
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub voice_instructions: Vec<VoiceInstruction>,
    #[serde(default)]
    pub banner_instructions: Vec<BannerInstruction>,
}
