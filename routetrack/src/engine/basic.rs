//! Deterministic reference engine.
//!
//! `BasicEngine` projects the latest fix onto the active leg and reports
//! progress along it. It does no map matching beyond nearest-point
//! projection, which is enough to drive the navigator end to end.
//!
//! # Example
//!
//! ```ignore
//! let mut engine = BasicEngine::new();
//! let status = engine.set_route(&route_json, 0, 0);
//! assert_eq!(status.route_state, RouteState::Initialized);
//!
//! engine.update_location(fix);
//! let status = engine.get_status(Utc::now());
//! ```

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::buffer::route_buffer;
use super::history::HistoryRecorder;
use super::route_doc::{LegDocument, RouteDocument, RoutePayload};
use super::types::{
    BannerInstruction, FixLocation, NavigationStatus, RouteState, VoiceInstruction,
};
use super::Engine;
use crate::geo::{PathPoint, Polyline};
use crate::geometry::Coordinate;

/// Default distance from the route beyond which a fix is off-route (metres).
pub const DEFAULT_OFF_ROUTE_THRESHOLD_M: f64 = 50.0;

/// Default remaining distance on the final leg that counts as arrived (metres).
pub const DEFAULT_ARRIVAL_THRESHOLD_M: f64 = 10.0;

/// Tuning for [`BasicEngine`].
#[derive(Debug, Clone, PartialEq)]
pub struct BasicEngineConfig {
    /// Distance from the leg path beyond which the state is `OffRoute`.
    pub off_route_threshold_m: f64,
    /// Remaining distance on the last leg below which the state is `Complete`.
    pub arrival_threshold_m: f64,
}

impl Default for BasicEngineConfig {
    fn default() -> Self {
        Self {
            off_route_threshold_m: DEFAULT_OFF_ROUTE_THRESHOLD_M,
            arrival_threshold_m: DEFAULT_ARRIVAL_THRESHOLD_M,
        }
    }
}

impl BasicEngineConfig {
    pub fn with_off_route_threshold(mut self, metres: f64) -> Self {
        self.off_route_threshold_m = metres;
        self
    }

    pub fn with_arrival_threshold(mut self, metres: f64) -> Self {
        self.arrival_threshold_m = metres;
        self
    }
}

/// One leg prepared for tracking.
#[derive(Debug)]
struct LegTrack {
    path: Polyline,
    /// Path distance at the end of each step.
    step_ends: Vec<f64>,
    duration: f64,
    annotation: Option<Value>,
    voice: Vec<VoiceInstruction>,
    banner: Vec<BannerInstruction>,
}

impl LegTrack {
    fn build(leg: LegDocument, route_geometry: &[Coordinate]) -> Self {
        let mut points: Vec<Coordinate> = Vec::new();
        let mut step_vertex_ends = Vec::with_capacity(leg.steps.len());
        for step in &leg.steps {
            if let Some(geometry) = &step.geometry {
                for coordinate in &geometry.coordinates {
                    if points.last() != Some(coordinate) {
                        points.push(*coordinate);
                    }
                }
            }
            step_vertex_ends.push(points.len().saturating_sub(1));
        }

        let from_steps = points.len() >= 2;
        let path = if from_steps {
            Polyline::new(points)
        } else {
            Polyline::new(route_geometry.to_vec())
        };

        let step_ends = if from_steps {
            step_vertex_ends
                .iter()
                .map(|&vertex| path.distance_at(vertex))
                .collect()
        } else {
            leg.steps
                .iter()
                .scan(0.0, |total, step| {
                    *total += step.distance;
                    Some(*total)
                })
                .collect()
        };

        let duration = if leg.duration > 0.0 {
            leg.duration
        } else {
            leg.steps.iter().map(|step| step.duration).sum()
        };

        let (voice, banner) = leg.steps.into_iter().fold(
            (Vec::new(), Vec::new()),
            |(mut voice, mut banner), step| {
                voice.extend(step.voice_instructions);
                banner.extend(step.banner_instructions);
                (voice, banner)
            },
        );

        Self {
            path,
            step_ends,
            duration,
            annotation: leg.annotation,
            voice,
            banner,
        }
    }

    /// Index of the step containing `along_m`.
    fn step_at(&self, along_m: f64) -> u32 {
        let index = self
            .step_ends
            .iter()
            .position(|&end| along_m <= end + 1e-6)
            .unwrap_or_else(|| self.step_ends.len().saturating_sub(1));
        index as u32
    }

    fn remaining_duration(&self, remaining_m: f64) -> f64 {
        let length = self.path.length();
        if length > 0.0 {
            self.duration * (remaining_m / length)
        } else {
            0.0
        }
    }
}

/// A route accepted by `set_route`.
#[derive(Debug)]
struct LoadedRoute {
    route_index: u32,
    leg_index: u32,
    geometry: Vec<Coordinate>,
    legs: Vec<LegTrack>,
}

impl LoadedRoute {
    fn build(document: RouteDocument, route_index: u32, leg_index: u32) -> Self {
        let geometry = document.geometry.coordinates;
        let legs = document
            .legs
            .into_iter()
            .map(|leg| LegTrack::build(leg, &geometry))
            .collect();
        Self {
            route_index,
            leg_index,
            geometry,
            legs,
        }
    }

    fn addresses(&self, route_index: u32, leg_index: u32) -> bool {
        route_index == self.route_index && (leg_index as usize) < self.legs.len()
    }

    fn active_leg(&self) -> Option<&LegTrack> {
        self.legs.get(self.leg_index as usize)
    }

    fn is_last_leg(&self) -> bool {
        self.leg_index as usize + 1 == self.legs.len()
    }
}

/// Reference [`Engine`] implementation.
#[derive(Debug, Default)]
pub struct BasicEngine {
    config: BasicEngineConfig,
    route: Option<LoadedRoute>,
    last_fix: Option<FixLocation>,
    history: HistoryRecorder,
}

impl BasicEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BasicEngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &BasicEngineConfig {
        &self.config
    }

    /// True once a route has been accepted.
    pub fn has_route(&self) -> bool {
        self.route.is_some()
    }

    /// Annotation data currently attached to a leg of the loaded route.
    pub fn leg_annotation(&self, leg_index: u32) -> Option<&Value> {
        self.route
            .as_ref()?
            .legs
            .get(leg_index as usize)?
            .annotation
            .as_ref()
    }

    fn rejected(&self, at: DateTime<Utc>) -> NavigationStatus {
        let coordinate = self
            .last_fix
            .as_ref()
            .map(|fix| fix.coordinate)
            .unwrap_or_default();
        NavigationStatus::invalid(FixLocation::at(coordinate, at))
    }

    fn status_at(&self, at: DateTime<Utc>) -> NavigationStatus {
        let Some(route) = &self.route else {
            return self.rejected(at);
        };
        let Some(leg) = route.active_leg() else {
            return self.rejected(at);
        };

        let status = |route_state: RouteState, location: FixLocation, along_m: f64| {
            let remaining = (leg.path.length() - along_m).max(0.0);
            NavigationStatus {
                route_state,
                location,
                route_index: route.route_index,
                leg_index: route.leg_index,
                step_index: leg.step_at(along_m),
                remaining_leg_distance: remaining,
                remaining_leg_duration: leg.remaining_duration(remaining),
            }
        };

        let Some(fix) = &self.last_fix else {
            let start = leg.path.locate(0.0);
            let mut location = FixLocation::at(
                start.map(|p| p.coordinate).unwrap_or_default(),
                at,
            );
            location.bearing = start.and_then(|p| p.bearing).map(|b| b as f32);
            return status(RouteState::Initialized, location, 0.0);
        };

        let Some(projection) = leg.path.project(fix.coordinate) else {
            return self.rejected(at);
        };

        if projection.offset_m > self.config.off_route_threshold_m {
            let mut location = fix.clone();
            location.time = at;
            return status(RouteState::OffRoute, location, projection.along_m);
        }

        let mut along_m = projection.along_m;
        let mut matched = PathPoint {
            coordinate: projection.point,
            bearing: projection.bearing,
        };
        let elapsed = (at - fix.time).num_milliseconds();
        if let Some(speed) = fix.speed.filter(|s| s.is_finite() && *s > 0.0) {
            if elapsed > 0 {
                along_m = (along_m + f64::from(speed) * elapsed as f64 / 1000.0)
                    .min(leg.path.length());
                if let Some(point) = leg.path.locate(along_m) {
                    matched = point;
                }
            }
        }

        let remaining = leg.path.length() - along_m;
        let route_state = if route.is_last_leg() && remaining <= self.config.arrival_threshold_m {
            RouteState::Complete
        } else {
            RouteState::Tracking
        };

        let location = FixLocation {
            coordinate: matched.coordinate,
            time: at,
            speed: fix.speed,
            bearing: matched.bearing.map(|b| b as f32),
            altitude: fix.altitude,
            horizontal_accuracy: fix.horizontal_accuracy,
            provider: fix.provider.clone(),
        };
        status(route_state, location, along_m)
    }
}

impl Engine for BasicEngine {
    fn set_route(&mut self, payload: &str, route_index: u32, leg_index: u32) -> NavigationStatus {
        let route_value =
            serde_json::from_str(payload).unwrap_or_else(|_| Value::String(payload.to_string()));

        let loaded = match RoutePayload::parse(payload) {
            Ok(parsed) => parsed
                .into_route(route_index)
                .filter(|document| {
                    let valid = document.has_wgs84_coordinates();
                    if !valid {
                        warn!("Route has coordinates outside WGS84 ranges");
                    }
                    valid
                })
                .map(|document| LoadedRoute::build(document, route_index, leg_index))
                .filter(|route| route.addresses(route_index, leg_index)),
            Err(e) => {
                warn!(error = %e, "Route payload did not parse");
                None
            }
        };
        let accepted = loaded.is_some();
        self.history.record(
            "setRoute",
            json!({
                "route": route_value,
                "routeIndex": route_index,
                "legIndex": leg_index,
                "accepted": accepted,
            }),
        );

        match loaded {
            Some(route) => {
                debug!(
                    route_index,
                    leg_index,
                    legs = route.legs.len(),
                    "Route loaded"
                );
                self.route = Some(route);
                self.status_at(Utc::now())
            }
            None => self.rejected(Utc::now()),
        }
    }

    fn update_annotations(&mut self, payload: &str, route_index: u32, leg_index: u32) -> bool {
        let annotation = match serde_json::from_str::<Value>(payload) {
            Ok(value @ Value::Object(_)) => Some(value),
            _ => None,
        };

        let accepted = match (&mut self.route, annotation) {
            (Some(route), Some(annotation)) if route.addresses(route_index, leg_index) => {
                route.legs[leg_index as usize].annotation = Some(annotation);
                true
            }
            _ => false,
        };

        self.history.record(
            "updateAnnotations",
            json!({
                "routeIndex": route_index,
                "legIndex": leg_index,
                "accepted": accepted,
            }),
        );
        accepted
    }

    fn get_status(&mut self, at: DateTime<Utc>) -> NavigationStatus {
        let status = self.status_at(at);
        self.history.record(
            "getStatus",
            json!({
                "at": at.to_rfc3339(),
                "routeState": status.route_state.to_string(),
            }),
        );
        status
    }

    fn update_location(&mut self, fix: FixLocation) {
        let properties = serde_json::to_value(&fix).unwrap_or(Value::Null);
        self.history.record("updateLocation", properties);
        self.last_fix = Some(fix);
    }

    fn change_route_leg(&mut self, route_index: u32, leg_index: u32) -> NavigationStatus {
        let accepted = match &mut self.route {
            Some(route) if route.addresses(route_index, leg_index) => {
                route.leg_index = leg_index;
                true
            }
            _ => false,
        };

        self.history.record(
            "changeRouteLeg",
            json!({
                "routeIndex": route_index,
                "legIndex": leg_index,
                "accepted": accepted,
            }),
        );

        if accepted {
            self.status_at(Utc::now())
        } else {
            self.rejected(Utc::now())
        }
    }

    fn get_history(&mut self) -> String {
        self.history.to_json()
    }

    fn toggle_history(&mut self, enabled: bool) {
        self.history.toggle(enabled);
    }

    fn push_history(&mut self, event_type: &str, properties_json: &str) {
        self.history.push(event_type, properties_json);
    }

    fn get_voice_instruction(&mut self, index: u32) -> Option<VoiceInstruction> {
        let leg = self.route.as_ref()?.active_leg()?;
        leg.voice.get(index as usize).cloned()
    }

    fn get_banner_instruction(&mut self, index: u32) -> Option<BannerInstruction> {
        let leg = self.route.as_ref()?.active_leg()?;
        leg.banner.get(index as usize).cloned()
    }

    fn get_route_geometry(&mut self) -> Option<Vec<Coordinate>> {
        self.route.as_ref().map(|route| route.geometry.clone())
    }

    fn get_route_buffer_geojson(&mut self, grid_size: f32, dilation: u16) -> Option<String> {
        let route = self.route.as_ref()?;
        let buffer = route_buffer(&route.geometry, f64::from(grid_size), dilation)?;
        serde_json::to_string(&buffer).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::HistoryLog;
    use chrono::Duration;

    /// Two legs along the equator, 0.01° (~1.1 km) each.
    fn two_leg_route() -> String {
        json!({
            "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [0.01, 0.0], [0.02, 0.0]]},
            "legs": [
                {
                    "distance": 1112.0,
                    "duration": 100.0,
                    "steps": [
                        {
                            "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [0.005, 0.0]]},
                            "distance": 556.0,
                            "duration": 50.0,
                            "voiceInstructions": [{"distanceAlongGeometry": 556.0, "announcement": "Head east"}],
                            "bannerInstructions": [{"distanceAlongGeometry": 556.0, "primary": {"text": "East"}}]
                        },
                        {
                            "geometry": {"type": "LineString", "coordinates": [[0.005, 0.0], [0.01, 0.0]]},
                            "distance": 556.0,
                            "duration": 50.0,
                            "voiceInstructions": [{"distanceAlongGeometry": 100.0, "announcement": "Arrive at waypoint"}]
                        }
                    ]
                },
                {
                    "distance": 1112.0,
                    "duration": 100.0,
                    "steps": [
                        {
                            "geometry": {"type": "LineString", "coordinates": [[0.01, 0.0], [0.02, 0.0]]},
                            "distance": 1112.0,
                            "duration": 100.0,
                            "voiceInstructions": [{"distanceAlongGeometry": 100.0, "announcement": "Arrive"}]
                        }
                    ]
                }
            ]
        })
        .to_string()
    }

    fn fix(lon: f64, lat: f64, time: DateTime<Utc>) -> FixLocation {
        FixLocation::at(Coordinate::new(lon, lat), time)
    }

    #[test]
    fn test_route_outside_wgs84_rejected() {
        let mut engine = BasicEngine::new();
        let route = json!({
            "geometry": {"type": "LineString", "coordinates": [[1e300, 0.0]]},
            "legs": [{"steps": [
                {"geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [0.01, 0.0]]}}
            ]}]
        })
        .to_string();

        let status = engine.set_route(&route, 0, 0);
        assert_eq!(status.route_state, RouteState::Invalid);
        assert!(!engine.has_route());
        assert!(engine.get_route_buffer_geojson(0.0025, 1).is_none());
    }

    #[test]
    fn test_rejected_wgs84_route_keeps_previous() {
        let mut engine = BasicEngine::new();
        engine.set_route(&two_leg_route(), 0, 0);
        let bad = json!({
            "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [0.0, 91.0]]},
            "legs": [{"steps": []}]
        })
        .to_string();

        assert_eq!(engine.set_route(&bad, 0, 0).route_state, RouteState::Invalid);
        assert!(engine.get_route_buffer_geojson(0.0025, 1).is_some());
    }

    #[test]
    fn test_status_without_route_is_invalid() {
        let mut engine = BasicEngine::new();
        let status = engine.get_status(Utc::now());
        assert_eq!(status.route_state, RouteState::Invalid);
    }

    #[test]
    fn test_set_route_initializes() {
        let mut engine = BasicEngine::new();
        let status = engine.set_route(&two_leg_route(), 0, 0);
        assert_eq!(status.route_state, RouteState::Initialized);
        assert_eq!(status.leg_index, 0);
        assert_eq!(status.location.coordinate, Coordinate::new(0.0, 0.0));
        assert!((status.remaining_leg_distance - 1112.0).abs() < 2.0);
    }

    #[test]
    fn test_set_route_rejects_bad_payload_and_keeps_route() {
        let mut engine = BasicEngine::new();
        engine.set_route(&two_leg_route(), 0, 0);

        let status = engine.set_route("{not json", 0, 0);
        assert_eq!(status.route_state, RouteState::Invalid);
        assert!(engine.has_route());
        assert!(engine.get_status(Utc::now()).route_state.is_valid());
    }

    #[test]
    fn test_set_route_rejects_out_of_range_indices() {
        let mut engine = BasicEngine::new();
        assert_eq!(
            engine.set_route(&two_leg_route(), 0, 2).route_state,
            RouteState::Invalid
        );
        assert_eq!(
            engine.set_route(&two_leg_route(), 1, 0).route_state,
            RouteState::Invalid
        );
        assert!(!engine.has_route());
    }

    #[test]
    fn test_tracking_projects_fix() {
        let mut engine = BasicEngine::new();
        engine.set_route(&two_leg_route(), 0, 0);
        let now = Utc::now();
        engine.update_location(fix(0.0025, 0.0001, now));

        let status = engine.get_status(now);
        assert_eq!(status.route_state, RouteState::Tracking);
        assert!((status.location.coordinate.longitude - 0.0025).abs() < 1e-9);
        assert!(status.location.coordinate.latitude.abs() < 1e-9);
        assert_eq!(status.step_index, 0);
        assert!((status.location.bearing.unwrap() - 90.0).abs() < 1e-3);
        assert!(status.remaining_leg_duration > 0.0 && status.remaining_leg_duration < 100.0);
    }

    #[test]
    fn test_step_index_advances() {
        let mut engine = BasicEngine::new();
        engine.set_route(&two_leg_route(), 0, 0);
        let now = Utc::now();
        engine.update_location(fix(0.0075, 0.0, now));
        assert_eq!(engine.get_status(now).step_index, 1);
    }

    #[test]
    fn test_off_route_reports_raw_fix() {
        let mut engine = BasicEngine::new();
        engine.set_route(&two_leg_route(), 0, 0);
        let now = Utc::now();
        // ~1.1 km north of the route
        engine.update_location(fix(0.005, 0.01, now));

        let status = engine.get_status(now);
        assert_eq!(status.route_state, RouteState::OffRoute);
        assert_eq!(status.location.coordinate, Coordinate::new(0.005, 0.01));
    }

    #[test]
    fn test_status_extrapolates_by_speed() {
        let mut engine = BasicEngine::new();
        engine.set_route(&two_leg_route(), 0, 0);
        let captured = Utc::now();
        let mut moving = fix(0.0, 0.0, captured);
        moving.speed = Some(10.0);
        engine.update_location(moving);

        let at_capture = engine.get_status(captured);
        let later = engine.get_status(captured + Duration::milliseconds(1500));
        let advanced = at_capture.remaining_leg_distance - later.remaining_leg_distance;
        assert!((advanced - 15.0).abs() < 0.01, "advanced {}", advanced);
    }

    #[test]
    fn test_complete_on_last_leg_end() {
        let mut engine = BasicEngine::new();
        engine.set_route(&two_leg_route(), 0, 1);
        let now = Utc::now();
        engine.update_location(fix(0.02, 0.0, now));
        assert_eq!(engine.get_status(now).route_state, RouteState::Complete);
    }

    #[test]
    fn test_first_leg_end_is_not_complete() {
        let mut engine = BasicEngine::new();
        engine.set_route(&two_leg_route(), 0, 0);
        let now = Utc::now();
        engine.update_location(fix(0.01, 0.0, now));
        assert_eq!(engine.get_status(now).route_state, RouteState::Tracking);
    }

    #[test]
    fn test_change_route_leg() {
        let mut engine = BasicEngine::new();
        engine.set_route(&two_leg_route(), 0, 0);

        let status = engine.change_route_leg(0, 1);
        assert!(status.route_state.is_valid());
        assert_eq!(status.leg_index, 1);

        let rejected = engine.change_route_leg(0, 5);
        assert_eq!(rejected.route_state, RouteState::Invalid);
        assert_eq!(engine.get_status(Utc::now()).leg_index, 1);
    }

    #[test]
    fn test_change_route_leg_without_route() {
        let mut engine = BasicEngine::new();
        assert_eq!(
            engine.change_route_leg(0, 0).route_state,
            RouteState::Invalid
        );
    }

    #[test]
    fn test_update_annotations() {
        let mut engine = BasicEngine::new();
        assert!(!engine.update_annotations(r#"{"speed": [10]}"#, 0, 0));

        engine.set_route(&two_leg_route(), 0, 0);
        assert!(engine.update_annotations(r#"{"speed": [10]}"#, 0, 1));
        assert_eq!(engine.leg_annotation(1).unwrap()["speed"][0], 10);
        assert!(engine.leg_annotation(0).is_none());
        assert!(!engine.update_annotations(r#"[1, 2]"#, 0, 0));
        assert!(!engine.update_annotations(r#"{"speed": []}"#, 0, 9));
        assert!(!engine.update_annotations("garbage", 0, 0));
    }

    #[test]
    fn test_instructions_follow_active_leg() {
        let mut engine = BasicEngine::new();
        assert!(engine.get_voice_instruction(0).is_none());

        engine.set_route(&two_leg_route(), 0, 0);
        assert_eq!(
            engine.get_voice_instruction(1).unwrap().announcement,
            "Arrive at waypoint"
        );
        assert_eq!(engine.get_banner_instruction(0).unwrap().primary.text, "East");
        assert!(engine.get_banner_instruction(1).is_none());

        engine.change_route_leg(0, 1);
        assert_eq!(engine.get_voice_instruction(0).unwrap().announcement, "Arrive");
        assert!(engine.get_voice_instruction(1).is_none());
    }

    #[test]
    fn test_route_geometry() {
        let mut engine = BasicEngine::new();
        assert!(engine.get_route_geometry().is_none());

        engine.set_route(&two_leg_route(), 0, 0);
        assert_eq!(engine.get_route_geometry().unwrap().len(), 3);
    }

    #[test]
    fn test_route_buffer_geojson() {
        let mut engine = BasicEngine::new();
        assert!(engine.get_route_buffer_geojson(0.0025, 1).is_none());

        engine.set_route(&two_leg_route(), 0, 0);
        let json = engine.get_route_buffer_geojson(0.0025, 1).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "MultiPolygon");
        assert!(engine.get_route_buffer_geojson(0.0, 1).is_none());
    }

    #[test]
    fn test_leg_without_step_geometry_uses_route_geometry() {
        let route = json!({
            "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [0.01, 0.0]]},
            "legs": [{"steps": [{"distance": 500.0}, {"distance": 612.0}]}]
        })
        .to_string();
        let mut engine = BasicEngine::new();
        engine.set_route(&route, 0, 0);
        let now = Utc::now();
        engine.update_location(fix(0.0075, 0.0, now));
        let status = engine.get_status(now);
        assert_eq!(status.route_state, RouteState::Tracking);
        assert_eq!(status.step_index, 1);
    }

    #[test]
    fn test_history_records_calls_when_enabled() {
        let mut engine = BasicEngine::new();
        engine.set_route(&two_leg_route(), 0, 0);
        assert_eq!(engine.get_history(), r#"{"events":[]}"#);

        engine.toggle_history(true);
        engine.update_location(fix(0.001, 0.0, Utc::now()));
        engine.push_history("marker", r#"{"note": "here"}"#);
        engine.get_status(Utc::now());

        let log = HistoryLog::from_json(&engine.get_history()).unwrap();
        let types: Vec<_> = log.events.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(types, vec!["updateLocation", "marker", "getStatus"]);
    }
}
