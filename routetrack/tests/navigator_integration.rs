//! Integration tests for the Navigator facade.
//!
//! These tests drive a `Navigator<BasicEngine>` through its public surface:
//! - Route, leg and geometry lifecycle
//! - History capture and reset semantics
//! - Lag-compensated status instants
//! - Concurrent callers never overlapping inside the engine
//!
//! Run with: `cargo test --test navigator_integration`

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;

use routetrack::engine::{
    BannerInstruction, BasicEngine, Engine, FixLocation, HistoryLog, HistorySource,
    NavigationStatus, RouteState, VoiceInstruction,
};
use routetrack::fix::PositionSample;
use routetrack::geometry::Coordinate;
use routetrack::navigator::{Navigator, PRIMARY_ROUTE_INDEX};
use routetrack::projection::{project_snapped_location, Location, MAP_MATCHED_PROVIDER};
use routetrack::route::{RouteTransition, RouteUpdate};

// ============================================================================
// Helper Functions
// ============================================================================

/// Two legs heading east along the equator, ~1.1 km each.
fn two_leg_route() -> String {
    json!({
        "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [0.01, 0.0], [0.02, 0.0]]},
        "distance": 2224.0,
        "duration": 200.0,
        "legs": [
            {
                "distance": 1112.0,
                "duration": 100.0,
                "steps": [{
                    "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0], [0.01, 0.0]]},
                    "distance": 1112.0,
                    "duration": 100.0,
                    "voiceInstructions": [{"distanceAlongGeometry": 200.0, "announcement": "Waypoint ahead"}],
                    "bannerInstructions": [{"distanceAlongGeometry": 200.0, "primary": {"text": "Waypoint"}}]
                }]
            },
            {
                "distance": 1112.0,
                "duration": 100.0,
                "steps": [{
                    "geometry": {"type": "LineString", "coordinates": [[0.01, 0.0], [0.02, 0.0]]},
                    "distance": 1112.0,
                    "duration": 100.0,
                    "voiceInstructions": [{"distanceAlongGeometry": 200.0, "announcement": "Destination ahead"}]
                }]
            }
        ]
    })
    .to_string()
}

fn fixed_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

/// Instants the engine was asked for status at, read from its history log.
fn status_instants(navigator: &Navigator<BasicEngine>) -> Vec<DateTime<Utc>> {
    let log = HistoryLog::from_json(&navigator.retrieve_history()).unwrap();
    log.events
        .iter()
        .filter(|record| record.event_type == "getStatus")
        .map(|record| {
            let at = record.properties["at"].as_str().unwrap();
            DateTime::parse_from_rfc3339(at).unwrap().with_timezone(&Utc)
        })
        .collect()
}

// ============================================================================
// Scenario
// ============================================================================

#[test]
fn test_route_leg_and_geometry_scenario() {
    let navigator = Navigator::new(BasicEngine::new());

    // Geometry before any route is absent, not empty
    assert!(navigator.retrieve_route_geometry().is_none());
    assert!(navigator
        .retrieve_route_geometry_with_buffer()
        .unwrap()
        .is_none());

    let status = navigator
        .set_route(&two_leg_route(), PRIMARY_ROUTE_INDEX, 0)
        .unwrap();
    assert!(status.route_state.is_valid());
    assert_eq!(status.leg_index, 0);

    navigator.update_location(&PositionSample::new(0.0, 0.004).with_speed(12.0));
    let status = navigator.retrieve_status(Utc::now(), 0);
    assert_eq!(status.route_state, RouteState::Tracking);
    assert_eq!(status.leg_index, 0);

    let status = navigator.update_leg_index(1);
    assert_eq!(status.leg_index, 1);
    let status = navigator.retrieve_status(Utc::now(), 0);
    assert_eq!(status.leg_index, 1);
    assert_eq!(
        navigator.retrieve_voice_instruction(0).unwrap().announcement,
        "Destination ahead"
    );

    let geometry = navigator.retrieve_route_geometry().unwrap();
    assert_eq!(geometry.coordinate_count(), 3);
}

#[test]
fn test_snapped_location_from_status() {
    let navigator = Navigator::new(BasicEngine::new());
    navigator
        .set_route(&two_leg_route(), PRIMARY_ROUTE_INDEX, 0)
        .unwrap();

    // 20 m north of the route, reporting a bearing the engine will replace
    let sample = PositionSample::new(0.00018, 0.003)
        .with_bearing(10.0)
        .with_speed(5.0)
        .with_provider("gps");
    navigator.update_location(&sample);

    let status = navigator.retrieve_status(Utc::now(), 0);
    let snapped = project_snapped_location(&status, &Location::from(&sample));

    assert_eq!(snapped.provider, MAP_MATCHED_PROVIDER);
    assert!(snapped.latitude.abs() < 1e-9);
    assert!((snapped.bearing.unwrap() - 90.0).abs() < 1e-3);
    assert_eq!(snapped.speed, Some(5.0));
}

#[test]
fn test_route_updates_through_coordinator() {
    let navigator = Navigator::new(BasicEngine::new());
    let route = two_leg_route();

    let outcome = navigator
        .apply_route_update(&RouteUpdate::new_route(route.as_str()))
        .unwrap();
    assert!(outcome.accepted);
    assert_eq!(outcome.transition, RouteTransition::NewRoute);

    let outcome = navigator
        .apply_route_update(&RouteUpdate::refresh_annotations(
            r#"{"congestion": ["low", "heavy"]}"#,
            0,
        ))
        .unwrap();
    assert!(outcome.accepted);

    let outcome = navigator
        .apply_route_update(&RouteUpdate::new_route_at_leg(route.as_str(), 1))
        .unwrap();
    assert_eq!(outcome.transition, RouteTransition::Reroute);
    assert_eq!(navigator.active_route().unwrap().leg_index, 1);

    // Out of range legs are passed through and rejected by the engine
    let outcome = navigator
        .apply_route_update(&RouteUpdate::new_route_at_leg(route.as_str(), 9))
        .unwrap();
    assert!(!outcome.accepted);
    assert_eq!(navigator.active_route().unwrap().leg_index, 1);
}

// ============================================================================
// History
// ============================================================================

#[test]
fn test_history_contains_pushed_events_in_order() {
    let navigator = Navigator::new(BasicEngine::new());
    navigator.toggle_history(true);

    for i in 0..5 {
        navigator.add_history_event(&format!("marker-{}", i), &json!({ "seq": i }).to_string());
    }

    let log = HistoryLog::from_json(&navigator.retrieve_history()).unwrap();
    let pushed: Vec<_> = log.user_events().collect();
    assert_eq!(pushed.len(), 5);
    for (i, record) in pushed.iter().enumerate() {
        assert_eq!(record.event_type, format!("marker-{}", i));
        assert_eq!(record.properties["seq"], i);
        assert_eq!(record.source, HistorySource::User);
    }
}

#[test]
fn test_history_toggle_resets_log() {
    let navigator = Navigator::new(BasicEngine::new());
    navigator.toggle_history(true);
    navigator.add_history_event("before", "{}");

    // Callers needing the old log must read it before toggling
    let before = HistoryLog::from_json(&navigator.retrieve_history()).unwrap();
    assert_eq!(before.events.len(), 1);

    navigator.toggle_history(false);
    navigator.toggle_history(true);
    navigator.add_history_event("after", "{}");

    let after = HistoryLog::from_json(&navigator.retrieve_history()).unwrap();
    let types: Vec<_> = after.events.iter().map(|e| e.event_type.as_str()).collect();
    assert_eq!(types, vec!["after"]);
}

#[test]
fn test_history_events_ignored_while_disabled() {
    let navigator = Navigator::new(BasicEngine::new());
    navigator.add_history_event("ignored", "{}");
    navigator.toggle_history(true);
    let log = HistoryLog::from_json(&navigator.retrieve_history()).unwrap();
    assert!(log.events.is_empty());
}

// ============================================================================
// Lag compensation
// ============================================================================

#[test]
fn test_status_instant_without_lag() {
    let navigator = Navigator::new(BasicEngine::new());
    navigator.toggle_history(true);

    navigator.retrieve_status(fixed_instant(), 0);
    assert_eq!(status_instants(&navigator), vec![fixed_instant()]);
}

#[test]
fn test_status_instant_with_positive_lag() {
    let navigator = Navigator::new(BasicEngine::new());
    navigator.toggle_history(true);

    navigator.retrieve_status(fixed_instant(), 1500);
    assert_eq!(
        status_instants(&navigator),
        vec![fixed_instant() + Duration::milliseconds(1500)]
    );
}

#[test]
fn test_status_instant_with_negative_lag() {
    let navigator = Navigator::new(BasicEngine::new());
    navigator.toggle_history(true);

    navigator.retrieve_status(fixed_instant(), -1500);
    assert_eq!(status_instants(&navigator), vec![fixed_instant()]);
}

#[test]
fn test_lag_moves_matched_position_forward() {
    let navigator = Navigator::new(BasicEngine::new());
    navigator
        .set_route(&two_leg_route(), PRIMARY_ROUTE_INDEX, 0)
        .unwrap();
    navigator.update_location(&PositionSample::new(0.0, 0.002).with_speed(20.0));

    let now = Utc::now();
    let plain = navigator.retrieve_status(now, 0);
    let compensated = navigator.retrieve_status(now, 1500);
    assert!(compensated.location.coordinate.longitude > plain.location.coordinate.longitude);
    assert!(compensated.remaining_leg_distance < plain.remaining_leg_distance);
}

// ============================================================================
// Concurrency
// ============================================================================

/// Shared counters observed by `ProbeEngine`.
#[derive(Default)]
struct Probe {
    inside: AtomicBool,
    overlaps: AtomicUsize,
    calls: AtomicUsize,
}

/// Engine wrapper that flags any call entering while another is running.
struct ProbeEngine {
    inner: BasicEngine,
    probe: Arc<Probe>,
}

impl ProbeEngine {
    fn enter<R>(&mut self, call: impl FnOnce(&mut BasicEngine) -> R) -> R {
        if self.probe.inside.swap(true, Ordering::SeqCst) {
            self.probe.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        // Widen the window in which an overlap would be visible
        thread::yield_now();
        let result = call(&mut self.inner);
        self.probe.calls.fetch_add(1, Ordering::SeqCst);
        self.probe.inside.store(false, Ordering::SeqCst);
        result
    }
}

impl Engine for ProbeEngine {
    fn set_route(&mut self, payload: &str, route_index: u32, leg_index: u32) -> NavigationStatus {
        self.enter(|e| e.set_route(payload, route_index, leg_index))
    }
    fn update_annotations(&mut self, payload: &str, route_index: u32, leg_index: u32) -> bool {
        self.enter(|e| e.update_annotations(payload, route_index, leg_index))
    }
    fn get_status(&mut self, at: DateTime<Utc>) -> NavigationStatus {
        self.enter(|e| e.get_status(at))
    }
    fn update_location(&mut self, fix: FixLocation) {
        self.enter(|e| e.update_location(fix))
    }
    fn change_route_leg(&mut self, route_index: u32, leg_index: u32) -> NavigationStatus {
        self.enter(|e| e.change_route_leg(route_index, leg_index))
    }
    fn get_history(&mut self) -> String {
        self.enter(|e| e.get_history())
    }
    fn toggle_history(&mut self, enabled: bool) {
        self.enter(|e| e.toggle_history(enabled))
    }
    fn push_history(&mut self, event_type: &str, properties_json: &str) {
        self.enter(|e| e.push_history(event_type, properties_json))
    }
    fn get_voice_instruction(&mut self, index: u32) -> Option<VoiceInstruction> {
        self.enter(|e| e.get_voice_instruction(index))
    }
    fn get_banner_instruction(&mut self, index: u32) -> Option<BannerInstruction> {
        self.enter(|e| e.get_banner_instruction(index))
    }
    fn get_route_geometry(&mut self) -> Option<Vec<Coordinate>> {
        self.enter(|e| e.get_route_geometry())
    }
    fn get_route_buffer_geojson(&mut self, grid_size: f32, dilation: u16) -> Option<String> {
        self.enter(|e| e.get_route_buffer_geojson(grid_size, dilation))
    }
}

fn assert_possible(status: &NavigationStatus) {
    assert!(status.route_state.is_valid(), "unexpected {:?}", status);
    assert!(status.leg_index <= 1, "leg {} does not exist", status.leg_index);
    assert!(status.remaining_leg_distance.is_finite());
    assert!(status.remaining_leg_distance >= 0.0);
    assert!(status.remaining_leg_distance <= 1113.0);
    assert!(status.location.coordinate.latitude.is_finite());
}

#[test]
fn test_concurrent_callers_never_overlap() {
    const THREADS: usize = 6;
    const ITERATIONS: usize = 300;

    let probe = Arc::new(Probe::default());
    let route = two_leg_route();
    let navigator = Arc::new(Navigator::new(ProbeEngine {
        inner: BasicEngine::new(),
        probe: Arc::clone(&probe),
    }));
    navigator.set_route(&route, PRIMARY_ROUTE_INDEX, 0).unwrap();
    navigator.toggle_history(true);

    let handles: Vec<_> = (0..THREADS)
        .map(|thread_id| {
            let navigator = Arc::clone(&navigator);
            let route = route.clone();
            thread::spawn(move || {
                for i in 0..ITERATIONS {
                    let leg = (i % 2) as u32;
                    match (thread_id + i) % 12 {
                        0 => assert_possible(
                            &navigator.set_route(&route, PRIMARY_ROUTE_INDEX, leg).unwrap(),
                        ),
                        1 => {
                            navigator
                                .update_annotations(r#"{"speed": [1]}"#, PRIMARY_ROUTE_INDEX, leg)
                                .unwrap();
                        }
                        2 => assert_possible(&navigator.retrieve_status(Utc::now(), 1500)),
                        3 => {
                            let lon = 0.02 * (i as f64 / ITERATIONS as f64);
                            navigator.update_location(
                                &PositionSample::new(0.0, lon).with_speed(10.0),
                            );
                        }
                        4 => assert_possible(&navigator.update_leg_index(leg)),
                        5 => {
                            let log = navigator.retrieve_history();
                            assert!(HistoryLog::from_json(&log).is_ok());
                        }
                        6 => navigator.toggle_history(i % 4 == 0),
                        7 => navigator.add_history_event("stress", &json!({ "i": i }).to_string()),
                        8 => {
                            let _ = navigator.retrieve_voice_instruction(0);
                        }
                        9 => {
                            let _ = navigator.retrieve_banner_instruction(0);
                        }
                        10 => assert!(navigator.retrieve_route_geometry().is_some()),
                        _ => assert!(navigator
                            .retrieve_route_geometry_with_buffer()
                            .unwrap()
                            .is_some()),
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(probe.overlaps.load(Ordering::SeqCst), 0);
    // Two setup calls plus one engine call per operation
    assert_eq!(
        probe.calls.load(Ordering::SeqCst),
        2 + THREADS * ITERATIONS
    );
    assert!(navigator.active_route().is_some());
}

#[test]
fn test_panicking_caller_releases_lock() {
    struct PanicOnHistory(BasicEngine);

    impl Engine for PanicOnHistory {
        fn set_route(&mut self, p: &str, r: u32, l: u32) -> NavigationStatus {
            self.0.set_route(p, r, l)
        }
        fn update_annotations(&mut self, p: &str, r: u32, l: u32) -> bool {
            self.0.update_annotations(p, r, l)
        }
        fn get_status(&mut self, at: DateTime<Utc>) -> NavigationStatus {
            self.0.get_status(at)
        }
        fn update_location(&mut self, fix: FixLocation) {
            self.0.update_location(fix)
        }
        fn change_route_leg(&mut self, r: u32, l: u32) -> NavigationStatus {
            self.0.change_route_leg(r, l)
        }
        fn get_history(&mut self) -> String {
            panic!("history backend unavailable")
        }
        fn toggle_history(&mut self, enabled: bool) {
            self.0.toggle_history(enabled)
        }
        fn push_history(&mut self, t: &str, p: &str) {
            self.0.push_history(t, p)
        }
        fn get_voice_instruction(&mut self, i: u32) -> Option<VoiceInstruction> {
            self.0.get_voice_instruction(i)
        }
        fn get_banner_instruction(&mut self, i: u32) -> Option<BannerInstruction> {
            self.0.get_banner_instruction(i)
        }
        fn get_route_geometry(&mut self) -> Option<Vec<Coordinate>> {
            self.0.get_route_geometry()
        }
        fn get_route_buffer_geojson(&mut self, g: f32, d: u16) -> Option<String> {
            self.0.get_route_buffer_geojson(g, d)
        }
    }

    let navigator = Arc::new(Navigator::new(PanicOnHistory(BasicEngine::new())));
    let panicking = Arc::clone(&navigator);
    let result = thread::spawn(move || panicking.retrieve_history()).join();
    assert!(result.is_err());

    // The guard was released while unwinding
    let status = navigator
        .set_route(&two_leg_route(), PRIMARY_ROUTE_INDEX, 0)
        .unwrap();
    assert!(status.route_state.is_valid());
}
