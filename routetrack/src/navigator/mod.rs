//! Serialized access to a tracking engine.
//!
//! A [`Navigator`] owns one [`Engine`] and the route applied to it. Every
//! operation, reads included, runs under a single session lock for its full
//! duration, so concurrent callers see the engine as if their calls executed
//! one at a time in some total order. The lock guard is released on every
//! exit path, including a panic unwinding out of the engine.
//!
//! Waiters block. There is no priority, timeout or cancellation at this
//! layer, and no operation is retried.
//!
//! # Example
//!
//! ```ignore
//! let navigator = Arc::new(Navigator::new(BasicEngine::new()));
//!
//! navigator.set_route(&route_json, PRIMARY_ROUTE_INDEX, 0)?;
//!
//! // Positioning thread
//! navigator.update_location(&sample);
//!
//! // Status loop
//! let status = navigator.retrieve_status(Utc::now(), 1500);
//! let snapped = project_snapped_location(&status, &Location::from(&sample));
//! ```

mod config;
mod error;

pub use config::{BufferConfig, NavigatorConfig, DEFAULT_BUFFER_DILATION, DEFAULT_BUFFER_GRID_SIZE};
pub use error::NavigationError;

pub use crate::route::ActiveRoute;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::engine::{BannerInstruction, Engine, FixLocation, NavigationStatus, VoiceInstruction};
use crate::fix::{self, PositionSample};
use crate::geometry::Geometry;
use crate::projection::{geometry_from_geojson, line_geometry};
use crate::route::{self, RouteDispatch, RouteOutcome, RouteTransition, RouteUpdate};

/// The only route slot used. Multi-route sessions would need this generalized.
pub const PRIMARY_ROUTE_INDEX: u32 = 0;

/// Point-in-time copy of the session's route bookkeeping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub active_route: Option<ActiveRoute>,
    pub last_transition: Option<RouteTransition>,
}

/// State guarded by the session lock.
struct Session<E> {
    engine: E,
    active_route: Option<ActiveRoute>,
    last_transition: Option<RouteTransition>,
}

impl<E: Engine> Session<E> {
    fn set_route(
        &mut self,
        payload: &str,
        route_index: u32,
        leg_index: u32,
        transition: RouteTransition,
    ) -> NavigationStatus {
        let status = self.engine.set_route(payload, route_index, leg_index);
        if status.route_state.is_valid() {
            info!(%transition, route_index, leg_index, "Route applied");
            self.active_route = Some(ActiveRoute::new(payload, route_index, leg_index));
            self.last_transition = Some(transition);
        } else {
            warn!(route_index, leg_index, "Engine rejected route");
        }
        status
    }

    fn update_annotations(&mut self, payload: &str, route_index: u32, leg_index: u32) -> bool {
        let accepted = self
            .engine
            .update_annotations(payload, route_index, leg_index);
        if accepted {
            if let Some(route) = self.active_route.as_mut() {
                route.annotation_refreshes += 1;
            }
            self.last_transition = Some(RouteTransition::AnnotationRefresh);
            info!(route_index, leg_index, "Annotations refreshed");
        } else {
            warn!(route_index, leg_index, "Engine rejected annotations");
        }
        accepted
    }
}

/// Advance `as_of` by `compensation_millis` when it is positive.
///
/// Zero or negative compensation leaves the instant unchanged. Overflow
/// saturates at the latest representable instant.
pub fn compensated_instant(as_of: DateTime<Utc>, compensation_millis: i64) -> DateTime<Utc> {
    if compensation_millis <= 0 {
        return as_of;
    }
    Duration::try_milliseconds(compensation_millis)
        .and_then(|lag| as_of.checked_add_signed(lag))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn require_payload(payload: &str, what: &str) -> Result<(), NavigationError> {
    if payload.trim().is_empty() {
        return Err(NavigationError::InvalidInput(format!("{} payload is empty", what)));
    }
    Ok(())
}

/// Concurrency-safe facade over one engine.
pub struct Navigator<E> {
    session: Mutex<Session<E>>,
    config: NavigatorConfig,
}

impl<E: Engine> Navigator<E> {
    /// Wrap `engine` with the default configuration.
    pub fn new(engine: E) -> Self {
        Self::with_config(engine, NavigatorConfig::default())
    }

    pub fn with_config(engine: E, config: NavigatorConfig) -> Self {
        Self {
            session: Mutex::new(Session {
                engine,
                active_route: None,
                last_transition: None,
            }),
            config,
        }
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    /// Install a route at `leg_index`.
    ///
    /// An empty payload is rejected without reaching the engine. If the engine
    /// answers `Invalid`, the previously applied route stays active.
    pub fn set_route(
        &self,
        payload: &str,
        route_index: u32,
        leg_index: u32,
    ) -> Result<NavigationStatus, NavigationError> {
        require_payload(payload, "route")?;
        debug!(route_index, leg_index, bytes = payload.len(), "set_route");

        let mut session = self.session.lock();
        let transition = route::classify_new_route(session.active_route.as_ref(), payload);
        Ok(session.set_route(payload, route_index, leg_index, transition))
    }

    /// Refresh leg annotations without replacing the route.
    ///
    /// Returns the engine's verdict unchanged.
    pub fn update_annotations(
        &self,
        payload: &str,
        route_index: u32,
        leg_index: u32,
    ) -> Result<bool, NavigationError> {
        require_payload(payload, "annotation")?;
        debug!(route_index, leg_index, "update_annotations");

        Ok(self
            .session
            .lock()
            .update_annotations(payload, route_index, leg_index))
    }

    /// Plan and dispatch a route update inside one critical section.
    pub fn apply_route_update(&self, update: &RouteUpdate) -> Result<RouteOutcome, NavigationError> {
        require_payload(&update.payload, "route update")?;

        let mut session = self.session.lock();
        let dispatch = route::plan(session.active_route.as_ref(), update);
        debug!(transition = %dispatch.transition(), "apply_route_update");

        let outcome = match dispatch {
            RouteDispatch::SetRoute {
                payload,
                leg_index,
                transition,
            } => {
                let status = session.set_route(payload, PRIMARY_ROUTE_INDEX, leg_index, transition);
                RouteOutcome {
                    transition,
                    accepted: status.route_state.is_valid(),
                    status: Some(status),
                }
            }
            RouteDispatch::UpdateAnnotations { payload, leg_index } => RouteOutcome {
                transition: RouteTransition::AnnotationRefresh,
                accepted: session.update_annotations(payload, PRIMARY_ROUTE_INDEX, leg_index),
                status: None,
            },
        };
        Ok(outcome)
    }

    /// Engine status at `as_of`, advanced by `compensation_millis` when positive.
    pub fn retrieve_status(&self, as_of: DateTime<Utc>, compensation_millis: i64) -> NavigationStatus {
        let at = compensated_instant(as_of, compensation_millis);
        debug!(%at, compensation_millis, "retrieve_status");
        self.session.lock().engine.get_status(at)
    }

    /// Translate a raw sample and hand it to the engine.
    ///
    /// Translation happens before the lock is taken.
    pub fn update_location(&self, sample: &PositionSample) {
        self.update_fix(fix::translate(sample));
    }

    /// Hand an already translated fix to the engine.
    pub fn update_fix(&self, fix: FixLocation) {
        debug!(coordinate = %fix.coordinate, "update_location");
        self.session.lock().engine.update_location(fix);
    }

    /// Move the active route to `leg_index`.
    pub fn update_leg_index(&self, leg_index: u32) -> NavigationStatus {
        debug!(leg_index, "update_leg_index");
        let mut session = self.session.lock();
        let status = session
            .engine
            .change_route_leg(PRIMARY_ROUTE_INDEX, leg_index);

        if status.route_state.is_valid() {
            if let Some(route) = session.active_route.as_mut() {
                route.leg_index = leg_index;
            }
            session.last_transition = Some(RouteTransition::LegChange);
            info!(leg_index, "Leg changed");
        } else {
            warn!(leg_index, "Engine rejected leg change");
        }
        status
    }

    /// The engine's accumulated history log.
    pub fn retrieve_history(&self) -> String {
        debug!("retrieve_history");
        self.session.lock().engine.get_history()
    }

    /// Enable or disable history capture.
    ///
    /// Toggling resets the log in either direction. Retrieve the log first if
    /// it is still needed.
    pub fn toggle_history(&self, enabled: bool) {
        debug!(enabled, "toggle_history");
        self.session.lock().engine.toggle_history(enabled);
    }

    /// Append a diagnostic event. Ignored by the engine while capture is off.
    ///
    /// The event is passed through unchanged; whether it is kept is the
    /// engine's decision.
    pub fn add_history_event(&self, event_type: &str, properties_json: &str) {
        debug!(event_type, "add_history_event");
        self.session
            .lock()
            .engine
            .push_history(event_type, properties_json);
    }

    pub fn retrieve_voice_instruction(&self, index: u32) -> Option<VoiceInstruction> {
        self.session.lock().engine.get_voice_instruction(index)
    }

    pub fn retrieve_banner_instruction(&self, index: u32) -> Option<BannerInstruction> {
        self.session.lock().engine.get_banner_instruction(index)
    }

    /// The route path as a `LineString`, or `None` without a route.
    pub fn retrieve_route_geometry(&self) -> Option<Geometry> {
        let coordinates = self.session.lock().engine.get_route_geometry();
        coordinates.map(line_geometry)
    }

    /// Polygon buffer around the route, built with [`NavigatorConfig::buffer`].
    ///
    /// `Ok(None)` when the engine has nothing to offer.
    pub fn retrieve_route_geometry_with_buffer(&self) -> Result<Option<Geometry>, NavigationError> {
        let BufferConfig {
            grid_size,
            dilation,
        } = self.config.buffer;
        let payload = self
            .session
            .lock()
            .engine
            .get_route_buffer_geojson(grid_size, dilation);

        payload
            .map(|json| geometry_from_geojson(&json).map_err(NavigationError::MalformedGeometry))
            .transpose()
    }

    /// The route last accepted by the engine.
    pub fn active_route(&self) -> Option<ActiveRoute> {
        self.session.lock().active_route.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let session = self.session.lock();
        SessionSnapshot {
            active_route: session.active_route.clone(),
            last_transition: session.last_transition,
        }
    }

    /// Consume the navigator and return its engine.
    pub fn into_engine(self) -> E {
        self.session.into_inner().engine
    }
}
