//! Route update classification.
//!
//! Decides whether an incoming route change replaces the active route or only
//! amends its annotations, and which engine call carries it. The coordinator
//! is pure: the active route lives in the navigator session and is passed in.

use std::fmt;
use std::sync::Arc;

use crate::engine::NavigationStatus;

/// The route currently applied to a navigation session.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveRoute {
    /// The route payload as last accepted by the engine.
    pub payload: Arc<str>,
    pub route_index: u32,
    pub leg_index: u32,
    /// Number of accepted annotation refreshes since the route was set.
    pub annotation_refreshes: u32,
}

impl ActiveRoute {
    pub fn new(payload: impl Into<Arc<str>>, route_index: u32, leg_index: u32) -> Self {
        Self {
            payload: payload.into(),
            route_index,
            leg_index,
            annotation_refreshes: 0,
        }
    }
}

/// How an incoming payload relates to the active route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteUpdateKind {
    /// A complete route description.
    NewRoute,
    /// Leg annotation data for the active route.
    RefreshAnnotations,
}

/// An incoming route or annotation change.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteUpdate {
    pub payload: String,
    pub kind: RouteUpdateKind,
    pub leg_index: u32,
}

impl RouteUpdate {
    /// A fresh route, starting at the first leg.
    pub fn new_route(payload: impl Into<String>) -> Self {
        Self::new_route_at_leg(payload, 0)
    }

    /// A fresh route, starting at `leg_index`.
    pub fn new_route_at_leg(payload: impl Into<String>, leg_index: u32) -> Self {
        Self {
            payload: payload.into(),
            kind: RouteUpdateKind::NewRoute,
            leg_index,
        }
    }

    /// Annotation data for leg `leg_index` of the active route.
    pub fn refresh_annotations(payload: impl Into<String>, leg_index: u32) -> Self {
        Self {
            payload: payload.into(),
            kind: RouteUpdateKind::RefreshAnnotations,
            leg_index,
        }
    }
}

/// Kind of change a session went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTransition {
    /// A different route replaced the active one (or the first route was set).
    NewRoute,
    /// The active route was re-applied in place.
    Reroute,
    /// Annotation data of the active route was refreshed.
    AnnotationRefresh,
    /// Only the leg pointer moved.
    LegChange,
}

impl fmt::Display for RouteTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteTransition::NewRoute => write!(f, "new route"),
            RouteTransition::Reroute => write!(f, "reroute"),
            RouteTransition::AnnotationRefresh => write!(f, "annotation refresh"),
            RouteTransition::LegChange => write!(f, "leg change"),
        }
    }
}

/// The engine call an update maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDispatch<'a> {
    SetRoute {
        payload: &'a str,
        leg_index: u32,
        transition: RouteTransition,
    },
    UpdateAnnotations {
        payload: &'a str,
        leg_index: u32,
    },
}

impl RouteDispatch<'_> {
    pub fn transition(&self) -> RouteTransition {
        match self {
            RouteDispatch::SetRoute { transition, .. } => *transition,
            RouteDispatch::UpdateAnnotations { .. } => RouteTransition::AnnotationRefresh,
        }
    }
}

/// Result of applying a [`RouteUpdate`] through the navigator.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteOutcome {
    pub transition: RouteTransition,
    /// Status reported by `set_route`; `None` for annotation refreshes.
    pub status: Option<NavigationStatus>,
    /// Whether the engine accepted the update.
    pub accepted: bool,
}

/// Classify a fresh route payload against the active route.
pub fn classify_new_route(active: Option<&ActiveRoute>, payload: &str) -> RouteTransition {
    match active {
        Some(route) if &*route.payload == payload => RouteTransition::Reroute,
        _ => RouteTransition::NewRoute,
    }
}

/// Decide how `update` is dispatched given the active route.
///
/// Leg indices are passed through unchanged; the engine judges their range.
pub fn plan<'a>(active: Option<&ActiveRoute>, update: &'a RouteUpdate) -> RouteDispatch<'a> {
    match update.kind {
        RouteUpdateKind::NewRoute => RouteDispatch::SetRoute {
            payload: &update.payload,
            leg_index: update.leg_index,
            transition: classify_new_route(active, &update.payload),
        },
        RouteUpdateKind::RefreshAnnotations => RouteDispatch::UpdateAnnotations {
            payload: &update.payload,
            leg_index: update.leg_index,
        },
    }
}
