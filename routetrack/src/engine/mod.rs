//! Tracking engine boundary.
//!
//! An [`Engine`] is a stateful, non-reentrant route-tracking core: it holds
//! the loaded route, the latest fix and its own history log. Every method
//! takes `&mut self`, so an engine can only be driven by one caller at a
//! time; [`crate::navigator::Navigator`] is the type that provides that
//! exclusion to concurrent callers.
//!
//! Rejections are not errors at this boundary. An engine that declines a
//! request answers with [`RouteState::Invalid`], `false` or `None`.
//!
//! [`BasicEngine`] is a small deterministic implementation used by the CLI
//! and the tests.

mod basic;
mod buffer;
mod history;
mod route_doc;
mod types;

pub use basic::{
    BasicEngine, BasicEngineConfig, DEFAULT_ARRIVAL_THRESHOLD_M, DEFAULT_OFF_ROUTE_THRESHOLD_M,
};
pub use buffer::route_buffer;
pub use history::{HistoryLog, HistoryRecord, HistoryRecorder, HistorySource};
pub use types::{
    BannerInstruction, BannerSection, FixLocation, NavigationStatus, RouteState, VoiceInstruction,
};

use chrono::{DateTime, Utc};

use crate::geometry::Coordinate;

/// A single-session route-tracking core.
pub trait Engine: Send {
    /// Load a route payload and position on `leg_index` of route `route_index`.
    fn set_route(&mut self, payload: &str, route_index: u32, leg_index: u32) -> NavigationStatus;

    /// Replace the annotation data of one leg. Returns whether it was accepted.
    fn update_annotations(&mut self, payload: &str, route_index: u32, leg_index: u32) -> bool;

    /// Best estimate of vehicle state at `at`.
    fn get_status(&mut self, at: DateTime<Utc>) -> NavigationStatus;

    /// Ingest one fix.
    fn update_location(&mut self, fix: FixLocation);

    /// Move to another leg of the loaded route.
    fn change_route_leg(&mut self, route_index: u32, leg_index: u32) -> NavigationStatus;

    /// The accumulated history log, serialized.
    fn get_history(&mut self) -> String;

    /// Enable or disable history capture. Resets the log.
    fn toggle_history(&mut self, enabled: bool);

    /// Append a caller-supplied event to the history log.
    fn push_history(&mut self, event_type: &str, properties_json: &str);

    fn get_voice_instruction(&mut self, index: u32) -> Option<VoiceInstruction>;

    fn get_banner_instruction(&mut self, index: u32) -> Option<BannerInstruction>;

    /// Coordinates of the loaded route.
    fn get_route_geometry(&mut self) -> Option<Vec<Coordinate>>;

    /// GeoJSON polygon buffering the loaded route.
    fn get_route_buffer_geojson(&mut self, grid_size: f32, dilation: u16) -> Option<String>;
}

impl<E: Engine + ?Sized> Engine for Box<E> {
    fn set_route(&mut self, payload: &str, route_index: u32, leg_index: u32) -> NavigationStatus {
        (**self).set_route(payload, route_index, leg_index)
    }

    fn update_annotations(&mut self, payload: &str, route_index: u32, leg_index: u32) -> bool {
        (**self).update_annotations(payload, route_index, leg_index)
    }

    fn get_status(&mut self, at: DateTime<Utc>) -> NavigationStatus {
        (**self).get_status(at)
    }

    fn update_location(&mut self, fix: FixLocation) {
        (**self).update_location(fix)
    }

    fn change_route_leg(&mut self, route_index: u32, leg_index: u32) -> NavigationStatus {
        (**self).change_route_leg(route_index, leg_index)
    }

    fn get_history(&mut self) -> String {
        (**self).get_history()
    }

    fn toggle_history(&mut self, enabled: bool) {
        (**self).toggle_history(enabled)
    }

    fn push_history(&mut self, event_type: &str, properties_json: &str) {
        (**self).push_history(event_type, properties_json)
    }

    fn get_voice_instruction(&mut self, index: u32) -> Option<VoiceInstruction> {
        (**self).get_voice_instruction(index)
    }

    fn get_banner_instruction(&mut self, index: u32) -> Option<BannerInstruction> {
        (**self).get_banner_instruction(index)
    }

    fn get_route_geometry(&mut self) -> Option<Vec<Coordinate>> {
        (**self).get_route_geometry()
    }

    fn get_route_buffer_geojson(&mut self, grid_size: f32, dilation: u16) -> Option<String> {
        (**self).get_route_buffer_geojson(grid_size, dilation)
    }
}
