//! RouteTrack - serialized access to a stateful route-tracking engine
//!
//! A tracking engine consumes a vehicle's position stream and an active route
//! and answers "where am I on this route". Engines are not safe for concurrent
//! use; this library puts one behind a [`navigator::Navigator`], which runs
//! every call under a single session lock and translates between the
//! caller's representations (raw position samples, wall-clock instants,
//! route JSON, GeoJSON geometry) and the engine's.
//!
//! - [`fix`] translates raw position samples into engine fixes
//! - [`route`] classifies route and annotation updates
//! - [`navigator`] is the synchronized facade
//! - [`projection`] derives snapped locations and geometries from results
//! - [`free_drive`] polls for enhanced locations when no route is followed
//! - [`engine`] defines the engine boundary and a reference engine

pub mod config;
pub mod engine;
pub mod fix;
pub mod free_drive;
pub mod geo;
pub mod geometry;
pub mod logging;
pub mod navigator;
pub mod projection;
pub mod route;
