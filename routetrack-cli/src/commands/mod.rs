//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration inspection (list, path)
//! - [`geometry`] - Route geometry and route buffer as GeoJSON
//! - [`status`] - Replay position fixes against a route

pub mod common;
pub mod config;
pub mod geometry;
pub mod status;
