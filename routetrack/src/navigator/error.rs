//! Navigator error types.

use thiserror::Error;

/// Errors raised by the navigator itself.
///
/// An engine that declines a request is not an error: rejections surface as
/// [`crate::engine::RouteState::Invalid`], `false` or `None`.
#[derive(Debug, Error)]
pub enum NavigationError {
    /// A structurally unusable argument, rejected before reaching the engine.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The engine returned a buffer payload that is not a GeoJSON geometry.
    #[error("Malformed geometry from engine: {0}")]
    MalformedGeometry(#[source] serde_json::Error),
}
