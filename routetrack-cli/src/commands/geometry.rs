//! Print the active route's geometry, or its buffer, as GeoJSON.
//!
//! Prints `null` when the engine has no geometry to offer.

use std::path::PathBuf;

use clap::Args;
use routetrack::config::ConfigFile;
use routetrack::engine::Engine;
use routetrack::geometry::Geometry;
use routetrack::navigator::Navigator;

use super::common::{build_navigator, load_route};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct GeometryArgs {
    /// Route JSON: a route object or a directions response
    #[arg(long)]
    pub route: PathBuf,

    /// Print the route buffer polygon instead of the route line
    #[arg(long)]
    pub buffer: bool,
}

pub fn run(args: GeometryArgs, config: &ConfigFile) -> Result<(), CliError> {
    let navigator = build_navigator(config);
    load_route(&navigator, &args.route, 0)?;

    let geometry = select_geometry(&navigator, args.buffer)?;
    let output = serde_json::to_string(&geometry).unwrap_or_else(|_| "null".to_string());
    println!("{}", output);
    Ok(())
}

fn select_geometry<E: Engine>(
    navigator: &Navigator<E>,
    buffer: bool,
) -> Result<Option<Geometry>, CliError> {
    if buffer {
        let config = navigator.config().buffer;
        tracing::info!(
            grid_size = config.grid_size,
            dilation = config.dilation,
            "Computing route buffer"
        );
        Ok(navigator.retrieve_route_geometry_with_buffer()?)
    } else {
        Ok(navigator.retrieve_route_geometry())
    }
}
