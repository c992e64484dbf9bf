//! Replay recorded position fixes against a route.
//!
//! Prints one JSON object per fix: the engine's route state and progress,
//! plus the location snapped onto the route.

use std::path::{Path, PathBuf};

use clap::Args;
use routetrack::config::ConfigFile;
use routetrack::engine::Engine;
use routetrack::fix::{self, PositionSample};
use routetrack::navigator::Navigator;
use routetrack::projection::{project_snapped_location, Location};
use serde_json::{json, Value};
use tracing::info;

use super::common::{build_navigator, load_route, read_json, write_file};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Route JSON: a route object or a directions response
    #[arg(long)]
    pub route: PathBuf,

    /// JSON array of position samples, in capture order
    #[arg(long)]
    pub fixes: PathBuf,

    /// Leg to start tracking on
    #[arg(long, default_value_t = 0)]
    pub leg: u32,

    /// Status lag compensation in milliseconds (default from config)
    #[arg(long, allow_negative_numbers = true)]
    pub lag_ms: Option<i64>,

    /// Write the engine's history recording here after the replay
    #[arg(long)]
    pub history: Option<PathBuf>,
}

pub fn run(args: StatusArgs, config: &ConfigFile) -> Result<(), CliError> {
    let navigator = build_navigator(config);
    navigator.toggle_history(true);

    load_route(&navigator, &args.route, args.leg)?;

    let samples: Vec<PositionSample> = read_json(&args.fixes)?;
    let lag_ms = args.lag_ms.unwrap_or_else(|| config.status_lag_millis());
    info!(fixes = samples.len(), lag_ms, "Replaying fixes");

    for line in replay(&navigator, &samples, lag_ms) {
        println!("{}", line);
    }

    if let Some(path) = args.history {
        write_history(&navigator, &path)?;
    }
    Ok(())
}

/// Feed each sample to the navigator and report the status that follows it.
///
/// Fixes are stamped with their capture time so the replay runs on recorded
/// time. Status is taken at that time, advanced by `lag_ms`.
pub fn replay<E: Engine>(
    navigator: &Navigator<E>,
    samples: &[PositionSample],
    lag_ms: i64,
) -> Vec<Value> {
    samples
        .iter()
        .map(|sample| {
            navigator.update_fix(fix::translate_at(sample, sample.captured_at));
            let status = navigator.retrieve_status(sample.captured_at, lag_ms);
            let snapped = project_snapped_location(&status, &Location::from(sample));
            json!({
                "routeState": status.route_state,
                "legIndex": status.leg_index,
                "stepIndex": status.step_index,
                "remainingLegDistance": status.remaining_leg_distance,
                "remainingLegDuration": status.remaining_leg_duration,
                "location": snapped,
            })
        })
        .collect()
}

fn write_history<E: Engine>(navigator: &Navigator<E>, path: &Path) -> Result<(), CliError> {
    write_file(path, &navigator.retrieve_history())?;
    info!(path = %path.display(), "History written");
    Ok(())
}
