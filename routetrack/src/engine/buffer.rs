//! Grid-based route buffer.
//!
//! The route is rasterised onto a lattice of `grid_size`-degree cells, the
//! occupied cells are dilated by `dilation` cells in every direction, and each
//! lattice row is merged into horizontal runs. Every run becomes one
//! rectangular polygon of the resulting `MultiPolygon`.

use std::collections::BTreeSet;

use crate::geometry::{Coordinate, Geometry};

/// Upper bound on lattice cells, reached only with a grid far finer than the
/// route warrants.
const MAX_CELLS: usize = 4_000_000;

/// Largest lattice index magnitude. Indices stay exact in `f64` and leave
/// headroom for dilation and ring corners in `i64`.
const MAX_CELL_INDEX: f64 = (1u64 << 52) as f64;

/// Lattice cell as (row, column) = (floor(lat / grid), floor(lon / grid)).
type Cell = (i64, i64);

fn lattice_index(value: f64, grid: f64) -> Option<i64> {
    let index = (value / grid).floor();
    (index.is_finite() && index.abs() <= MAX_CELL_INDEX).then_some(index as i64)
}

fn cell_of(point: Coordinate, grid: f64) -> Option<Cell> {
    Some((
        lattice_index(point.latitude, grid)?,
        lattice_index(point.longitude, grid)?,
    ))
}

/// Cells touched by the path, sampling each segment at half-cell spacing.
fn rasterise(coordinates: &[Coordinate], grid: f64) -> Option<BTreeSet<Cell>> {
    let mut cells = BTreeSet::new();
    if let [only] = coordinates {
        cells.insert(cell_of(*only, grid)?);
        return Some(cells);
    }

    let step = grid / 2.0;
    for pair in coordinates.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let dx = b.longitude - a.longitude;
        let dy = b.latitude - a.latitude;
        let samples = (dx.abs().max(dy.abs()) / step).ceil().max(1.0);
        if !samples.is_finite() || samples > MAX_CELLS as f64 {
            return None;
        }
        let samples = samples as usize;
        for k in 0..=samples {
            let t = k as f64 / samples as f64;
            let point = Coordinate::new(a.longitude + dx * t, a.latitude + dy * t);
            cells.insert(cell_of(point, grid)?);
        }
        if cells.len() > MAX_CELLS {
            return None;
        }
    }
    Some(cells)
}

fn dilate(cells: &BTreeSet<Cell>, dilation: i64) -> Option<BTreeSet<Cell>> {
    let side = (2 * dilation + 1) as usize;
    if cells.len().saturating_mul(side.saturating_mul(side)) > MAX_CELLS {
        return None;
    }
    let mut dilated = BTreeSet::new();
    for &(row, col) in cells {
        for dr in -dilation..=dilation {
            for dc in -dilation..=dilation {
                dilated.insert((row.checked_add(dr)?, col.checked_add(dc)?));
            }
        }
    }
    Some(dilated)
}

/// Merge ordered cells into (row, first column, last column) runs.
fn row_runs(cells: &BTreeSet<Cell>) -> Vec<(i64, i64, i64)> {
    let mut runs: Vec<(i64, i64, i64)> = Vec::new();
    for &(row, col) in cells {
        match runs.last_mut() {
            Some((run_row, _, end)) if *run_row == row && *end + 1 == col => *end = col,
            _ => runs.push((row, col, col)),
        }
    }
    runs
}

/// Closed ring SW, SE, NE, NW, SW for one run.
fn run_ring(row: i64, first: i64, last: i64, grid: f64) -> Vec<Coordinate> {
    let west = first as f64 * grid;
    let east = (last + 1) as f64 * grid;
    let south = row as f64 * grid;
    let north = (row + 1) as f64 * grid;
    vec![
        Coordinate::new(west, south),
        Coordinate::new(east, south),
        Coordinate::new(east, north),
        Coordinate::new(west, north),
        Coordinate::new(west, south),
    ]
}

/// Build the buffer polygon for a route path.
///
/// Returns `None` for an empty path, a grid size that is not a positive
/// finite number, a non-finite coordinate, or a lattice too large to build.
pub fn route_buffer(coordinates: &[Coordinate], grid_size: f64, dilation: u16) -> Option<Geometry> {
    if coordinates.is_empty() || !grid_size.is_finite() || grid_size <= 0.0 {
        return None;
    }

    let cells = rasterise(coordinates, grid_size)?;
    let cells = dilate(&cells, i64::from(dilation))?;
    let polygons = row_runs(&cells)
        .into_iter()
        .map(|(row, first, last)| vec![run_ring(row, first, last, grid_size)])
        .collect();

    Some(Geometry::MultiPolygon {
        coordinates: polygons,
    })
}
