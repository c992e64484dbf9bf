//! Geodesy helpers for route paths.
//!
//! Distances use a spherical earth. Projection of a point onto a path works in
//! a local equirectangular frame anchored at each segment start, which is
//! accurate to well under a metre for segment lengths typical of road
//! geometry.

use crate::geometry::Coordinate;

/// Mean earth radius in metres (IUGG).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Great-circle distance between two coordinates in metres.
pub fn haversine_m(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (to.longitude - from.longitude).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
}

/// Initial bearing from `from` to `to`.
///
/// Returns degrees in `[0, 360)`, where 0 = North, 90 = East.
pub fn bearing_deg(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let dlon = (to.longitude - from.longitude).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    normalize_bearing(y.atan2(x).to_degrees())
}

fn normalize_bearing(degrees: f64) -> f64 {
    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// Offset of `point` from `origin` in metres (east, north).
fn local_offset(origin: Coordinate, point: Coordinate) -> (f64, f64) {
    let cos_lat = origin.latitude.to_radians().cos();
    let east = (point.longitude - origin.longitude).to_radians() * EARTH_RADIUS_M * cos_lat;
    let north = (point.latitude - origin.latitude).to_radians() * EARTH_RADIUS_M;
    (east, north)
}

/// Interpolate between two coordinates at fraction `t`.
fn interpolate(from: Coordinate, to: Coordinate, t: f64) -> Coordinate {
    Coordinate::new(
        from.longitude + (to.longitude - from.longitude) * t,
        from.latitude + (to.latitude - from.latitude) * t,
    )
}

/// Result of projecting a point onto a [`Polyline`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathProjection {
    /// Distance from the path start to the matched point, in metres.
    pub along_m: f64,
    /// Distance from the input point to the matched point, in metres.
    pub offset_m: f64,
    /// Matched point on the path.
    pub point: Coordinate,
    /// Path bearing at the matched point; `None` on a degenerate path.
    pub bearing: Option<f64>,
}

/// A point located at some distance along a [`Polyline`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPoint {
    pub coordinate: Coordinate,
    pub bearing: Option<f64>,
}

/// An ordered path with precomputed cumulative distances.
#[derive(Debug, Clone, Default)]
pub struct Polyline {
    points: Vec<Coordinate>,
    /// `cumulative[i]` is the path distance from the start to `points[i]`.
    cumulative: Vec<f64>,
}

impl Polyline {
    /// Build a polyline. Consecutive duplicate points are kept but contribute
    /// zero length.
    pub fn new(points: Vec<Coordinate>) -> Self {
        let mut cumulative = Vec::with_capacity(points.len());
        let mut total = 0.0;
        for (i, point) in points.iter().enumerate() {
            if i > 0 {
                let (east, north) = local_offset(points[i - 1], *point);
                total += east.hypot(north);
            }
            cumulative.push(total);
        }
        Self { points, cumulative }
    }

    /// The path vertices.
    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Total path length in metres.
    pub fn length(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Path distance from the start to vertex `index`, clamped to the last vertex.
    pub fn distance_at(&self, index: usize) -> f64 {
        if self.cumulative.is_empty() {
            return 0.0;
        }
        self.cumulative[index.min(self.cumulative.len() - 1)]
    }

    /// Project `point` onto the nearest position of the path.
    ///
    /// Returns `None` for an empty path.
    pub fn project(&self, point: Coordinate) -> Option<PathProjection> {
        let first = *self.points.first()?;
        let mut best = PathProjection {
            along_m: 0.0,
            offset_m: haversine_m(point, first),
            point: first,
            bearing: None,
        };

        for (i, pair) in self.points.windows(2).enumerate() {
            let (start, end) = (pair[0], pair[1]);
            let (seg_e, seg_n) = local_offset(start, end);
            let seg_len_sq = seg_e * seg_e + seg_n * seg_n;
            if seg_len_sq == 0.0 {
                continue;
            }

            let (pt_e, pt_n) = local_offset(start, point);
            let t = ((pt_e * seg_e + pt_n * seg_n) / seg_len_sq).clamp(0.0, 1.0);
            let offset = (pt_e - seg_e * t).hypot(pt_n - seg_n * t);

            // Keep the first minimum so joints resolve to the earlier segment
            if best.bearing.is_none() || offset < best.offset_m {
                best = PathProjection {
                    along_m: self.cumulative[i] + seg_len_sq.sqrt() * t,
                    offset_m: offset,
                    point: interpolate(start, end, t),
                    bearing: Some(bearing_deg(start, end)),
                };
            }
        }

        Some(best)
    }

    /// Locate the point `along_m` metres from the path start.
    ///
    /// Distances outside the path are clamped to its ends. Returns `None` for
    /// an empty path.
    pub fn locate(&self, along_m: f64) -> Option<PathPoint> {
        let first = *self.points.first()?;
        let target = along_m.clamp(0.0, self.length());

        let mut last_bearing = None;
        for (i, pair) in self.points.windows(2).enumerate() {
            let (start, end) = (pair[0], pair[1]);
            let seg_start = self.cumulative[i];
            let seg_len = self.cumulative[i + 1] - seg_start;
            if seg_len == 0.0 {
                continue;
            }
            let bearing = Some(bearing_deg(start, end));
            if target <= self.cumulative[i + 1] {
                let t = (target - seg_start) / seg_len;
                return Some(PathPoint {
                    coordinate: interpolate(start, end, t),
                    bearing,
                });
            }
            last_bearing = bearing;
        }

        // Degenerate path, or rounding left the target past the final vertex
        let coordinate = self.points.last().copied().unwrap_or(first);
        Some(PathPoint {
            coordinate,
            bearing: last_bearing,
        })
    }
}
