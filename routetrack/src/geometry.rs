//! GeoJSON geometry values.
//!
//! These types are shared by the engine boundary (route geometry, buffered
//! route polygons) and the status projections handed to callers. They
//! serialize to and from standard GeoJSON geometry objects, so a geometry
//! produced here can be written straight into a `.geojson` file.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A WGS84 position in degrees.
///
/// Serialized in GeoJSON `[longitude, latitude]` order. Positions carrying a
/// third (altitude) element are accepted on input; the altitude is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "[f64; 2]")]
pub struct Coordinate {
    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,
    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,
}

impl Coordinate {
    /// Create a coordinate from longitude and latitude (GeoJSON order).
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// True for a finite position inside the WGS84 longitude and latitude
    /// ranges.
    pub fn is_wgs84(&self) -> bool {
        (-180.0..=180.0).contains(&self.longitude) && (-90.0..=90.0).contains(&self.latitude)
    }
}

impl TryFrom<Vec<f64>> for Coordinate {
    type Error = InvalidPosition;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        match values.as_slice() {
            [longitude, latitude, ..] => Ok(Self::new(*longitude, *latitude)),
            _ => Err(InvalidPosition(values.len())),
        }
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(coordinate: Coordinate) -> Self {
        [coordinate.longitude, coordinate.latitude]
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.longitude, self.latitude)
    }
}

/// A GeoJSON position with fewer than two elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidPosition(usize);

impl fmt::Display for InvalidPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GeoJSON position needs at least 2 elements, found {}",
            self.0
        )
    }
}

impl std::error::Error for InvalidPosition {}

/// A GeoJSON geometry object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        coordinates: Coordinate,
    },
    MultiPoint {
        coordinates: Vec<Coordinate>,
    },
    LineString {
        coordinates: Vec<Coordinate>,
    },
    MultiLineString {
        coordinates: Vec<Vec<Coordinate>>,
    },
    Polygon {
        coordinates: Vec<Vec<Coordinate>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Coordinate>>>,
    },
    GeometryCollection {
        geometries: Vec<Geometry>,
    },
}

impl Geometry {
    /// The GeoJSON type name of this geometry.
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point { .. } => "Point",
            Geometry::MultiPoint { .. } => "MultiPoint",
            Geometry::LineString { .. } => "LineString",
            Geometry::MultiLineString { .. } => "MultiLineString",
            Geometry::Polygon { .. } => "Polygon",
            Geometry::MultiPolygon { .. } => "MultiPolygon",
            Geometry::GeometryCollection { .. } => "GeometryCollection",
        }
    }

    /// Total number of positions in the geometry, nested members included.
    pub fn coordinate_count(&self) -> usize {
        match self {
            Geometry::Point { .. } => 1,
            Geometry::MultiPoint { coordinates } | Geometry::LineString { coordinates } => {
                coordinates.len()
            }
            Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
                coordinates.iter().map(Vec::len).sum()
            }
            Geometry::MultiPolygon { coordinates } => coordinates
                .iter()
                .flat_map(|polygon| polygon.iter())
                .map(Vec::len)
                .sum(),
            Geometry::GeometryCollection { geometries } => {
                geometries.iter().map(Geometry::coordinate_count).sum()
            }
        }
    }

    /// True when the geometry holds no positions (an empty, not absent, geometry).
    pub fn is_empty(&self) -> bool {
        self.coordinate_count() == 0
    }
}
