//! Geographic primitives.
//!
//! Coordinates are WGS84 longitude/latitude pairs. Distances between points
//! are haversine distances; projections of a point onto a street line are
//! done in a local equirectangular frame centred on the point, which is
//! accurate enough at linking distances (hundreds of meters).

use std::fmt;

use geo::{
    BoundingRect, Closest, ClosestPoint, Coord, Distance, Haversine, LineString, MapCoords, Point,
    Polygon, Rect,
};
use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Mean earth radius in meters, as used by [`Haversine`].
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Meters spanned by one degree of latitude.
pub const METERS_PER_DEGREE_LAT: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

/// A point on the earth, `x` is longitude and `y` is latitude.
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    /// Create a coordinate from longitude and latitude.
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { x: lon, y: lat }
    }

    /// Create a coordinate, rejecting values outside the valid WGS84 range.
    pub fn checked(lon: f64, lat: f64) -> Result<Self, DomainError> {
        if !lon.is_finite() || !lat.is_finite() || lon.abs() > 180.0 || lat.abs() > 90.0 {
            return Err(DomainError::InvalidCoordinate { lon, lat });
        }
        Ok(Self::new(lon, lat))
    }

    pub fn lon(&self) -> f64 {
        self.x
    }

    pub fn lat(&self) -> f64 {
        self.y
    }

    /// Great-circle distance to another coordinate, in meters.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        haversine_m(self, other)
    }

    /// Initial bearing towards another coordinate, in degrees clockwise from north.
    pub fn azimuth_to(&self, other: &Coordinate) -> f64 {
        let lat1 = self.y.to_radians();
        let lat2 = other.y.to_radians();
        let dlon = (other.x - self.x).to_radians();
        let y = dlon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
        y.atan2(x).to_degrees()
    }
}

impl fmt::Debug for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<Coordinate> for Coord<f64> {
    fn from(c: Coordinate) -> Self {
        Coord { x: c.x, y: c.y }
    }
}

impl From<Coordinate> for Point<f64> {
    fn from(c: Coordinate) -> Self {
        Point::new(c.x, c.y)
    }
}

impl From<Coord<f64>> for Coordinate {
    fn from(c: Coord<f64>) -> Self {
        Coordinate::new(c.x, c.y)
    }
}

/// Haversine distance between two coordinates, in meters.
pub fn haversine_m(a: &Coordinate, b: &Coordinate) -> f64 {
    Haversine::distance(Point::from(*a), Point::from(*b))
}

/// Meters spanned by one degree of longitude at the given latitude.
pub fn meters_per_degree_lon(lat: f64) -> f64 {
    METERS_PER_DEGREE_LAT * lat.to_radians().cos()
}

/// Length of a line in meters.
pub fn polyline_length_m(line: &LineString<f64>) -> f64 {
    line.lines()
        .map(|l| Haversine::distance(l.start_point(), l.end_point()))
        .sum()
}

/// Bounding box of a line, `None` when it has no points.
pub fn bounding_box(line: &LineString<f64>) -> Option<Rect<f64>> {
    line.bounding_rect()
}

/// A polygon without holes from a ring of coordinates. The ring is closed
/// if it is not already.
pub fn polygon(ring: &[Coordinate]) -> Polygon<f64> {
    Polygon::new(ring.iter().copied().collect(), Vec::new())
}

/// The closest point on a line to some query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Index of the segment (pair of consecutive points) holding the closest point.
    pub segment: usize,
    /// Position of the closest point within that segment, in `[0, 1]`.
    pub segment_fraction: f64,
    /// The closest point itself.
    pub point: Coordinate,
    /// Distance from the query point to the closest point, in meters.
    pub distance_m: f64,
    /// Distance along the line from its start to the closest point, in meters.
    pub along_m: f64,
    /// `along_m` divided by the total line length (0 for degenerate lines).
    pub fraction: f64,
}

/// Project a point onto a line.
///
/// Returns `None` for lines with fewer than two points. When two segments
/// are exactly equally close the earlier one wins, so the result depends
/// only on the geometry.
pub fn project_onto_polyline(point: &Coordinate, line: &LineString<f64>) -> Option<Projection> {
    if line.0.len() < 2 {
        return None;
    }

    let xs = meters_per_degree_lon(point.y);
    let ys = METERS_PER_DEGREE_LAT;
    let origin = *point;
    // Meters east and north of the query point
    let local = line.map_coords(move |c| Coord {
        x: (c.x - origin.x) * xs,
        y: (c.y - origin.y) * ys,
    });
    let here = Point::new(0.0, 0.0);

    let mut best: Option<Projection> = None;
    let mut along = 0.0;

    for (i, segment) in local.lines().enumerate() {
        let closest = match segment.closest_point(&here) {
            Closest::Intersection(p) | Closest::SinglePoint(p) => p,
            Closest::Indeterminate => segment.start_point(),
        };
        let distance = closest.x().hypot(closest.y());
        let seg_len = segment.dx().hypot(segment.dy());
        let into = closest.0 - segment.start;
        let into_len = into.x.hypot(into.y);

        if best.is_none_or(|b| distance < b.distance_m) {
            best = Some(Projection {
                segment: i,
                segment_fraction: if seg_len > 0.0 {
                    (into_len / seg_len).clamp(0.0, 1.0)
                } else {
                    0.0
                },
                point: Coordinate::new(point.x + closest.x() / xs, point.y + closest.y() / ys),
                distance_m: distance,
                along_m: along + into_len,
                fraction: 0.0,
            });
        }
        along += seg_len;
    }

    best.map(|mut p| {
        p.fraction = if along > 0.0 { p.along_m / along } else { 0.0 };
        p
    })
}

/// Split a line at a projected point, returning both halves.
///
/// Both halves contain the split point, so together they cover the whole
/// line.
pub fn split_polyline(line: &LineString<f64>, at: &Projection) -> (LineString<f64>, LineString<f64>) {
    let mut head: Vec<Coord<f64>> = line.0[..=at.segment].to_vec();
    head.push(at.point.into());
    let mut tail: Vec<Coord<f64>> = vec![at.point.into()];
    tail.extend_from_slice(&line.0[at.segment + 1..]);
    (LineString::new(head), LineString::new(tail))
}
