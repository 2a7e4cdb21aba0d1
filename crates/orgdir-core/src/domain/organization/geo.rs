//! Geo encoding
//!
//! Converts caller-facing `(lat, lon)` pairs into the planar geometries the
//! store filters on, and back. Geometries use the spatial convention of
//! `x = longitude`, `y = latitude`, which is also the ordinate order of
//! their WKT form.

use std::fmt;

use crate::error::{Error, Result};

use super::entity::Coordinates;

/// Minimum number of distinct vertices a polygon needs
pub const MIN_POLYGON_POINTS: usize = 3;

/// A single point (`x` = longitude, `y` = latitude)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointGeometry {
    pub x: f64,
    pub y: f64,
}

/// Axis-aligned envelope of a geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

/// A polygon with a single closed outer ring
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonGeometry {
    /// Closed ring: the last point repeats the first
    ring: Vec<PointGeometry>,
}

/// Wrap a coordinate pair into a point geometry. No range validation.
pub fn encode_point(lat: f64, lon: f64) -> PointGeometry {
    PointGeometry { x: lon, y: lat }
}

/// Build a closed polygon from `(lat, lon)` pairs, keeping the caller's order
///
/// A ring that already repeats its first point is not closed a second time.
pub fn encode_polygon(points: &[(f64, f64)]) -> Result<PolygonGeometry> {
    let mut ring: Vec<PointGeometry> = Vec::with_capacity(points.len() + 1);

    for &(lat, lon) in points {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(Error::InvalidGeometry(format!(
                "polygon point ({}, {}) is not a finite coordinate",
                lat, lon
            )));
        }
        ring.push(encode_point(lat, lon));
    }

    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }

    let mut distinct: Vec<PointGeometry> = Vec::with_capacity(ring.len());
    for point in &ring {
        if !distinct.contains(point) {
            distinct.push(*point);
        }
    }

    if distinct.len() < MIN_POLYGON_POINTS {
        return Err(Error::InvalidGeometry(format!(
            "a polygon needs at least {} distinct points, got {}",
            MIN_POLYGON_POINTS,
            distinct.len()
        )));
    }

    ring.push(ring[0]);
    Ok(PolygonGeometry { ring })
}

impl PointGeometry {
    /// Build from stored ordinates
    pub fn from_xy(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Inverse of [`encode_point`]
    pub fn to_coordinates(self) -> Coordinates {
        Coordinates::new(self.y, self.x)
    }

    /// `POINT(lon lat)`
    pub fn to_wkt(&self) -> String {
        format!("POINT({} {})", self.x, self.y)
    }

    /// Parse `POINT(lon lat)`
    pub fn from_wkt(wkt: &str) -> Result<Self> {
        let body = strip_tagged(wkt, "POINT")?;
        let inner = strip_parens(body, wkt)?;
        parse_xy(inner, wkt)
    }
}

impl fmt::Display for PointGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wkt())
    }
}

impl PolygonGeometry {
    /// The closed ring, first point repeated at the end
    pub fn ring(&self) -> &[PointGeometry] {
        &self.ring
    }

    /// Number of vertices, not counting the closing point
    pub fn vertex_count(&self) -> usize {
        self.ring.len() - 1
    }

    /// Consecutive vertex pairs, including the closing edge
    pub fn edges(&self) -> impl Iterator<Item = (PointGeometry, PointGeometry)> + '_ {
        self.ring.windows(2).map(|pair| (pair[0], pair[1]))
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let first = self.ring[0];
        self.ring.iter().fold(
            BoundingBox {
                min_x: first.x,
                min_y: first.y,
                max_x: first.x,
                max_y: first.y,
            },
            |bbox, p| BoundingBox {
                min_x: bbox.min_x.min(p.x),
                min_y: bbox.min_y.min(p.y),
                max_x: bbox.max_x.max(p.x),
                max_y: bbox.max_y.max(p.y),
            },
        )
    }

    /// `POLYGON((lon lat, ..., lon lat))`
    pub fn to_wkt(&self) -> String {
        let ordinates: Vec<String> = self
            .ring
            .iter()
            .map(|p| format!("{} {}", p.x, p.y))
            .collect();
        format!("POLYGON(({}))", ordinates.join(", "))
    }

    /// Parse a single-ring `POLYGON((lon lat, ...))`
    pub fn from_wkt(wkt: &str) -> Result<Self> {
        let body = strip_tagged(wkt, "POLYGON")?;
        let rings = strip_parens(body, wkt)?;
        let ring = strip_parens(rings, wkt)?;

        if ring.contains('(') || ring.contains(')') {
            return Err(Error::InvalidGeometry(format!(
                "polygons with interior rings are not supported: {}",
                wkt
            )));
        }

        let points = ring
            .split(',')
            .map(|pair| parse_xy(pair, wkt).map(|p| (p.y, p.x)))
            .collect::<Result<Vec<_>>>()?;

        encode_polygon(&points)
    }
}

impl fmt::Display for PolygonGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wkt())
    }
}

fn strip_tagged<'a>(wkt: &'a str, tag: &str) -> Result<&'a str> {
    let trimmed = wkt.trim();
    match trimmed.get(..tag.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(tag) => Ok(trimmed[tag.len()..].trim()),
        _ => Err(Error::InvalidGeometry(format!("expected {} WKT, got: {}", tag, wkt))),
    }
}

fn strip_parens<'a>(body: &'a str, wkt: &str) -> Result<&'a str> {
    body.trim()
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .map(str::trim)
        .ok_or_else(|| Error::InvalidGeometry(format!("unbalanced parentheses in WKT: {}", wkt)))
}

fn parse_xy(pair: &str, wkt: &str) -> Result<PointGeometry> {
    let mut parts = pair.split_whitespace();
    let (Some(x), Some(y), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(Error::InvalidGeometry(format!(
            "expected 'x y' ordinates, got '{}' in {}",
            pair.trim(),
            wkt
        )));
    };

    let parse = |value: &str| {
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| Error::InvalidGeometry(format!("invalid ordinate '{}' in {}", value, wkt)))
    };

    Ok(PointGeometry::from_xy(parse(x)?, parse(y)?))
}
