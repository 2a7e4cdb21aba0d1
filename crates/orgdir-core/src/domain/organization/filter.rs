//! Organization search filters
//!
//! The flat, caller-facing set of optional filters, and the validation that
//! turns it into an [`OrganizationQuery`] the composer can run.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::geo::{self, MIN_POLYGON_POINTS, PolygonGeometry};
use super::query::OrganizationQuery;

/// Optional search filters, combined with AND
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganizationFilter {
    pub building_id: Option<i64>,
    pub industry_id: Option<i64>,
    /// Case-insensitive substring of the organization name
    pub organization_name: Option<String>,
    /// Case-insensitive substring of the industry name or one of its ancestors
    pub industry_name: Option<String>,
    /// Case-insensitive substring of the building address
    pub address: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Polygon vertices as `(lat, lon)` pairs
    pub polygon: Option<Vec<(f64, f64)>>,
    /// Polygon as `POLYGON((lon lat, ...))`
    pub polygon_wkt: Option<String>,
}

impl OrganizationFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_building_id(mut self, building_id: i64) -> Self {
        self.building_id = Some(building_id);
        self
    }

    pub fn with_industry_id(mut self, industry_id: i64) -> Self {
        self.industry_id = Some(industry_id);
        self
    }

    pub fn with_organization_name(mut self, name: impl Into<String>) -> Self {
        self.organization_name = Some(name.into());
        self
    }

    pub fn with_industry_name(mut self, name: impl Into<String>) -> Self {
        self.industry_name = Some(name.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_point(mut self, lat: f64, lon: f64) -> Self {
        self.lat = Some(lat);
        self.lon = Some(lon);
        self
    }

    pub fn with_polygon(mut self, points: Vec<(f64, f64)>) -> Self {
        self.polygon = Some(points);
        self
    }

    pub fn with_polygon_wkt(mut self, wkt: impl Into<String>) -> Self {
        self.polygon_wkt = Some(wkt.into());
        self
    }

    /// True when no filter dimension is set
    pub fn is_empty(&self) -> bool {
        self.building_id.is_none()
            && self.industry_id.is_none()
            && self.organization_name.is_none()
            && self.industry_name.is_none()
            && self.address.is_none()
            && self.lat.is_none()
            && self.lon.is_none()
            && self.polygon.is_none()
            && self.polygon_wkt.is_none()
    }

    fn has_point(&self) -> bool {
        self.lat.is_some() && self.lon.is_some()
    }

    fn has_polygon(&self) -> bool {
        self.polygon.is_some() || self.polygon_wkt.is_some()
    }

    /// Check that the filters can be combined
    ///
    /// Rules:
    /// - `lat` and `lon` come together or not at all
    /// - a point and a polygon are mutually exclusive
    /// - a polygon is given either as points or as WKT, not both
    /// - a polygon point list has at least 3 points
    pub fn validate(&self) -> Result<()> {
        if self.lat.is_some() != self.lon.is_some() {
            return Err(Error::InvalidFilterCombination(
                "both lat and lon must be provided together, or neither".to_string(),
            ));
        }

        if self.has_point() && self.has_polygon() {
            return Err(Error::InvalidFilterCombination(
                "cannot use both point-based (lat/lon) and polygon-based filters together"
                    .to_string(),
            ));
        }

        if self.polygon.is_some() && self.polygon_wkt.is_some() {
            return Err(Error::InvalidFilterCombination(
                "use either polygon points or polygon_wkt, not both".to_string(),
            ));
        }

        if let (Some(lat), Some(lon)) = (self.lat, self.lon) {
            if !lat.is_finite() || !lon.is_finite() {
                return Err(Error::InvalidGeometry(format!(
                    "point ({}, {}) is not a finite coordinate",
                    lat, lon
                )));
            }
        }

        if let Some(points) = &self.polygon {
            if points.len() < MIN_POLYGON_POINTS {
                return Err(Error::InvalidGeometry(format!(
                    "a polygon must contain at least {} points, got {}",
                    MIN_POLYGON_POINTS,
                    points.len()
                )));
            }
        }

        Ok(())
    }

    /// Validate and encode geo filters into a composable query
    pub fn into_query(self, proximity_degrees: f64) -> Result<OrganizationQuery> {
        self.validate()?;

        let point = match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(geo::encode_point(lat, lon)),
            _ => None,
        };

        let polygon = match (&self.polygon, &self.polygon_wkt) {
            (Some(points), _) => Some(geo::encode_polygon(points)?),
            (None, Some(wkt)) => Some(PolygonGeometry::from_wkt(wkt)?),
            (None, None) => None,
        };

        Ok(OrganizationQuery {
            building_id: self.building_id,
            industry_id: self.industry_id,
            organization_name: self.organization_name,
            industry_name: self.industry_name,
            address: self.address,
            point,
            polygon,
            proximity_degrees,
        })
    }
}

/// Parse a `lat,lon` pair as used for polygon points on the command line and in URLs
pub fn parse_lat_lon(value: &str) -> Result<(f64, f64)> {
    let invalid = || Error::InvalidGeometry(format!("expected 'lat,lon', got '{}'", value));

    let (lat, lon) = value.split_once(',').ok_or_else(invalid)?;
    let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
    let lon: f64 = lon.trim().parse().map_err(|_| invalid())?;

    if !lat.is_finite() || !lon.is_finite() {
        return Err(invalid());
    }

    Ok((lat, lon))
}
