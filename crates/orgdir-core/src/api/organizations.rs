//! Organization handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::domain::organization::{
    Organization, OrganizationFilter, PageRequest, PaginatedResult, parse_lat_lon,
};

use super::{ApiError, AppState};

/// Parsed list-endpoint parameters
#[derive(Debug, Default, PartialEq)]
pub struct SearchParams {
    pub filter: OrganizationFilter,
    pub page: Option<u32>,
    pub items_per_page: Option<u32>,
}

impl SearchParams {
    /// Parse raw `key=value` pairs
    ///
    /// `polygon` may repeat, once per `lat,lon` vertex. Every other key may
    /// appear at most once. Unknown keys are rejected.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self, ApiError> {
        let mut params = SearchParams::default();
        let mut seen: Vec<String> = Vec::new();

        for (key, value) in pairs {
            if key != "polygon" {
                if seen.contains(&key) {
                    return Err(ApiError::invalid_parameter(format!(
                        "query parameter '{}' given more than once",
                        key
                    )));
                }
                seen.push(key.clone());
            }

            let filter = &mut params.filter;
            match key.as_str() {
                "building_id" => filter.building_id = Some(parse_number(&key, &value)?),
                "industry_id" => filter.industry_id = Some(parse_number(&key, &value)?),
                "organization_name" => filter.organization_name = Some(value),
                "industry_name" => filter.industry_name = Some(value),
                "address" => filter.address = Some(value),
                "lat" => filter.lat = Some(parse_number(&key, &value)?),
                "lon" => filter.lon = Some(parse_number(&key, &value)?),
                "polygon" => filter
                    .polygon
                    .get_or_insert_with(Vec::new)
                    .push(parse_lat_lon(&value)?),
                "polygon_wkt" => filter.polygon_wkt = Some(value),
                "page" => params.page = Some(parse_number(&key, &value)?),
                "items_per_page" => params.items_per_page = Some(parse_number(&key, &value)?),
                _ => {
                    return Err(ApiError::invalid_parameter(format!(
                        "unknown query parameter '{}'",
                        key
                    )));
                }
            }
        }

        Ok(params)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ApiError> {
    value.trim().parse().map_err(|_| {
        ApiError::invalid_parameter(format!("invalid value '{}' for '{}'", value, key))
    })
}

/// List organizations matching the query parameters
///
/// # Query Parameters
/// - `building_id`, `industry_id`: exact ids
/// - `organization_name`, `industry_name`, `address`: case-insensitive substrings
/// - `lat` + `lon`: buildings near a point
/// - `polygon=<lat,lon>` (repeated) or `polygon_wkt`: buildings inside a polygon
/// - `page` (default 1), `items_per_page` (default from configuration)
///
/// # Errors
/// - 422 Unprocessable Entity: unknown or malformed parameters, illegal filter combination
pub async fn list_organizations(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<PaginatedResult<Organization>>, ApiError> {
    let params = SearchParams::from_pairs(pairs)?;
    let page = PageRequest::new(
        params.page.unwrap_or(1),
        params
            .items_per_page
            .unwrap_or(state.service.settings().default_items_per_page),
    );

    let result = state
        .service
        .find_organizations(params.filter, page)
        .await?;

    Ok(Json(result))
}

/// Get one organization by id
///
/// # Errors
/// - 404 Not Found: no organization has this id
/// - 422 Unprocessable Entity: the id is not an integer
pub async fn get_organization(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Organization>, ApiError> {
    let id: i64 = parse_number("id", &id)?;

    let organization = state
        .service
        .find_organization_by_id(id)
        .await?
        .ok_or(crate::error::Error::OrganizationNotFound(id))?;

    Ok(Json(organization))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_from_pairs_collects_polygon_points() {
        let params = SearchParams::from_pairs(pairs(&[
            ("polygon", "0,0"),
            ("polygon", "0,1"),
            ("polygon", "1,1"),
            ("organization_name", "cafe"),
            ("page", "2"),
        ]))
        .unwrap();

        assert_eq!(
            params.filter.polygon,
            Some(vec![(0.0, 0.0), (0.0, 1.0), (1.0, 1.0)])
        );
        assert_eq!(params.filter.organization_name.as_deref(), Some("cafe"));
        assert_eq!(params.page, Some(2));
        assert_eq!(params.items_per_page, None);
    }

    #[test]
    fn test_from_pairs_rejects_unknown_and_duplicate_keys() {
        let err = SearchParams::from_pairs(pairs(&[("colour", "red")])).unwrap_err();
        assert!(err.to_string().contains("unknown query parameter 'colour'"));

        let err = SearchParams::from_pairs(pairs(&[("page", "1"), ("Page", "2")])).unwrap_err();
        assert!(err.to_string().contains("unknown query parameter 'Page'"));

        let err = SearchParams::from_pairs(pairs(&[("lat", "1"), ("lat", "2")])).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_from_pairs_rejects_malformed_values() {
        for bad in [
            ("building_id", "five"),
            ("lat", "north"),
            ("page", "-1"),
            ("polygon", "1;2"),
        ] {
            assert!(SearchParams::from_pairs(pairs(&[bad])).is_err(), "{:?}", bad);
        }
    }
}
