//! Organization query composition
//!
//! Turns a validated [`OrganizationQuery`] into one SQL statement that
//! selects the matching organizations for a page. Joins are added only for
//! the filters that need them:
//!
//! - `buildings` for `address`, point and polygon filters
//! - `organization_industries` + `industries` for `industry_id` / `industry_name`
//! - [`INDUSTRY_ANCESTOR_DEPTH`] self-joins on `industries` for `industry_name`
//!
//! The industry joins can return one row per membership, so those queries
//! are `DISTINCT`. Related rows (building, phones, industry names) are
//! loaded afterwards by the repository.

use sqlx::{QueryBuilder, Sqlite};

use crate::error::{Error, Result};

use super::entity::PageRequest;
use super::geo::{PointGeometry, PolygonGeometry};

/// How many ancestors above a matched industry `industry_name` also checks
///
/// Parent, grandparent and great-grandparent. Deeper ancestors are not
/// considered: an industry four levels below a matching name does not match.
pub const INDUSTRY_ANCESTOR_DEPTH: usize = 3;

/// A validated, geo-encoded search ready to be composed into SQL
#[derive(Debug, Clone, PartialEq)]
pub struct OrganizationQuery {
    pub building_id: Option<i64>,
    pub industry_id: Option<i64>,
    pub organization_name: Option<String>,
    pub industry_name: Option<String>,
    pub address: Option<String>,
    pub point: Option<PointGeometry>,
    pub polygon: Option<PolygonGeometry>,
    /// Radius of the point filter, in degrees
    pub proximity_degrees: f64,
}

impl OrganizationQuery {
    /// A query with no filters that lists everything
    pub fn unfiltered(proximity_degrees: f64) -> Self {
        Self {
            building_id: None,
            industry_id: None,
            organization_name: None,
            industry_name: None,
            address: None,
            point: None,
            polygon: None,
            proximity_degrees,
        }
    }

    pub fn is_unfiltered(&self) -> bool {
        self.building_id.is_none()
            && self.industry_id.is_none()
            && self.organization_name.is_none()
            && self.industry_name.is_none()
            && self.address.is_none()
            && self.point.is_none()
            && self.polygon.is_none()
    }

    pub fn needs_building_join(&self) -> bool {
        self.address.is_some() || self.point.is_some() || self.polygon.is_some()
    }

    pub fn needs_industry_join(&self) -> bool {
        self.industry_id.is_some() || self.industry_name.is_some()
    }

    /// Whether the joins can repeat an organization
    pub fn needs_distinct(&self) -> bool {
        self.needs_industry_join()
    }

    /// Build the page query
    ///
    /// Selects `id, name, building_id` ordered by creation, with
    /// `LIMIT page.limit()` (one row past the page) and `OFFSET page.offset()`.
    pub fn compose(&self, page: PageRequest) -> Result<QueryBuilder<'static, Sqlite>> {
        if self.point.is_some() && self.polygon.is_some() {
            return Err(Error::InvalidFilterCombination(
                "a query cannot filter by both a point and a polygon".to_string(),
            ));
        }

        let mut qb = QueryBuilder::new(if self.needs_distinct() {
            "SELECT DISTINCT "
        } else {
            "SELECT "
        });
        qb.push("o.id, o.name, o.building_id, o.created_at FROM organizations o");

        if self.needs_building_join() {
            qb.push(" JOIN buildings b ON b.id = o.building_id");
        }

        if self.needs_industry_join() {
            qb.push(" JOIN organization_industries oi ON oi.organization_id = o.id");
            qb.push(" JOIN industries i ON i.id = oi.industry_id");
        }

        if self.industry_name.is_some() {
            let mut child = "i".to_string();
            for level in 1..=INDUSTRY_ANCESTOR_DEPTH {
                let alias = format!("p{}", level);
                qb.push(format!(
                    " LEFT JOIN industries {alias} ON {alias}.id = {child}.parent_id"
                ));
                child = alias;
            }
        }

        let mut conditions = Conditions::default();

        if let Some(building_id) = self.building_id {
            conditions.next(&mut qb);
            qb.push("o.building_id = ").push_bind(building_id);
        }

        if let Some(industry_id) = self.industry_id {
            conditions.next(&mut qb);
            qb.push("i.id = ").push_bind(industry_id);
        }

        if let Some(name) = &self.organization_name {
            conditions.next(&mut qb);
            push_contains(&mut qb, "o.name", name);
        }

        if let Some(address) = &self.address {
            conditions.next(&mut qb);
            push_contains(&mut qb, "b.address", address);
        }

        if let Some(industry_name) = &self.industry_name {
            conditions.next(&mut qb);
            qb.push("(");
            push_contains(&mut qb, "i.name", industry_name);
            for level in 1..=INDUSTRY_ANCESTOR_DEPTH {
                qb.push(" OR ");
                push_contains(&mut qb, &format!("p{}.name", level), industry_name);
            }
            qb.push(")");
        }

        if let Some(point) = self.point {
            conditions.next(&mut qb);
            push_within_distance(&mut qb, point, self.proximity_degrees);
        }

        if let Some(polygon) = &self.polygon {
            conditions.next(&mut qb);
            push_within_polygon(&mut qb, polygon)?;
        }

        qb.push(" ORDER BY o.created_at, o.id LIMIT ")
            .push_bind(page.limit())
            .push(" OFFSET ")
            .push_bind(page.offset());

        tracing::debug!(
            sql = qb.sql(),
            page = page.page,
            items_per_page = page.items_per_page,
            "Composed organization query"
        );

        Ok(qb)
    }
}

/// Emits ` WHERE ` before the first condition and ` AND ` before the rest
#[derive(Default)]
struct Conditions {
    started: bool,
}

impl Conditions {
    fn next(&mut self, qb: &mut QueryBuilder<'static, Sqlite>) {
        qb.push(if self.started { " AND " } else { " WHERE " });
        self.started = true;
    }
}

/// Escape `LIKE` wildcards so user text only matches literally
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `column LIKE '%value%'`, case-insensitive for ASCII
fn push_contains(qb: &mut QueryBuilder<'static, Sqlite>, column: &str, value: &str) {
    qb.push(column)
        .push(" LIKE ")
        .push_bind(format!("%{}%", escape_like(value)))
        .push(" ESCAPE '\\'");
}

/// Building point within `radius` degrees of `point` (planar distance)
fn push_within_distance(qb: &mut QueryBuilder<'static, Sqlite>, point: PointGeometry, radius: f64) {
    qb.push("(b.longitude BETWEEN ")
        .push_bind(point.x - radius)
        .push(" AND ")
        .push_bind(point.x + radius)
        .push(" AND b.latitude BETWEEN ")
        .push_bind(point.y - radius)
        .push(" AND ")
        .push_bind(point.y + radius);

    qb.push(" AND ((b.longitude - ")
        .push_bind(point.x)
        .push(") * (b.longitude - ")
        .push_bind(point.x)
        .push(") + (b.latitude - ")
        .push_bind(point.y)
        .push(") * (b.latitude - ")
        .push_bind(point.y)
        .push(")) <= ")
        .push_bind(radius * radius)
        .push(")");
}

/// Building point inside `polygon`: bounding box, then even-odd ray casting
///
/// The edges are bound once as a JSON array of `[ax, ay, cx, cy]` and walked
/// with `json_each`, so the statement has the same shape for any ring size.
/// An edge counts when a ray cast from the building towards +x crosses it;
/// an odd count means the point is inside.
fn push_within_polygon(
    qb: &mut QueryBuilder<'static, Sqlite>,
    polygon: &PolygonGeometry,
) -> Result<()> {
    let bbox = polygon.bounding_box();
    let edges: Vec<[f64; 4]> = polygon.edges().map(|(a, c)| [a.x, a.y, c.x, c.y]).collect();
    let edges = serde_json::to_string(&edges)
        .map_err(|e| Error::InvalidGeometry(format!("cannot encode polygon edges: {}", e)))?;

    qb.push("(b.longitude BETWEEN ")
        .push_bind(bbox.min_x)
        .push(" AND ")
        .push_bind(bbox.max_x)
        .push(" AND b.latitude BETWEEN ")
        .push_bind(bbox.min_y)
        .push(" AND ")
        .push_bind(bbox.max_y);

    // ay > py differs from cy > py, and px lies left of the crossing
    qb.push(" AND (SELECT COUNT(*) FROM json_each(")
        .push_bind(edges)
        .push(
            ") e WHERE ((json_extract(e.value, '$[1]') > b.latitude) <> (json_extract(e.value, '$[3]') > b.latitude)) \
             AND b.longitude < (json_extract(e.value, '$[2]') - json_extract(e.value, '$[0]')) \
             * (b.latitude - json_extract(e.value, '$[1]')) \
             / (json_extract(e.value, '$[3]') - json_extract(e.value, '$[1]')) \
             + json_extract(e.value, '$[0]')) % 2 = 1)",
        );

    Ok(())
}
