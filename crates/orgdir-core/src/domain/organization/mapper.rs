//! Row to entity mapping

use super::entity::{Building, Organization, PageRequest, PaginatedResult};
use super::geo::PointGeometry;
use super::repository::{BuildingRow, OrganizationRow};

pub fn map_building(row: BuildingRow) -> Building {
    Building {
        id: row.id,
        address: row.address,
        coordinates: PointGeometry::from_xy(row.longitude, row.latitude).to_coordinates(),
    }
}

pub fn map_organization(row: OrganizationRow) -> Organization {
    Organization {
        id: row.id,
        name: row.name,
        phones: row.phones,
        building: map_building(row.building),
        industries: row.industries,
    }
}

/// Turn the rows of a look-ahead fetch into a page
///
/// `rows` may hold one row more than `page.items_per_page`; that row only
/// signals `has_more` and is dropped.
pub fn build_page(mut rows: Vec<OrganizationRow>, page: PageRequest) -> PaginatedResult<Organization> {
    let fetched = rows.len();
    let page_size = page.items_per_page as usize;
    let has_more = fetched > page_size;
    rows.truncate(page_size);

    PaginatedResult {
        items: rows.into_iter().map(map_organization).collect(),
        page: page.page,
        page_items: fetched,
        has_more,
    }
}
