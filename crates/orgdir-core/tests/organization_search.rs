//! Organization search end to end: filter validation, composed SQL against
//! SQLite, eager loading and pagination.

mod common;

use orgdir_core::Error;
use orgdir_core::config::SearchConfig;
use orgdir_core::domain::organization::{
    OrganizationFilter, OrganizationService, PageRequest, PaginatedResult, Organization,
};

async fn service() -> OrganizationService {
    let db = common::seeded_database().await;
    OrganizationService::new(db.pool().clone(), SearchConfig::default())
}

async fn find(service: &OrganizationService, filter: OrganizationFilter) -> Vec<i64> {
    ids(&service
        .find_organizations(filter, PageRequest::new(1, 100))
        .await
        .unwrap())
}

fn ids(page: &PaginatedResult<Organization>) -> Vec<i64> {
    page.items.iter().map(|o| o.id).collect()
}

#[tokio::test]
async fn test_unfiltered_lists_everything_in_creation_order() {
    let service = service().await;
    assert_eq!(find(&service, OrganizationFilter::new()).await, vec![1, 2, 3, 4, 5, 6, 7]);
}

#[tokio::test]
async fn test_building_page_with_look_ahead() {
    let service = service().await;

    let page = service
        .find_organizations(OrganizationFilter::new().with_building_id(5), PageRequest::new(1, 2))
        .await
        .unwrap();
    assert_eq!(ids(&page), vec![3, 4]);
    assert_eq!(page.page, 1);
    assert_eq!(page.page_items, 3);
    assert!(page.has_more);

    let page = service
        .find_organizations(OrganizationFilter::new().with_building_id(5), PageRequest::new(2, 2))
        .await
        .unwrap();
    assert_eq!(ids(&page), vec![5]);
    assert_eq!(page.page, 2);
    assert_eq!(page.page_items, 1);
    assert!(!page.has_more);
}

#[tokio::test]
async fn test_exact_page_size_has_no_more() {
    let service = service().await;

    let page = service
        .find_organizations(OrganizationFilter::new().with_building_id(5), PageRequest::new(1, 3))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 3);
    assert_eq!(page.page_items, 3);
    assert!(!page.has_more);
}

#[tokio::test]
async fn test_page_past_the_end_is_empty() {
    let service = service().await;

    let page = service
        .find_organizations(OrganizationFilter::new(), PageRequest::new(5, 10))
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.page_items, 0);
    assert!(!page.has_more);
}

#[tokio::test]
async fn test_industry_name_matches_up_to_three_ancestors() {
    let service = service().await;

    // Blue cheese (4) sits four levels below Food, so it does not match
    assert_eq!(
        find(&service, OrganizationFilter::new().with_industry_name("food")).await,
        vec![1, 2, 3, 6]
    );

    // Dairy is the great-grandparent of Blue cheese
    assert_eq!(
        find(&service, OrganizationFilter::new().with_industry_name("dairy")).await,
        vec![1, 2, 3, 4]
    );

    assert_eq!(
        find(&service, OrganizationFilter::new().with_industry_name("cheese")).await,
        vec![3, 4]
    );
}

#[tokio::test]
async fn test_industry_id_matches_direct_links_only() {
    let service = service().await;

    assert_eq!(
        find(&service, OrganizationFilter::new().with_industry_id(3)).await,
        vec![1, 2]
    );
    assert_eq!(
        find(&service, OrganizationFilter::new().with_industry_id(1)).await,
        vec![6]
    );
}

#[tokio::test]
async fn test_multiple_matching_industries_do_not_duplicate() {
    let service = service().await;

    // Horns & Hooves is in both Meat and Dairy, both under Food
    let result = find(&service, OrganizationFilter::new().with_industry_name("o")).await;
    assert_eq!(result.iter().filter(|&&id| id == 1).count(), 1);
}

#[tokio::test]
async fn test_substring_filters_ignore_case() {
    let service = service().await;

    assert_eq!(
        find(&service, OrganizationFilter::new().with_organization_name("MILK")).await,
        vec![2]
    );
    assert_eq!(
        find(&service, OrganizationFilter::new().with_address("market square")).await,
        vec![3, 4, 5]
    );
}

#[tokio::test]
async fn test_filters_intersect() {
    let service = service().await;

    let filter = OrganizationFilter::new()
        .with_building_id(5)
        .with_industry_name("food");
    assert_eq!(find(&service, filter).await, vec![3]);

    let filter = OrganizationFilter::new()
        .with_address("new york")
        .with_organization_name("deli");
    assert_eq!(find(&service, filter).await, vec![6]);

    let filter = OrganizationFilter::new()
        .with_building_id(1)
        .with_industry_name("automotive");
    assert!(find(&service, filter).await.is_empty());
}

#[tokio::test]
async fn test_point_within_radius() {
    let service = service().await;

    // Broadway 100 is about 130m away and falls outside the radius
    assert_eq!(
        find(&service, OrganizationFilter::new().with_point(40.73, -73.935)).await,
        vec![3, 4, 5]
    );

    assert_eq!(
        find(&service, OrganizationFilter::new().with_point(55.7558, 37.6173)).await,
        vec![1, 2]
    );
}

#[tokio::test]
async fn test_point_radius_is_configurable() {
    let db = common::seeded_database().await;
    let settings = SearchConfig {
        proximity_degrees: 0.01,
        ..SearchConfig::default()
    };
    let service = OrganizationService::new(db.pool().clone(), settings);

    assert_eq!(
        find(&service, OrganizationFilter::new().with_point(40.73, -73.935)).await,
        vec![3, 4, 5, 6]
    );
}

#[tokio::test]
async fn test_polygon_containment() {
    let service = service().await;

    let square = vec![(55.7, 37.5), (55.7, 37.7), (55.8, 37.7), (55.8, 37.5)];
    assert_eq!(
        find(&service, OrganizationFilter::new().with_polygon(square)).await,
        vec![1, 2]
    );

    // Both Moscow buildings are inside the bounding box but above the hypotenuse
    let triangle = vec![(55.7, 37.5), (55.8, 37.5), (55.7, 37.7)];
    assert!(find(&service, OrganizationFilter::new().with_polygon(triangle)).await.is_empty());
}

/// Regular polygon approximating a circle, as `(lat, lon)` vertices
fn circle(center: (f64, f64), radius: f64, vertices: usize) -> Vec<(f64, f64)> {
    (0..vertices)
        .map(|i| {
            let angle = 2.0 * std::f64::consts::PI * i as f64 / vertices as f64;
            (center.0 + radius * angle.sin(), center.1 + radius * angle.cos())
        })
        .collect()
}

#[tokio::test]
async fn test_polygon_with_many_vertices() {
    let service = service().await;

    for vertices in [1000, 5000] {
        let polygon = circle((55.7559, 37.6176), 0.05, vertices);
        assert_eq!(
            find(&service, OrganizationFilter::new().with_polygon(polygon)).await,
            vec![1, 2],
            "{} vertices",
            vertices
        );
    }

    // Same ring size, centred away from every building
    let polygon = circle((50.0, 30.0), 0.05, 2000);
    assert!(find(&service, OrganizationFilter::new().with_polygon(polygon)).await.is_empty());
}

#[tokio::test]
async fn test_polygon_wkt() {
    let service = service().await;

    let filter = OrganizationFilter::new()
        .with_polygon_wkt("POLYGON((-74 40.7, -73.9 40.7, -73.9 40.8, -74 40.8, -74 40.7))");
    assert_eq!(find(&service, filter).await, vec![3, 4, 5, 6]);
}

#[tokio::test]
async fn test_organization_is_fully_populated() {
    let service = service().await;

    let org = service.find_organization_by_id(1).await.unwrap().unwrap();
    assert_eq!(org.name, "Horns & Hooves");
    assert_eq!(org.phones, vec!["2-222-222", "3-333-333", "8-923-666-13-13"]);
    assert_eq!(org.industries, vec!["Meat", "Dairy"]);
    assert_eq!(org.building.id, 1);
    assert_eq!(org.building.address, "Lenina 1, Moscow");
    assert_eq!(org.building.coordinates.lat, 55.7558);
    assert_eq!(org.building.coordinates.lon, 37.6173);
}

#[tokio::test]
async fn test_find_by_unknown_id_is_none() {
    let service = service().await;
    assert!(service.find_organization_by_id(999).await.unwrap().is_none());
}

#[tokio::test]
async fn test_invalid_combinations_are_rejected() {
    let service = service().await;
    let page = PageRequest::new(1, 10);

    let err = service
        .find_organizations(
            OrganizationFilter {
                lon: Some(37.6),
                ..Default::default()
            },
            page,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidFilterCombination(_)));

    let err = service
        .find_organizations(
            OrganizationFilter::new()
                .with_point(55.7, 37.6)
                .with_polygon(vec![(55.7, 37.5), (55.7, 37.7), (55.8, 37.7)]),
            page,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidFilterCombination(_)));

    let err = service
        .find_organizations(
            OrganizationFilter::new().with_polygon(vec![(55.7, 37.5), (55.8, 37.7)]),
            page,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidGeometry(_)));
}
