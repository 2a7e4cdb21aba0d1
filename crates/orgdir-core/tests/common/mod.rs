//! Shared fixtures for integration tests

use orgdir_core::storage::Database;

/// Industry tree used by the fixtures:
///
/// ```text
/// Food (1)
/// ├── Meat (2)
/// └── Dairy (3)
///     └── Cheese (4)
///         └── Aged cheese (5)
///             └── Blue cheese (6)
/// Automotive (7)
/// └── Trucks (8)
/// ```
///
/// Buildings 1 and 2 are about 50m apart in Moscow; buildings 4 and 5 are
/// about 100m apart in New York (just beyond the default radius).
const FIXTURES: &str = r#"
    INSERT INTO buildings (id, address, longitude, latitude) VALUES
        (1, 'Lenina 1, Moscow', 37.6173, 55.7558),
        (2, 'Tverskaya 7, Moscow', 37.6180, 55.7560),
        (3, 'Nevsky 28, Saint Petersburg', 30.3141, 59.9386),
        (4, 'Broadway 100, New York', -73.9362, 40.7306),
        (5, 'Market Square 5, New York', -73.935, 40.73);

    INSERT INTO industries (id, parent_id, name) VALUES
        (1, NULL, 'Food'),
        (2, 1, 'Meat'),
        (3, 1, 'Dairy'),
        (4, 3, 'Cheese'),
        (5, 4, 'Aged cheese'),
        (6, 5, 'Blue cheese'),
        (7, NULL, 'Automotive'),
        (8, 7, 'Trucks');

    INSERT INTO organizations (id, name, building_id, created_at) VALUES
        (1, 'Horns & Hooves', 1, '2024-01-01 00:00:00'),
        (2, 'Milk Farm', 2, '2024-01-02 00:00:00'),
        (3, 'Cheese House', 5, '2024-01-03 00:00:00'),
        (4, 'Blue Moon Creamery', 5, '2024-01-04 00:00:00'),
        (5, 'Truck Parts Ltd', 5, '2024-01-05 00:00:00'),
        (6, 'Broadway Deli', 4, '2024-01-06 00:00:00'),
        (7, 'Nevsky Motors', 3, '2024-01-07 00:00:00');

    INSERT INTO phones (id, organization_id, phone_number) VALUES
        (1, 1, '2-222-222'),
        (2, 1, '3-333-333'),
        (3, 1, '8-923-666-13-13'),
        (4, 3, '+1-212-555-0100');

    INSERT INTO organization_industries (organization_id, industry_id) VALUES
        (1, 3), (1, 2),
        (2, 3),
        (3, 4),
        (4, 6),
        (5, 8),
        (6, 1),
        (7, 7);
"#;

/// In-memory database with the fixture directory loaded
pub async fn seeded_database() -> Database {
    let db = Database::in_memory().await.expect("Failed to create database");
    sqlx::raw_sql(FIXTURES)
        .execute(db.pool())
        .await
        .expect("Failed to load fixtures");
    db
}
