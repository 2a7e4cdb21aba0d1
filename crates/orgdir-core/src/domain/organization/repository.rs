//! Organization repository for database operations
//!
//! Runs the composed page query, then loads each organization's building,
//! phones and industry names with one `IN (...)` query per relation. All
//! statements of a call share one transaction so the page and its related
//! rows come from the same snapshot.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool, Transaction};

use crate::error::{Error, Result};

use super::entity::PageRequest;
use super::query::OrganizationQuery;
use super::repository_trait::OrganizationRepositoryTrait;

/// A stored organization with its related rows loaded
#[derive(Debug, Clone, PartialEq)]
pub struct OrganizationRow {
    pub id: i64,
    pub name: String,
    pub building: BuildingRow,
    /// Phone numbers in insertion order
    pub phones: Vec<String>,
    /// Names of the directly linked industries, by industry id
    pub industries: Vec<String>,
}

/// A stored building; the point is kept as longitude/latitude columns
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct BuildingRow {
    pub id: i64,
    pub address: String,
    pub longitude: f64,
    pub latitude: f64,
}

#[derive(Debug, sqlx::FromRow)]
struct OrganizationRecord {
    id: i64,
    name: String,
    building_id: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct PhoneRecord {
    organization_id: i64,
    phone_number: String,
}

#[derive(Debug, sqlx::FromRow)]
struct IndustryNameRecord {
    organization_id: i64,
    name: String,
}

/// Repository for organization database operations
#[derive(Debug, Clone)]
pub struct OrganizationRepository {
    pool: SqlitePool,
}

impl OrganizationRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Fetch one page of organizations matching `query`
    pub async fn find_with_filters(
        &self,
        query: &OrganizationQuery,
        page: PageRequest,
    ) -> Result<Vec<OrganizationRow>> {
        let mut qb = query.compose(page)?;

        let mut tx = self.pool.begin().await.map_err(Error::DatabaseError)?;

        let records: Vec<OrganizationRecord> = qb
            .build_query_as()
            .fetch_all(&mut *tx)
            .await
            .map_err(Error::DatabaseError)?;

        let rows = load_related(&mut tx, records).await?;
        tx.commit().await.map_err(Error::DatabaseError)?;

        Ok(rows)
    }

    /// Fetch a single organization by id
    pub async fn find_by_id(&self, id: i64) -> Result<Option<OrganizationRow>> {
        let mut tx = self.pool.begin().await.map_err(Error::DatabaseError)?;

        let record: Option<OrganizationRecord> =
            sqlx::query_as("SELECT id, name, building_id FROM organizations WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(Error::DatabaseError)?;

        let Some(record) = record else {
            tx.commit().await.map_err(Error::DatabaseError)?;
            return Ok(None);
        };

        let row = load_related(&mut tx, vec![record]).await?.into_iter().next();
        tx.commit().await.map_err(Error::DatabaseError)?;

        Ok(row)
    }
}

#[async_trait]
impl OrganizationRepositoryTrait for OrganizationRepository {
    async fn find_with_filters(
        &self,
        query: &OrganizationQuery,
        page: PageRequest,
    ) -> Result<Vec<OrganizationRow>> {
        OrganizationRepository::find_with_filters(self, query, page).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<OrganizationRow>> {
        OrganizationRepository::find_by_id(self, id).await
    }
}

/// Attach building, phones and industry names, keeping `records` order
async fn load_related(
    tx: &mut Transaction<'_, Sqlite>,
    records: Vec<OrganizationRecord>,
) -> Result<Vec<OrganizationRow>> {
    if records.is_empty() {
        return Ok(Vec::new());
    }

    let organization_ids: Vec<i64> = records.iter().map(|r| r.id).collect();
    let mut building_ids: Vec<i64> = records.iter().map(|r| r.building_id).collect();
    building_ids.sort_unstable();
    building_ids.dedup();

    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT id, address, longitude, latitude FROM buildings WHERE id IN (",
    );
    push_id_list(&mut qb, &building_ids);
    let buildings: HashMap<i64, BuildingRow> = qb
        .build_query_as::<BuildingRow>()
        .fetch_all(&mut **tx)
        .await
        .map_err(Error::DatabaseError)?
        .into_iter()
        .map(|b| (b.id, b))
        .collect();

    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT organization_id, phone_number FROM phones WHERE organization_id IN (",
    );
    push_id_list(&mut qb, &organization_ids);
    qb.push(" ORDER BY id");
    let mut phones: HashMap<i64, Vec<String>> = HashMap::new();
    for phone in qb
        .build_query_as::<PhoneRecord>()
        .fetch_all(&mut **tx)
        .await
        .map_err(Error::DatabaseError)?
    {
        phones
            .entry(phone.organization_id)
            .or_default()
            .push(phone.phone_number);
    }

    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT oi.organization_id, i.name FROM organization_industries oi \
         JOIN industries i ON i.id = oi.industry_id WHERE oi.organization_id IN (",
    );
    push_id_list(&mut qb, &organization_ids);
    qb.push(" ORDER BY i.id");
    let mut industries: HashMap<i64, Vec<String>> = HashMap::new();
    for industry in qb
        .build_query_as::<IndustryNameRecord>()
        .fetch_all(&mut **tx)
        .await
        .map_err(Error::DatabaseError)?
    {
        industries
            .entry(industry.organization_id)
            .or_default()
            .push(industry.name);
    }

    records
        .into_iter()
        .map(|record| {
            let building = buildings.get(&record.building_id).cloned().ok_or_else(|| {
                Error::Other(format!(
                    "organization {} references missing building {}",
                    record.id, record.building_id
                ))
            })?;

            Ok(OrganizationRow {
                id: record.id,
                name: record.name,
                building,
                phones: phones.remove(&record.id).unwrap_or_default(),
                industries: industries.remove(&record.id).unwrap_or_default(),
            })
        })
        .collect()
}

/// Push `?, ?, ...)` for each id
fn push_id_list(qb: &mut QueryBuilder<'_, Sqlite>, ids: &[i64]) {
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    async fn setup() -> (Database, OrganizationRepository) {
        let db = Database::in_memory().await.expect("Failed to create database");
        let repo = OrganizationRepository::new(db.pool().clone());

        sqlx::raw_sql(
            r#"
            INSERT INTO buildings (id, address, longitude, latitude) VALUES
                (1, '1 Main St', 37.6173, 55.7558),
                (2, '22 Side Ave', 30.3141, 59.9386);
            INSERT INTO industries (id, parent_id, name) VALUES
                (1, NULL, 'Food'),
                (2, 1, 'Dairy');
            INSERT INTO organizations (id, name, building_id, created_at) VALUES
                (1, 'Milk & Co', 1, '2024-01-01 00:00:00'),
                (2, 'Corner Cafe', 1, '2024-01-02 00:00:00'),
                (3, 'Bolt Works', 2, '2024-01-03 00:00:00');
            INSERT INTO phones (id, organization_id, phone_number) VALUES
                (1, 1, '2-222-222'),
                (2, 1, '3-333-333'),
                (3, 2, '8-923-666-13-13');
            INSERT INTO organization_industries (organization_id, industry_id) VALUES
                (1, 2), (1, 1), (2, 1);
            "#,
        )
        .execute(db.pool())
        .await
        .expect("Failed to seed");

        (db, repo)
    }

    fn all() -> OrganizationQuery {
        OrganizationQuery::unfiltered(0.001)
    }

    #[tokio::test]
    async fn test_find_by_id_loads_relations() {
        let (_db, repo) = setup().await;

        let row = repo.find_by_id(1).await.unwrap().expect("organization 1");
        assert_eq!(row.name, "Milk & Co");
        assert_eq!(row.building.address, "1 Main St");
        assert_eq!(row.building.longitude, 37.6173);
        assert_eq!(row.phones, vec!["2-222-222", "3-333-333"]);
        assert_eq!(row.industries, vec!["Food", "Dairy"]);

        let row = repo.find_by_id(3).await.unwrap().expect("organization 3");
        assert!(row.phones.is_empty());
        assert!(row.industries.is_empty());
    }

    #[tokio::test]
    async fn test_find_by_id_missing() {
        let (_db, repo) = setup().await;
        assert!(repo.find_by_id(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_with_filters_orders_by_creation() {
        let (_db, repo) = setup().await;

        let rows = repo
            .find_with_filters(&all(), PageRequest::new(1, 10))
            .await
            .unwrap();
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_find_with_filters_fetches_one_extra_row() {
        let (_db, repo) = setup().await;

        let rows = repo
            .find_with_filters(&all(), PageRequest::new(1, 2))
            .await
            .unwrap();
        assert_eq!(rows.len(), 3);

        let rows = repo
            .find_with_filters(&all(), PageRequest::new(2, 2))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 3);
    }

    #[tokio::test]
    async fn test_industry_filter_does_not_duplicate() {
        let (_db, repo) = setup().await;

        let query = OrganizationQuery {
            industry_name: Some("food".to_string()),
            ..all()
        };
        let rows = repo
            .find_with_filters(&query, PageRequest::new(1, 10))
            .await
            .unwrap();
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_like_wildcards_match_literally() {
        let (_db, repo) = setup().await;

        let query = OrganizationQuery {
            organization_name: Some("%".to_string()),
            ..all()
        };
        let rows = repo
            .find_with_filters(&query, PageRequest::new(1, 10))
            .await
            .unwrap();
        assert!(rows.is_empty());

        let query = OrganizationQuery {
            organization_name: Some(" & ".to_string()),
            ..all()
        };
        let rows = repo
            .find_with_filters(&query, PageRequest::new(1, 10))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 1);
    }
}
