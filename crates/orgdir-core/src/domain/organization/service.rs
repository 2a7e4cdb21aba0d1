//! Organization search service
//!
//! Validates a search, encodes its geo filters, runs it through the
//! repository and maps the rows into a page of organizations.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::SearchConfig;
use crate::error::{Error, Result};

use super::entity::{Organization, PageRequest, PaginatedResult};
use super::filter::OrganizationFilter;
use super::mapper;
use super::repository::OrganizationRepository;
use super::repository_trait::OrganizationRepositoryTrait;

/// Service for searching the organization directory
#[derive(Clone)]
pub struct OrganizationService {
    repository: Arc<dyn OrganizationRepositoryTrait>,
    settings: SearchConfig,
}

impl std::fmt::Debug for OrganizationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrganizationService")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl OrganizationService {
    /// Create a service backed by the SQLite repository
    pub fn new(pool: SqlitePool, settings: SearchConfig) -> Self {
        Self::with_repository(Arc::new(OrganizationRepository::new(pool)), settings)
    }

    /// Create a service over any repository implementation
    pub fn with_repository(
        repository: Arc<dyn OrganizationRepositoryTrait>,
        settings: SearchConfig,
    ) -> Self {
        Self {
            repository,
            settings,
        }
    }

    pub fn settings(&self) -> &SearchConfig {
        &self.settings
    }

    /// Check a page request against the configured limits
    pub fn validate_page(&self, page: PageRequest) -> Result<()> {
        if page.page < 1 {
            return Err(Error::InvalidPagination(
                "page must be greater than 0".to_string(),
            ));
        }

        if page.items_per_page < 1 {
            return Err(Error::InvalidPagination(
                "items_per_page must be greater than 0".to_string(),
            ));
        }

        if page.items_per_page > self.settings.max_items_per_page {
            return Err(Error::InvalidPagination(format!(
                "items_per_page must not exceed {}",
                self.settings.max_items_per_page
            )));
        }

        Ok(())
    }

    /// Find organizations matching every given filter
    #[tracing::instrument(skip(self, filter, page), fields(page = page.page, items_per_page = page.items_per_page))]
    pub async fn find_organizations(
        &self,
        filter: OrganizationFilter,
        page: PageRequest,
    ) -> Result<PaginatedResult<Organization>> {
        self.validate_page(page)?;
        let query = filter.into_query(self.settings.proximity_degrees)?;

        if let Some(polygon) = &query.polygon {
            tracing::debug!(polygon = %polygon, "Filtering by polygon");
        }
        if let Some(point) = &query.point {
            tracing::debug!(point = %point, radius = query.proximity_degrees, "Filtering by point");
        }

        let rows = self.repository.find_with_filters(&query, page).await?;
        let result = mapper::build_page(rows, page);

        tracing::debug!(
            items = result.items.len(),
            page_items = result.page_items,
            has_more = result.has_more,
            "Organization search finished"
        );

        Ok(result)
    }

    /// Find one organization; `None` when the id is unknown
    #[tracing::instrument(skip(self))]
    pub async fn find_organization_by_id(&self, id: i64) -> Result<Option<Organization>> {
        let row = self.repository.find_by_id(id).await?;
        tracing::debug!(found = row.is_some(), "Organization lookup finished");
        Ok(row.map(mapper::map_organization))
    }
}
