//! Repository trait for organization persistence
//!
//! The service talks to storage only through this trait, so a different
//! backend (or a stub in tests) can stand in for SQLite.

use async_trait::async_trait;

use crate::error::Result;

use super::entity::PageRequest;
use super::query::OrganizationQuery;
use super::repository::OrganizationRow;

/// Read-only access to stored organizations
#[async_trait]
pub trait OrganizationRepositoryTrait: Send + Sync {
    /// Fetch one page of organizations matching `query`
    ///
    /// Returns up to `page.limit()` rows (one past the page size) with their
    /// building, phones and industry names loaded.
    async fn find_with_filters(
        &self,
        query: &OrganizationQuery,
        page: PageRequest,
    ) -> Result<Vec<OrganizationRow>>;

    /// Fetch a single organization with its related rows
    async fn find_by_id(&self, id: i64) -> Result<Option<OrganizationRow>>;
}
