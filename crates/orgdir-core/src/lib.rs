//! Orgdir Core Library
//!
//! This crate provides the core functionality for orgdir, a read-only
//! directory of organizations, their buildings and industries:
//! - Storage (SQLite pool + versioned migrations)
//! - Organization search (filters, geo predicates, industry hierarchy, pagination)
//! - HTTP API (axum)
//! - Configuration

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod storage;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::domain::organization::{
        Organization, OrganizationFilter, OrganizationService, PageRequest, PaginatedResult,
    };
    pub use crate::error::{Error, Result};
    pub use crate::storage::{Database, DatabaseConfig};
}
