//! Organization directory domain
//!
//! Read-only search over organizations, the buildings that host them and
//! the industry tree they belong to.
//!
//! # Architecture
//!
//! - **Entities**: `Organization`, `Building`, `Coordinates`, `PaginatedResult`
//! - **Geo**: `encode_point` / `encode_polygon` into planar geometries
//! - **Filter**: `OrganizationFilter`, validated into an `OrganizationQuery`
//! - **Query**: composes the filtered page into one SQL statement
//! - **Repository**: `OrganizationRepository` runs it and loads related rows
//! - **Service**: `OrganizationService` ties the steps together
//!
//! # Example
//!
//! ```ignore
//! use orgdir_core::domain::organization::{OrganizationFilter, OrganizationService, PageRequest};
//!
//! let service = OrganizationService::new(pool.clone(), config.search.clone());
//!
//! // Organizations in building 5 that work in "food" or one of its sub-industries
//! let filter = OrganizationFilter::new()
//!     .with_building_id(5)
//!     .with_industry_name("food");
//! let page = service.find_organizations(filter, PageRequest::new(1, 20)).await?;
//! ```

pub mod entity;
pub mod filter;
pub mod geo;
pub mod mapper;
pub mod query;
pub mod repository;
pub mod repository_trait;
pub mod service;

pub use entity::{Building, Coordinates, Organization, PageRequest, PaginatedResult};
pub use filter::{OrganizationFilter, parse_lat_lon};
pub use geo::{BoundingBox, PointGeometry, PolygonGeometry, encode_point, encode_polygon};
pub use query::{INDUSTRY_ANCESTOR_DEPTH, OrganizationQuery};
pub use repository::{BuildingRow, OrganizationRepository, OrganizationRow};
pub use repository_trait::OrganizationRepositoryTrait;
pub use service::OrganizationService;
