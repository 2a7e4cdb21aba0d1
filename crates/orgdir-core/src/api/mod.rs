//! HTTP API
//!
//! A thin `axum` layer over [`OrganizationService`]:
//!
//! - `GET /v1/organizations` - paginated search
//! - `GET /v1/organizations/{id}` - one organization
//! - `GET /healthz` - store health

pub mod error;
pub mod health;
pub mod organizations;

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::cors::{Any, CorsLayer};

use crate::domain::organization::OrganizationService;
use crate::storage::Database;

pub use error::{ApiError, ErrorResponse};

/// State shared by all handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub service: Arc<OrganizationService>,
    pub database: Database,
}

impl AppState {
    pub fn new(service: OrganizationService, database: Database) -> Self {
        Self {
            service: Arc::new(service),
            database,
        }
    }
}

/// Build the router with all routes
///
/// Responses allow any origin, method and header so browser clients on
/// other origins can call the read-only API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/v1/organizations", get(organizations::list_organizations))
        .route("/v1/organizations/{id}", get(organizations::get_organization))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Serve `router` until `shutdown` resolves
pub async fn serve(
    listener: tokio::net::TcpListener,
    router: Router,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "Serving organization directory");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
