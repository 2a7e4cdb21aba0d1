//! Error types for orgdir

use thiserror::Error;

/// Result type alias using orgdir's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Orgdir error types
#[derive(Error, Debug)]
pub enum Error {
    // Request errors (E001-E099)
    #[error("Invalid filter combination: {0}")]
    InvalidFilterCombination(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),

    #[error("Organization '{0}' not found.")]
    OrganizationNotFound(i64),

    // Database errors (E400-E499)
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFilterCombination(_) => "E001",
            Self::InvalidGeometry(_) => "E002",
            Self::InvalidPagination(_) => "E003",
            Self::OrganizationNotFound(_) => "E004",
            Self::DatabaseError(_) => "E400",
            Self::Other(_) => "E9999",
        }
    }

    /// Whether the caller caused this error by sending a bad request
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidFilterCombination(_) | Self::InvalidGeometry(_) | Self::InvalidPagination(_)
        )
    }
}
