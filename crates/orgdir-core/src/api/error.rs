//! HTTP error responses

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Errors returned by the HTTP handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed parameters or an illegal filter combination
    #[error("{message}")]
    Unprocessable { message: String, code: &'static str },

    #[error("{0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON body of every error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Code used for request parameters that do not parse
pub const INVALID_PARAMETER_CODE: &str = "E000";

impl ApiError {
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        ApiError::Unprocessable {
            message: message.into(),
            code: INVALID_PARAMETER_CODE,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unprocessable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unprocessable { code, .. } => *code,
            ApiError::NotFound(_) => "E004",
            ApiError::Internal(_) => "E9999",
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        if err.is_client_error() {
            tracing::warn!(code = err.code(), error = %err, "Rejected request");
            return ApiError::Unprocessable {
                message: err.to_string(),
                code: err.code(),
            };
        }

        match err {
            Error::OrganizationNotFound(_) => ApiError::NotFound(err.to_string()),
            other => {
                tracing::error!(code = other.code(), error = %other, "Request failed");
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: self.to_string(),
            code: self.code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_422() {
        let api: ApiError = Error::InvalidGeometry("2 points".to_string()).into();
        assert_eq!(api.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(api.code(), "E002");

        let api: ApiError = Error::InvalidPagination("page".to_string()).into();
        assert_eq!(api.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let api: ApiError = Error::OrganizationNotFound(7).into();
        assert_eq!(api.status(), StatusCode::NOT_FOUND);
        assert!(api.to_string().contains('7'));
    }

    #[test]
    fn test_other_errors_map_to_500() {
        let api: ApiError = Error::Other("boom".to_string()).into();
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.code(), "E9999");
    }
}
