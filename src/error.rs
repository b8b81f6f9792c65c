use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::registry::RegistryError;

/// Error response type
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Response type for health check endpoint
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Response type for unhealthy status
#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct UnhealthyResponse {
    pub status: String,
    pub error: String,
}

/// Custom error type for API endpoints
///
/// Maps registry and storage failures to HTTP status codes and formats them
/// as `{"error": "..."}` bodies. Missing endpoints and bad documents always
/// end up here as 404/400 instead of surfacing as faults.
#[derive(Debug)]
pub enum ApiError {
    /// Target endpoint does not exist
    EndpointNotFound,
    /// Data-API payload could not be applied
    BadRequest(String),
    /// Management submission rejected; the message is meant for a person
    InvalidSubmission(String),
    /// Snapshot could not be persisted
    Storage(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::EndpointNotFound => (
                StatusCode::NOT_FOUND,
                "Endpoint not found".to_string(),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InvalidSubmission(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Storage(err) => {
                tracing::error!("Storage error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Storage error: {}", err),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_message,
        });

        (status, body).into_response()
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(_) => ApiError::EndpointNotFound,
            RegistryError::InvalidName(_) => {
                ApiError::InvalidSubmission("Endpoint name must not be empty.".to_string())
            }
            RegistryError::BadDocument(msg) => ApiError::InvalidSubmission(msg),
            RegistryError::Storage(err) => ApiError::Storage(err.to_string()),
        }
    }
}
