//! Shared API response envelope and error mapping

pub mod validated_json;

pub use validated_json::ValidatedJson;

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::DomainError;

/// Uniform response envelope
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// `true` when the request succeeded
    pub success: bool,
    /// Payload, `null` on error
    pub data: Option<T>,
    /// Error description, `null` on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Empty response for operations without return data
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EmptyData {}

/// Handler result: either the envelope or (status, envelope).
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiResponse<T>>)>;

/// Map a domain error to its HTTP status.
///
/// NotFound and failed conflict checks keep distinguishable statuses so
/// the caller can decide whether retrying with different parameters makes
/// sense.
pub fn status_for(error: &DomainError) -> StatusCode {
    match error {
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::InvalidState(_) => StatusCode::CONFLICT,
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Turn a domain error into the standard error tuple.
pub fn domain_error<T>(error: DomainError) -> (StatusCode, Json<ApiResponse<T>>) {
    (status_for(&error), Json(ApiResponse::error(error.to_string())))
}
