//! JSON extractor that runs `validator` rules after deserializing

use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::Json;
use serde::de::DeserializeOwned;
use validator::Validate;

use super::{ApiResponse, EmptyData};

/// `Json<T>` that also enforces the DTO's validation rules.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = (StatusCode, Json<ApiResponse<EmptyData>>);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(format!("Invalid JSON body: {}", e))),
            )
        })?;

        value.validate().map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(format!("Validation failed: {}", e))),
            )
        })?;

        Ok(ValidatedJson(value))
    }
}
