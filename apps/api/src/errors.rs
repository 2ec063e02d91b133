use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::intake::validation::FieldError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Internal causes are logged here and never sent to the client.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("Upload exceeds the configured size limit")]
    PayloadTooLarge,

    #[error("Signup failed: {0}")]
    SignupFailed(String),

    #[error("Applicant not found")]
    NotFound,

    #[error("Resume retrieval failed: {0}")]
    Retrieval(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
            }
            AppError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "Resume file is too large",
            )
                .into_response(),
            AppError::SignupFailed(cause) => {
                tracing::error!("Signup failed: {cause}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Signup failed. Please try again.",
                )
                    .into_response()
            }
            AppError::NotFound => (StatusCode::NOT_FOUND, "User not found").into_response(),
            AppError::Retrieval(cause) => {
                tracing::error!("Resume retrieval error: {cause}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error retrieving resume",
                )
                    .into_response()
            }
        }
    }
}
