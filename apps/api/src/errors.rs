use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::insight::validator::ValidateError;
use crate::llm_client::GenerationError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// Every variant maps to one pipeline stage so callers always learn where an
/// extraction session died.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Parse failure: {0}")]
    ParseFailure(String),

    #[error("Embedding service error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Generation service error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Malformed model output: {0}")]
    MalformedOutput(ValidateError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// The pipeline stage this error originated from.
    pub fn stage(&self) -> &'static str {
        match self {
            AppError::UnsupportedFormat(_) | AppError::ParseFailure(_) => "load",
            AppError::Embedding(_) => "index",
            AppError::Generation(_) => "query",
            AppError::MalformedOutput(_) | AppError::Validation(_) => "validate",
            AppError::Internal(_) => "internal",
        }
    }
}

impl From<ValidateError> for AppError {
    fn from(e: ValidateError) -> Self {
        match e {
            ValidateError::MalformedModelOutput { .. } => AppError::MalformedOutput(e),
            ValidateError::SchemaMismatch { .. } => AppError::Validation(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let stage = self.stage();
        let (status, code, message) = match &self {
            AppError::UnsupportedFormat(msg) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_FORMAT",
                msg.clone(),
            ),
            AppError::ParseFailure(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "PARSE_FAILURE",
                msg.clone(),
            ),
            AppError::Embedding(e) => {
                tracing::error!("Embedding error: {e}");
                (StatusCode::BAD_GATEWAY, "EMBEDDING_ERROR", e.to_string())
            }
            AppError::Generation(e) => {
                tracing::error!("Generation error: {e}");
                let status = match e {
                    GenerationError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
                    GenerationError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
                    _ => StatusCode::BAD_GATEWAY,
                };
                (status, "GENERATION_ERROR", e.to_string())
            }
            AppError::MalformedOutput(e) => {
                tracing::error!("Malformed model output: {e}");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "MALFORMED_MODEL_OUTPUT",
                    e.to_string(),
                )
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "stage": stage,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
