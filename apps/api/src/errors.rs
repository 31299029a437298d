use avni_common::AnalysisErrorBody;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            // Every failure, including an unusable body, shares one 500 body
            // that still carries renderable placeholder lists.
            AppError::Validation(msg) => {
                tracing::warn!("Rejected analysis request: {msg}");
                analysis_failure(msg.clone())
            }
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                analysis_failure(e.to_string())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                analysis_failure(e.to_string())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                analysis_failure(e.to_string())
            }
        }
    }
}

fn analysis_failure(message: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(AnalysisErrorBody::new(message)),
    )
        .into_response()
}
