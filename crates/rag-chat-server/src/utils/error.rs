use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::memory::MemoryError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Chat history error: {0}")]
    Memory(#[from] MemoryError),

    #[error("Retrieval error: {0}")]
    RetrievalError(String),

    #[error("LLM error: {0}")]
    LlmError(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::LlmError(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Memory(_) | ApiError::RetrievalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_type = match &self {
            ApiError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                "BadRequest"
            }
            ApiError::Memory(e) => {
                tracing::error!("Chat history error: {}", e);
                "MemoryError"
            }
            ApiError::RetrievalError(msg) => {
                tracing::error!("Retrieval error: {}", msg);
                "RetrievalError"
            }
            ApiError::LlmError(msg) => {
                tracing::error!("LLM error: {}", msg);
                "LlmError"
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}
