use crate::models::chat::HistoryResponse;
use crate::services::AnswerService;
use crate::utils::error::ApiError;
use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use tracing::debug;

pub async fn history_handler(
    State(answer_service): State<Arc<AnswerService>>,
    Path(session_id): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let history = answer_service.history(&session_id).await?;
    debug!("History for session {}: {} turns", session_id, history.len());

    Ok(Json(HistoryResponse { history }))
}
