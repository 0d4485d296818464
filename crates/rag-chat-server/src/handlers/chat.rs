use crate::config::Settings;
use crate::models::chat::{ChatRequest, ChatResponse};
use crate::services::AnswerService;
use crate::utils::error::ApiError;
use axum::{extract::State, Json};
use std::sync::Arc;
use tracing::{debug, info};

pub async fn chat_handler(
    State(answer_service): State<Arc<AnswerService>>,
    State(settings): State<Arc<Settings>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if request.question.trim().is_empty() {
        debug!("Rejecting blank question (session_id={:?})", request.session_id);
        return Err(ApiError::BadRequest("question must not be empty".to_string()));
    }

    let session_id = match request.session_id {
        Some(id) => id,
        None => {
            debug!(
                "No session_id supplied, using shared session '{}'",
                settings.session.default_session_id
            );
            settings.session.default_session_id.clone()
        }
    };

    info!(
        "Chat request: session={}, question_len={}",
        session_id,
        request.question.len()
    );

    let answer = answer_service.answer(&request.question, &session_id).await?;

    Ok(Json(ChatResponse { answer }))
}
