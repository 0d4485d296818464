use axum::extract::FromRef;
use std::sync::Arc;

use crate::config::Settings;
use crate::services::AnswerService;

/// Application context, built once at startup and shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub answer_service: Arc<AnswerService>,
}

impl AppState {
    pub fn new(settings: Settings, answer_service: AnswerService) -> Self {
        Self {
            settings: Arc::new(settings),
            answer_service: Arc::new(answer_service),
        }
    }
}

impl FromRef<AppState> for Arc<AnswerService> {
    fn from_ref(state: &AppState) -> Self {
        state.answer_service.clone()
    }
}

impl FromRef<AppState> for Arc<Settings> {
    fn from_ref(state: &AppState) -> Self {
        state.settings.clone()
    }
}
