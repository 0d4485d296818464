use anyhow::{Context, Result};
use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Result<Router> {
    let origin: HeaderValue = state
        .settings
        .cors
        .allowed_origin
        .parse()
        .with_context(|| format!("Invalid CORS origin: {}", state.settings.cors.allowed_origin))?;

    // Credentials forbid wildcards, so methods and headers mirror the preflight.
    // Foreign origins get no Access-Control-Allow-Origin at all.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list([origin]))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request());

    let router = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/chat", post(handlers::chat::chat_handler))
        .route("/history/{session_id}", get(handlers::history::history_handler))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()));

    Ok(router)
}
