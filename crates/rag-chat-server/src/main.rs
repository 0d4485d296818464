use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use rag_chat_server::config::Settings;
use rag_chat_server::memory::{MemoryProvider, RedisHistoryBackend};
use rag_chat_server::services::{AnswerService, DocumentStore, EmbeddingService, LlmService};
use rag_chat_server::utils::init_logger;
use rag_chat_server::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration (.env is read here too, before RUST_LOG is consulted)
    let settings = Settings::load()?;

    let _log_guard = init_logger()?;
    info!("🚀 Starting RAG Chat Server...");
    info!("✅ Configuration loaded");

    // External capabilities
    let embedding_service = Arc::new(EmbeddingService::new(&settings.embedding));
    let llm_service = Arc::new(LlmService::new(settings.llm.clone())?);

    // Document index is built before serving and never changes afterwards
    let document_store = DocumentStore::build(
        &settings.document,
        embedding_service,
        settings.rag.retrieval_top_k,
    )
    .await?;
    info!(
        "✅ Document store ready: {} ({} chunks)",
        settings.document.path,
        document_store.chunk_count()
    );

    let history_backend = RedisHistoryBackend::new(&settings.redis)?;
    let memory = MemoryProvider::new(Arc::new(history_backend));
    info!("✅ Chat history backend: {}", settings.redis.url);

    let answer_service = AnswerService::new(
        Arc::new(document_store),
        llm_service,
        memory,
        settings.prompts.clone(),
    );

    let addr = SocketAddr::from((
        settings.server.host.parse::<std::net::IpAddr>()?,
        settings.server.port,
    ));

    let app = build_router(AppState::new(settings, answer_service))?;

    info!("🎯 Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
