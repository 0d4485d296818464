pub mod answer_service;
pub mod document_store;
pub mod embedding_service;
pub mod llm_service;
pub mod traits;
pub mod vector_store;

pub use answer_service::AnswerService;
pub use document_store::DocumentStore;
pub use embedding_service::EmbeddingService;
pub use llm_service::LlmService;
pub use traits::{EmbeddingProvider, LlmProvider, RetrievedChunk, Retriever};
