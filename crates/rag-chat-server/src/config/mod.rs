pub mod settings;

pub use settings::{
    CorsConfig, DocumentConfig, EmbeddingConfig, LlmConfig, PromptsConfig, RagConfig,
    RedisConfig, ServerConfig, SessionConfig, Settings,
};
