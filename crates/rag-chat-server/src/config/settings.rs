use anyhow::{bail, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub redis: RedisConfig,
    pub session: SessionConfig,
    pub document: DocumentConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    pub rag: RagConfig,
    pub prompts: PromptsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CorsConfig {
    /// The single web frontend allowed to call the API
    pub allowed_origin: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origin: "http://localhost:3000".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RedisConfig {
    pub url: String,
    pub key_prefix: String,
    /// Refreshed on every append when set; history never expires otherwise
    pub ttl_seconds: Option<i64>,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            key_prefix: "message_store:".to_string(),
            ttl_seconds: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SessionConfig {
    /// Session used when a chat request carries no session_id.
    /// Every unlabeled caller shares this one history.
    pub default_session_id: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_session_id: "default".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct DocumentConfig {
    pub path: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            path: "./sew_docs/sew_docs.pdf".to_string(),
            chunk_size: 1000,
            chunk_overlap: 50,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
    pub dimension: Option<usize>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "mxbai-embed-large".to_string(),
            dimension: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
    pub timeout_seconds: Option<u64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            max_tokens: 1024,
            temperature: 0.7,
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RagConfig {
    pub retrieval_top_k: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self { retrieval_top_k: 4 }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PromptsConfig {
    /// Placeholders: {chat_history}, {question}
    pub condense_question_prompt: String,
    /// Placeholders: {context}, {question}
    pub qa_prompt: String,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            condense_question_prompt: "Given the following conversation and a follow up question, \
                rephrase the follow up question to be a standalone question, in its original language.\n\n\
                Chat History:\n{chat_history}\nFollow Up Input: {question}\nStandalone question:"
                .to_string(),
            qa_prompt: "Use the following pieces of context to answer the question at the end. \
                If you don't know the answer, just say that you don't know, don't try to make up an answer.\n\n\
                {context}\n\nQuestion: {question}\nHelpful Answer:"
                .to_string(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::with_name("config/settings").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.document.chunk_size == 0 {
            bail!("document.chunk_size must be greater than zero");
        }
        if self.document.chunk_overlap >= self.document.chunk_size {
            bail!(
                "document.chunk_overlap ({}) must be smaller than document.chunk_size ({})",
                self.document.chunk_overlap,
                self.document.chunk_size
            );
        }
        if self.rag.retrieval_top_k == 0 {
            bail!("rag.retrieval_top_k must be greater than zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.session.default_session_id, "default");
        assert_eq!(settings.document.chunk_size, 1000);
        assert_eq!(settings.document.chunk_overlap, 50);
        assert_eq!(settings.cors.allowed_origin, "http://localhost:3000");
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk() {
        let mut settings = Settings::default();
        settings.document.chunk_overlap = settings.document.chunk_size;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::builder()
            .add_source(Config::try_from(&Settings::default()).unwrap())
            .add_source(File::from_str(
                "[redis]\nurl = \"redis://cache:6380\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();

        let settings: Settings = config.try_deserialize().unwrap();
        assert_eq!(settings.redis.url, "redis://cache:6380");
        assert_eq!(settings.redis.key_prefix, "message_store:");
        assert_eq!(settings.llm.model, "llama3");
    }
}
