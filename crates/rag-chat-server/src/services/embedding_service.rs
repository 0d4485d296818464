use crate::config::EmbeddingConfig;
use anyhow::{anyhow, bail, Context, Result};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::traits::EmbeddingProvider;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Clone)]
pub struct EmbeddingService {
    client: Client,
    base_url: String,
    model: String,
    dimension: Option<usize>,
}

impl EmbeddingService {
    pub fn new(config: &EmbeddingConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dimension: config.dimension,
        }
    }

    async fn embed_internal(&self, text: &str) -> Result<Vec<f32>> {
        debug!("Generating embedding for {} chars", text.len());

        let request = EmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        let url = format!("{}/api/embeddings", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to connect to embedding server")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("Embedding API error ({}): {}", status, body);
        }

        let json_value: Value = response
            .json()
            .await
            .context("Failed to parse embedding response as JSON")?;

        let embedding = parse_embedding(&json_value)?;

        if embedding.is_empty() {
            bail!("Generated embedding is empty");
        }

        if let Some(expected) = self.dimension {
            if embedding.len() != expected {
                bail!(
                    "Embedding dimension mismatch: expected {}, got {}",
                    expected,
                    embedding.len()
                );
            }
        }

        Ok(embedding)
    }
}

/// Accepts `{"embedding": [...]}`, `{"data": [{"embedding": [...]}]}`,
/// `[{"embedding": [...]}]` and a bare `[...]`.
fn parse_embedding(value: &Value) -> Result<Vec<f32>> {
    let vector = match value {
        Value::Object(obj) => match (obj.get("embedding"), obj.get("data")) {
            (Some(Value::Array(values)), _) => values,
            (_, Some(Value::Array(data))) => match data.first().and_then(|d| d.get("embedding")) {
                Some(Value::Array(values)) => values,
                _ => bail!("Unrecognized embedding response format: {}", value),
            },
            _ => bail!("Unrecognized embedding response format: {}", value),
        },
        Value::Array(arr) => match arr.first() {
            None => bail!("Empty array returned from embedding server"),
            Some(Value::Object(first)) => match first.get("embedding") {
                Some(Value::Array(values)) => values,
                _ => bail!("Unrecognized embedding response format: {}", value),
            },
            Some(_) => arr,
        },
        _ => bail!("Unrecognized embedding response format: {}", value),
    };

    vector
        .iter()
        .enumerate()
        .map(|(i, v)| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| anyhow!("Non-numeric embedding value at index {}: {}", i, v))
        })
        .collect()
}

#[async_trait::async_trait]
impl EmbeddingProvider for EmbeddingService {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_internal(text).await
    }
}
