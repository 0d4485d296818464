use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ChatHistoryStore, ChatTurn, HistoryBackend, MemoryError, Role};
use crate::config::RedisConfig;

/// Durable history backed by Redis lists.
///
/// Key `{prefix}{session_id}`, one `{"type": "human"|"ai"|"system", "data": {"content": ..}}`
/// record per turn, newest first (LPUSH).
pub struct RedisHistoryBackend {
    client: redis::Client,
    key_prefix: String,
    ttl_seconds: Option<i64>,
}

impl RedisHistoryBackend {
    /// Only validates the URL; no connection is made here
    pub fn new(config: &RedisConfig) -> Result<Self, MemoryError> {
        let client = redis::Client::open(config.url.as_str())?;
        Ok(Self {
            client,
            key_prefix: config.key_prefix.clone(),
            ttl_seconds: config.ttl_seconds,
        })
    }

    pub fn session_key(&self, session_id: &str) -> String {
        format!("{}{}", self.key_prefix, session_id)
    }
}

#[async_trait]
impl HistoryBackend for RedisHistoryBackend {
    async fn open(&self, session_id: &str) -> Result<Box<dyn ChatHistoryStore>, MemoryError> {
        let conn = self.client.get_multiplexed_async_connection().await?;
        let key = self.session_key(session_id);
        debug!("Opened Redis chat history at key {}", key);

        Ok(Box::new(RedisChatHistory {
            conn,
            key,
            ttl_seconds: self.ttl_seconds,
        }))
    }
}

pub struct RedisChatHistory {
    conn: MultiplexedConnection,
    key: String,
    ttl_seconds: Option<i64>,
}

#[async_trait]
impl ChatHistoryStore for RedisChatHistory {
    async fn messages(&self) -> Result<Vec<ChatTurn>, MemoryError> {
        let mut conn = self.conn.clone();
        let records: Vec<String> = conn.lrange(&self.key, 0, -1).await?;

        // LPUSH stores newest first
        records.iter().rev().map(|r| decode_record(r)).collect()
    }

    async fn append_all(&self, turns: Vec<ChatTurn>) -> Result<(), MemoryError> {
        if turns.is_empty() {
            return Ok(());
        }

        let records = turns
            .iter()
            .map(encode_record)
            .collect::<Result<Vec<String>, MemoryError>>()?;

        let mut conn = self.conn.clone();
        // A single LPUSH keeps the turns of one exchange adjacent
        let _: () = conn.lpush(&self.key, records).await?;

        if let Some(ttl) = self.ttl_seconds {
            let _: () = conn.expire(&self.key, ttl).await?;
        }

        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredMessage {
    #[serde(rename = "type")]
    kind: String,
    data: StoredData,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredData {
    content: String,
}

fn stored_kind(role: Role) -> &'static str {
    match role {
        Role::User => "human",
        Role::Assistant => "ai",
        Role::System => "system",
    }
}

fn encode_record(turn: &ChatTurn) -> Result<String, MemoryError> {
    let record = StoredMessage {
        kind: stored_kind(turn.role()).to_string(),
        data: StoredData {
            content: turn.content().to_string(),
        },
    };
    Ok(serde_json::to_string(&record)?)
}

fn decode_record(raw: &str) -> Result<ChatTurn, MemoryError> {
    let record: StoredMessage = serde_json::from_str(raw)?;
    let role = match record.kind.as_str() {
        "human" => Role::User,
        "ai" => Role::Assistant,
        "system" => Role::System,
        other => {
            return Err(MemoryError::Store(format!(
                "Unknown message type in history: {}",
                other
            )))
        }
    };
    Ok(ChatTurn::new(role, record.data.content))
}
