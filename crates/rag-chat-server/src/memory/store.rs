use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use super::{ChatTurn, MemoryError};

/// Ordered, append-only turn list of one session
#[async_trait]
pub trait ChatHistoryStore: Send + Sync {
    /// All turns in the order they were appended
    async fn messages(&self) -> Result<Vec<ChatTurn>, MemoryError>;

    async fn append(&self, turn: ChatTurn) -> Result<(), MemoryError> {
        self.append_all(vec![turn]).await
    }

    async fn append_all(&self, turns: Vec<ChatTurn>) -> Result<(), MemoryError>;
}

/// Connector for the durable store. `open` is called on every memory
/// acquisition; it must fail with [`MemoryError::Unavailable`] when the store
/// cannot be reached.
#[async_trait]
pub trait HistoryBackend: Send + Sync {
    async fn open(&self, session_id: &str) -> Result<Box<dyn ChatHistoryStore>, MemoryError>;
}

/// Process-local history used when the durable store is down.
/// Starts empty and is dropped with its handle.
#[derive(Debug, Clone, Default)]
pub struct VolatileChatHistory {
    turns: Arc<Mutex<Vec<ChatTurn>>>,
}

impl VolatileChatHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatHistoryStore for VolatileChatHistory {
    async fn messages(&self) -> Result<Vec<ChatTurn>, MemoryError> {
        Ok(self.turns.lock().clone())
    }

    async fn append_all(&self, turns: Vec<ChatTurn>) -> Result<(), MemoryError> {
        self.turns.lock().extend(turns);
        Ok(())
    }
}
