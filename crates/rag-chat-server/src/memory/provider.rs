use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{ChatHistoryStore, ChatTurn, HistoryBackend, MemoryError, VolatileChatHistory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryTier {
    Durable,
    Volatile,
}

impl MemoryTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Durable => "durable",
            Self::Volatile => "volatile",
        }
    }
}

/// Memory of one session, tagged with the tier that backs it
pub enum MemoryHandle {
    Durable(Box<dyn ChatHistoryStore>),
    Volatile(VolatileChatHistory),
}

impl MemoryHandle {
    pub fn tier(&self) -> MemoryTier {
        match self {
            Self::Durable(_) => MemoryTier::Durable,
            Self::Volatile(_) => MemoryTier::Volatile,
        }
    }

    fn store(&self) -> &dyn ChatHistoryStore {
        match self {
            Self::Durable(store) => store.as_ref(),
            Self::Volatile(store) => store,
        }
    }

    pub async fn messages(&self) -> Result<Vec<ChatTurn>, MemoryError> {
        self.store().messages().await
    }

    pub async fn append(&self, turn: ChatTurn) -> Result<(), MemoryError> {
        self.store().append(turn).await
    }

    /// Record one question/answer pair, user turn first
    pub async fn append_exchange(&self, question: &str, answer: &str) -> Result<(), MemoryError> {
        self.store()
            .append_all(vec![ChatTurn::user(question), ChatTurn::assistant(answer)])
            .await
    }
}

impl fmt::Debug for MemoryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MemoryHandle").field(&self.tier()).finish()
    }
}

/// Hands out session memory, degrading to a volatile list when the durable
/// store cannot be reached.
///
/// Each call re-evaluates the durable store, so two calls for the same session
/// can land on different tiers and see different histories while the store
/// is flapping. Volatile handles are never shared between calls.
#[derive(Clone)]
pub struct MemoryProvider {
    backend: Arc<dyn HistoryBackend>,
}

impl MemoryProvider {
    pub fn new(backend: Arc<dyn HistoryBackend>) -> Self {
        Self { backend }
    }

    pub async fn acquire(&self, session_id: &str) -> Result<MemoryHandle, MemoryError> {
        match self.backend.open(session_id).await {
            Ok(store) => {
                debug!(session_id, "Using durable chat history");
                Ok(MemoryHandle::Durable(store))
            }
            Err(MemoryError::Unavailable(reason)) => {
                warn!(
                    session_id,
                    %reason,
                    "⚠️ Durable chat history unavailable, using in-memory fallback"
                );
                Ok(MemoryHandle::Volatile(VolatileChatHistory::new()))
            }
            Err(e) => Err(e),
        }
    }
}
