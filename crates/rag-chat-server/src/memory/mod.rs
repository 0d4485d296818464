//! Session-scoped chat memory.
//!
//! A [`MemoryProvider`] hands out one [`MemoryHandle`] per call. The handle is
//! backed by the durable history store when it can be reached, and by a
//! fresh process-local list when the store is down (connection errors only).
//! Handles are never cached, so every call re-checks the durable store.

mod error;
mod provider;
pub mod redis_store;
mod store;
mod types;

pub use error::MemoryError;
pub use provider::{MemoryHandle, MemoryProvider, MemoryTier};
pub use redis_store::{RedisChatHistory, RedisHistoryBackend};
pub use store::{ChatHistoryStore, HistoryBackend, VolatileChatHistory};
pub use types::{ChatTurn, Role};
