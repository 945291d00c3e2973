//! Shared key-value store subsystem.
//!
//! # Data Flow
//! ```text
//! Rate limiter ──increment_and_expire──┐
//! Result cache ──get / set_with_ttl────┼──▶ SharedStore ──▶ Redis (multi-instance)
//! Health probe ──ping──────────────────┘                └──▶ in-memory (single instance, tests)
//! ```
//!
//! # Design Decisions
//! - One trait, two backends; callers hold `Arc<dyn SharedStore>`
//! - Increment and expiry are one atomic unit on every backend
//! - Unreachable store is an error, never a silent allow/deny

pub mod memory;
pub mod redis;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

/// Errors surfaced by a shared store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backing store could not be reached or did not answer in time.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Operation hit a key holding a value of another type.
    #[error("wrong value type at key '{0}'")]
    WrongType(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Key-value operations shared by every service instance.
#[async_trait]
pub trait SharedStore: Send + Sync {
    /// Atomically increment the counter at `key` (starting from 0) and reset
    /// its time-to-live, returning the post-increment value.
    async fn increment_and_expire(&self, key: &str, ttl: Duration) -> StoreResult<u64>;

    /// Read a live value.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Replace the value and time-to-live at `key`.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()>;

    /// Check that the store is reachable.
    async fn ping(&self) -> StoreResult<()>;
}
