//! In-process shared store.
//!
//! Entries live in a sharded `DashMap`; each entry carries an absolute expiry
//! evaluated lazily against the injected clock. The shard lock held by the
//! entry API makes increment-and-expire atomic.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::clock::Clock;
use crate::store::{SharedStore, StoreError, StoreResult};

#[derive(Debug, Clone)]
enum StoredValue {
    Counter(u64),
    Text(String),
}

#[derive(Debug, Clone)]
struct StoredEntry {
    value: StoredValue,
    expires_at: Duration,
}

impl StoredEntry {
    fn is_live(&self, now: Duration) -> bool {
        now < self.expires_at
    }
}

/// Shared store backed by process memory.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, StoredEntry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            clock,
        }
    }

    /// Number of entries currently held, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired entry.
    pub fn purge_expired(&self) {
        let now = self.clock.now();
        self.entries.retain(|_, entry| entry.is_live(now));
    }
}

#[async_trait]
impl SharedStore for MemoryStore {
    async fn increment_and_expire(&self, key: &str, ttl: Duration) -> StoreResult<u64> {
        let now = self.clock.now();
        let expires_at = now.saturating_add(ttl);

        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                let current = if entry.is_live(now) {
                    match &entry.value {
                        StoredValue::Counter(n) => *n,
                        StoredValue::Text(s) => s
                            .parse::<u64>()
                            .map_err(|_| StoreError::WrongType(key.to_string()))?,
                    }
                } else {
                    0
                };
                let next = current + 1;
                entry.value = StoredValue::Counter(next);
                entry.expires_at = expires_at;
                Ok(next)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(StoredEntry {
                    value: StoredValue::Counter(1),
                    expires_at,
                });
                Ok(1)
            }
        }
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let now = self.clock.now();
        let value = self.entries.get(key).and_then(|entry| {
            if !entry.is_live(now) {
                return None;
            }
            Some(match &entry.value {
                StoredValue::Counter(n) => n.to_string(),
                StoredValue::Text(s) => s.clone(),
            })
        });
        if value.is_none() {
            self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        }
        Ok(value)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        let expires_at = self.clock.now().saturating_add(ttl);
        self.entries.insert(
            key.to_string(),
            StoredEntry {
                value: StoredValue::Text(value.to_string()),
                expires_at,
            },
        );
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
