//! Cache storage backends.
//!
//! [`CacheStore`] is the narrow contract the cache-aside engine and the
//! invalidation coordinator speak: string keys, JSON text values, per-entry
//! expiry. Redis implements it in `infra::redis`; [`MemoryStore`] keeps
//! entries in process.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use thiserror::Error;
use tracing::warn;

use super::config::CacheConfig;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache connection failed: {0}")]
    Connection(String),
    #[error("cache command `{command}` failed: {message}")]
    Command {
        command: &'static str,
        message: String,
    },
    #[error("cached payload could not be encoded: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CacheError {
    pub fn command(command: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Command {
            command,
            message: err.to_string(),
        }
    }
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set_ex(&self, key: &str, ttl: Duration, value: String) -> Result<(), CacheError>;

    async fn del(&self, key: &str) -> Result<(), CacheError>;
}

struct MemoryEntry {
    value: String,
    expires_at: Instant,
}

/// In-process LRU store with per-entry expiry.
pub struct MemoryStore {
    entries: Mutex<LruCache<String, MemoryEntry>>,
}

impl MemoryStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(config.memory_capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries("len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Recovers a poisoned lock; entries are at worst stale.
    fn entries(&self, op: &'static str) -> MutexGuard<'_, LruCache<String, MemoryEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!(
                target = "taskdesk::cache::store",
                op,
                "memory cache lock poisoned; recovering"
            );
            poisoned.into_inner()
        })
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.entries("get");
        let expired = match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                return Ok(Some(entry.value.clone()));
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
        }
        Ok(None)
    }

    async fn set_ex(&self, key: &str, ttl: Duration, value: String) -> Result<(), CacheError> {
        let entry = MemoryEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries("set_ex").put(key.to_string(), entry);
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.entries("del").pop(key);
        Ok(())
    }
}
