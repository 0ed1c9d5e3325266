//! Cache-aside read path.
//!
//! A read tries the cache first. A usable entry is returned without touching
//! the store. Anything else (absent entry, backend failure, undecodable
//! payload) falls through to the loader, whose non-empty result is written
//! back with the configured TTL. Concurrent misses may both load and both
//! write; the last write wins.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::config::CacheConfig;
use super::keys::CacheKey;
use super::store::{CacheError, CacheStore};

/// A value tagged with whether it was served from the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cached<T> {
    pub value: T,
    pub cache: bool,
}

/// Outcome of a cache-aside read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(Cached<T>),
    /// The store returned nothing; nothing was cached.
    Empty,
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<Cached<T>> {
        match self {
            Lookup::Found(cached) => Some(cached),
            Lookup::Empty => None,
        }
    }
}

/// Payloads the engine can cache.
pub trait CachePayload: Serialize + DeserializeOwned + Send {
    /// Empty results are never written to the cache.
    fn is_empty_result(&self) -> bool;
}

impl<T> CachePayload for Vec<T>
where
    T: Serialize + DeserializeOwned + Send,
{
    fn is_empty_result(&self) -> bool {
        self.is_empty()
    }
}

#[derive(Clone)]
pub struct CacheAside {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl CacheAside {
    pub fn new(store: Arc<dyn CacheStore>, config: &CacheConfig) -> Self {
        Self {
            store,
            ttl: config.ttl,
        }
    }

    pub async fn read_through<T, E, F, Fut>(&self, key: CacheKey, load: F) -> Result<Lookup<T>, E>
    where
        T: CachePayload,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let rendered = key.to_string();
        let query = key.query_name();

        if let Some(value) = self.cached_value::<T>(&rendered, query).await {
            counter!("taskdesk_cache_hit_total", "query" => query).increment(1);
            debug!(target = "taskdesk::cache::engine", key = %rendered, "cache hit");
            return Ok(Lookup::Found(Cached { value, cache: true }));
        }

        counter!("taskdesk_cache_miss_total", "query" => query).increment(1);
        debug!(target = "taskdesk::cache::engine", key = %rendered, "cache miss");

        let value = load().await?;
        if value.is_empty_result() {
            return Ok(Lookup::Empty);
        }

        if let Err(err) = self.populate(&rendered, &value).await {
            counter!("taskdesk_cache_degraded_total", "query" => query, "op" => "set_ex")
                .increment(1);
            warn!(
                target = "taskdesk::cache::engine",
                key = %rendered,
                error = %err,
                "failed to populate cache entry"
            );
        }

        Ok(Lookup::Found(Cached {
            value,
            cache: false,
        }))
    }

    async fn cached_value<T: CachePayload>(&self, key: &str, query: &'static str) -> Option<T> {
        let raw = match self.store.get(key).await {
            Ok(raw) => raw?,
            Err(err) => {
                counter!("taskdesk_cache_degraded_total", "query" => query, "op" => "get")
                    .increment(1);
                warn!(
                    target = "taskdesk::cache::engine",
                    key,
                    error = %err,
                    "cache read failed; loading from store"
                );
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                counter!("taskdesk_cache_degraded_total", "query" => query, "op" => "decode")
                    .increment(1);
                warn!(
                    target = "taskdesk::cache::engine",
                    key,
                    error = %err,
                    "cached payload could not be decoded; loading from store"
                );
                None
            }
        }
    }

    async fn populate<T: CachePayload>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let payload = serde_json::to_string(value)?;
        self.store.set_ex(key, self.ttl, payload).await
    }
}
