//! Invalidation coordinator.
//!
//! Mutations call [`CacheInvalidator::todo_changed`] after the store write and
//! before responding. Every planned key is deleted concurrently and all deletes
//! are awaited. Failed deletes are reported, never raised.

use std::sync::Arc;

use futures::future::join_all;
use metrics::counter;
use time::OffsetDateTime;
use tracing::{debug, warn};

use super::events::TodoChange;
use super::keys::CacheKey;
use super::planner::InvalidationPlan;
use super::store::CacheStore;

/// Result of applying an [`InvalidationPlan`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InvalidationOutcome {
    pub deleted: Vec<CacheKey>,
    pub failed: Vec<CacheKey>,
}

impl InvalidationOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Clone)]
pub struct CacheInvalidator {
    store: Arc<dyn CacheStore>,
}

impl CacheInvalidator {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Plans and applies invalidation for one committed mutation.
    pub async fn todo_changed(&self, change: &TodoChange) -> InvalidationOutcome {
        let plan = InvalidationPlan::for_change(change, OffsetDateTime::now_utc());
        debug!(
            target = "taskdesk::cache::trigger",
            change = change.kind(),
            todo_id = change.todo_id(),
            keys = %plan,
            "invalidating cache keys"
        );
        self.apply(&plan).await
    }

    pub async fn apply(&self, plan: &InvalidationPlan) -> InvalidationOutcome {
        let deletes = plan.iter().map(|key| {
            let store = Arc::clone(&self.store);
            let key = *key;
            async move {
                let rendered = key.to_string();
                (key, store.del(&rendered).await)
            }
        });

        let mut outcome = InvalidationOutcome::default();
        for (key, result) in join_all(deletes).await {
            match result {
                Ok(()) => {
                    counter!("taskdesk_cache_invalidation_total", "query" => key.query_name())
                        .increment(1);
                    outcome.deleted.push(key);
                }
                Err(err) => {
                    counter!(
                        "taskdesk_cache_invalidation_failed_total",
                        "query" => key.query_name()
                    )
                    .increment(1);
                    warn!(
                        target = "taskdesk::cache::trigger",
                        key = %key,
                        error = %err,
                        "failed to invalidate cache key"
                    );
                    outcome.failed.push(key);
                }
            }
        }
        outcome
    }
}
