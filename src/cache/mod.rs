//! Cache-aside read layer and invalidation coordinator.
//!
//! - [`CacheAside`] serves cacheable reads: cache first, store on miss, then
//!   repopulate with a bounded TTL.
//! - [`CacheInvalidator`] deletes the keys an [`InvalidationPlan`] names after
//!   every todo mutation.
//!
//! Backends implement [`CacheStore`]; Redis lives in `infra::redis`,
//! [`MemoryStore`] keeps entries in process.
//!
//! ```toml
//! [cache]
//! backend = "redis"
//! redis_url = "redis://127.0.0.1:6379"
//! ttl_seconds = 60
//! ```

mod config;
mod engine;
mod events;
mod keys;
mod planner;
mod store;
mod trigger;

pub use config::CacheConfig;
pub use engine::{CacheAside, CachePayload, Cached, Lookup};
pub use events::TodoChange;
pub use keys::CacheKey;
pub use planner::InvalidationPlan;
pub use store::{CacheError, CacheStore, MemoryStore};
pub use trigger::{CacheInvalidator, InvalidationOutcome};
