//! Invalidation plan generation.
//!
//! Maps one committed mutation to the exact set of cache keys whose payload
//! may now be stale.

use std::collections::BTreeSet;
use std::fmt;

use time::OffsetDateTime;

use super::events::TodoChange;
use super::keys::CacheKey;
use crate::domain::entities::TodoRecord;

/// Keys to delete for one mutation, deduplicated and ordered.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InvalidationPlan {
    keys: BTreeSet<CacheKey>,
}

impl fmt::Display for InvalidationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (index, key) in self.keys.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{key}")?;
        }
        f.write_str("]")
    }
}

impl InvalidationPlan {
    /// Computes the plan for `change`; `now` decides past-deadline membership.
    pub fn for_change(change: &TodoChange, now: OffsetDateTime) -> Self {
        let mut plan = Self::default();
        plan.insert(CacheKey::TodosList);

        match change {
            TodoChange::Created(todo) | TodoChange::Deleted(todo) => {
                plan.insert_listings(todo);
                plan.insert(CacheKey::CountByStatus);
                if !todo.status.is_completed() {
                    plan.insert(CacheKey::CountByPriority);
                }
                if todo.is_past_deadline(now) {
                    plan.insert(CacheKey::PastDeadline);
                }
            }
            TodoChange::Updated { previous, current } => {
                plan.insert_listings(previous);
                plan.insert_listings(current);

                let status_changed = previous.status != current.status;
                if status_changed {
                    plan.insert(CacheKey::CountByStatus);
                }

                let was_completed = previous.status.is_completed();
                let is_completed = current.status.is_completed();
                let priority_changed = previous.priority != current.priority;
                if was_completed != is_completed
                    || (priority_changed && !(was_completed && is_completed))
                {
                    plan.insert(CacheKey::CountByPriority);
                }

                if status_changed
                    || previous.deadline != current.deadline
                    || previous.is_past_deadline(now)
                    || current.is_past_deadline(now)
                {
                    plan.insert(CacheKey::PastDeadline);
                }
            }
        }

        plan
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.keys.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CacheKey> {
        self.keys.iter()
    }

    fn insert(&mut self, key: CacheKey) {
        self.keys.insert(key);
    }

    fn insert_listings(&mut self, todo: &TodoRecord) {
        self.insert(CacheKey::TodosCreatedBy(todo.created_by));
        self.insert(CacheKey::TodosAssignedTo(todo.assigned_to));
    }
}
