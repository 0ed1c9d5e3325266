//! Cache key definitions.
//!
//! Every key string written to the cache store is rendered from [`CacheKey`].
//! Each query shape owns a distinct prefix so keys of different shapes never
//! collide.

use std::fmt;

use crate::domain::types::TodoRole;

/// Identifies one cacheable read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CacheKey {
    /// Every todo, unfiltered.
    TodosList,
    /// Todos created by a user.
    TodosCreatedBy(i32),
    /// Todos assigned to a user.
    TodosAssignedTo(i32),
    /// Todo counts grouped by status.
    CountByStatus,
    /// Non-completed todo counts grouped by priority.
    CountByPriority,
    /// Todos whose deadline has passed.
    PastDeadline,
}

impl CacheKey {
    /// Per-user listing key for the given role.
    pub fn for_role(role: TodoRole, user_id: i32) -> Self {
        match role {
            TodoRole::Created => CacheKey::TodosCreatedBy(user_id),
            TodoRole::Assigned => CacheKey::TodosAssignedTo(user_id),
        }
    }

    /// Low-cardinality label used for metrics; user ids are dropped.
    pub fn query_name(&self) -> &'static str {
        match self {
            CacheKey::TodosList => "todos_list",
            CacheKey::TodosCreatedBy(_) => "todos_list_created_by",
            CacheKey::TodosAssignedTo(_) => "todos_list_assigned_to",
            CacheKey::CountByStatus => "todos_count_by_status",
            CacheKey::CountByPriority => "todos_count_by_priority",
            CacheKey::PastDeadline => "todos_past_deadline",
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::TodosCreatedBy(user_id) | CacheKey::TodosAssignedTo(user_id) => {
                write!(f, "{}_{}", self.query_name(), user_id)
            }
            _ => f.write_str(self.query_name()),
        }
    }
}
