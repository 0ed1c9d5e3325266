use time::OffsetDateTime;
use tracing::info;

use crate::application::repos::{PriorityCount, StatusCount, TodoListFilter};
use crate::cache::{CacheKey, Cached, Lookup};
use crate::domain::entities::TodoRecord;
use crate::domain::types::TodoRole;

use super::service::TodoService;
use super::types::{
    TodoError, UserListing, UserTaskStats, UserTaskStatsRow, completion_rate,
    empty_listing_message,
};

impl TodoService {
    /// Lists every todo, or one user's todos when `listing` is given.
    ///
    /// An empty result is reported as [`TodoError::NotFound`] and is not cached.
    pub async fn list_todos(
        &self,
        listing: Option<UserListing>,
    ) -> Result<Cached<Vec<TodoRecord>>, TodoError> {
        let (key, filter) = match listing {
            None => (CacheKey::TodosList, TodoListFilter::all()),
            Some(UserListing { user_id, role }) => (
                CacheKey::for_role(role, user_id),
                match role {
                    TodoRole::Created => TodoListFilter::created_by(user_id),
                    TodoRole::Assigned => TodoListFilter::assigned_to(user_id),
                },
            ),
        };

        let lookup = self
            .cache
            .read_through(key, || self.reader.list_todos(filter))
            .await?;

        lookup
            .found()
            .ok_or_else(|| TodoError::NotFound(empty_listing_message(listing)))
    }

    pub async fn count_by_status(&self) -> Result<Cached<Vec<StatusCount>>, TodoError> {
        let lookup = self
            .cache
            .read_through(CacheKey::CountByStatus, || self.reader.count_by_status())
            .await?;
        Ok(aggregate(lookup))
    }

    /// Counts of non-completed todos per priority.
    pub async fn count_by_priority(&self) -> Result<Cached<Vec<PriorityCount>>, TodoError> {
        let lookup = self
            .cache
            .read_through(CacheKey::CountByPriority, || {
                self.reader.count_open_by_priority()
            })
            .await?;
        Ok(aggregate(lookup))
    }

    pub async fn past_deadline(&self) -> Result<Cached<Vec<TodoRecord>>, TodoError> {
        let now = OffsetDateTime::now_utc();
        let lookup = self
            .cache
            .read_through(CacheKey::PastDeadline, || self.reader.list_past_deadline(now))
            .await?;
        Ok(aggregate(lookup))
    }

    /// Live per-user counts; never cached.
    pub async fn user_task_stats(&self, user_id: i32) -> Result<UserTaskStats, TodoError> {
        let (assigned, completed) = futures::try_join!(
            self.reader.count_assigned(user_id),
            self.reader.count_completed(user_id)
        )?;

        info!(user_id, assigned, completed, "fetched user task stats");
        Ok(UserTaskStats {
            assigned_tasks: assigned,
            completed_tasks: completed,
            completion_rate: completion_rate(assigned, completed),
        })
    }

    pub async fn all_user_task_stats(&self) -> Result<Vec<UserTaskStatsRow>, TodoError> {
        let rows = self.reader.list_user_task_counts().await?;

        Ok(rows
            .into_iter()
            .map(|row| UserTaskStatsRow {
                user_id: row.user_id,
                user_name: row.user_name,
                assigned_tasks: row.assigned,
                completed_tasks: row.completed,
                completion_rate: completion_rate(row.assigned, row.completed),
            })
            .collect())
    }
}

/// Aggregates answer an empty result with an uncached empty payload.
fn aggregate<T>(lookup: Lookup<Vec<T>>) -> Cached<Vec<T>> {
    match lookup {
        Lookup::Found(cached) => cached,
        Lookup::Empty => Cached {
            value: Vec::new(),
            cache: false,
        },
    }
}
