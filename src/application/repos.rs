//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::entities::{TodoRecord, UserRecord};
use crate::domain::types::{TodoPriority, TodoStatus};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Narrows a todo listing to one user reference. Both unset lists everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TodoListFilter {
    pub created_by: Option<i32>,
    pub assigned_to: Option<i32>,
}

impl TodoListFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn created_by(user_id: i32) -> Self {
        Self {
            created_by: Some(user_id),
            assigned_to: None,
        }
    }

    pub fn assigned_to(user_id: i32) -> Self {
        Self {
            created_by: None,
            assigned_to: Some(user_id),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateTodoParams {
    pub content: String,
    pub deadline: OffsetDateTime,
    pub status: TodoStatus,
    pub priority: TodoPriority,
    pub created_by: i32,
    pub assigned_to: i32,
}

/// Partial update; `None` leaves the stored column untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateTodoParams {
    pub id: i32,
    pub content: Option<String>,
    pub deadline: Option<OffsetDateTime>,
    pub status: Option<TodoStatus>,
    pub priority: Option<TodoPriority>,
    pub created_by: Option<i32>,
    pub assigned_to: Option<i32>,
}

/// Row images on both sides of an update, read inside the same transaction.
#[derive(Debug, Clone)]
pub struct TodoUpdate {
    pub previous: TodoRecord,
    pub current: TodoRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: TodoStatus,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityCount {
    pub priority: TodoPriority,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTaskCounts {
    pub user_id: i32,
    pub user_name: String,
    pub assigned: i64,
    pub completed: i64,
}

#[async_trait]
pub trait TodosRepo: Send + Sync {
    async fn list_todos(&self, filter: TodoListFilter) -> Result<Vec<TodoRecord>, RepoError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<TodoRecord>, RepoError>;

    async fn count_by_status(&self) -> Result<Vec<StatusCount>, RepoError>;

    /// Counts per priority, excluding completed todos.
    async fn count_open_by_priority(&self) -> Result<Vec<PriorityCount>, RepoError>;

    async fn list_past_deadline(
        &self,
        now: OffsetDateTime,
    ) -> Result<Vec<TodoRecord>, RepoError>;

    async fn count_assigned(&self, user_id: i32) -> Result<i64, RepoError>;

    async fn count_completed(&self, user_id: i32) -> Result<i64, RepoError>;

    async fn list_user_task_counts(&self) -> Result<Vec<UserTaskCounts>, RepoError>;
}

#[async_trait]
pub trait TodosWriteRepo: Send + Sync {
    async fn create_todo(&self, params: CreateTodoParams) -> Result<TodoRecord, RepoError>;

    /// Fails with [`RepoError::NotFound`] when no todo has `params.id`.
    async fn update_todo(&self, params: UpdateTodoParams) -> Result<TodoUpdate, RepoError>;

    /// Returns the row as it was before removal.
    async fn delete_todo(&self, id: i32) -> Result<TodoRecord, RepoError>;
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<UserRecord>, RepoError>;

    async fn list_users(&self) -> Result<Vec<UserRecord>, RepoError>;

    async fn create_user(&self, name: &str) -> Result<UserRecord, RepoError>;

    /// Number of todos that reference the user as creator or assignee.
    async fn count_references(&self, id: i32) -> Result<u64, RepoError>;

    async fn delete_user(&self, id: i32) -> Result<(), RepoError>;
}

#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
