use serde::Serialize;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::application::repos::RepoError;
use crate::domain::types::{TodoPriority, TodoRole, TodoStatus};

pub const TODO_NOT_FOUND: &str = "Todo not found";

#[derive(Debug, Error)]
pub enum TodoError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl TodoError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

/// Raw create payload; validated by [`super::TodoService::create_todo`].
#[derive(Debug, Clone, Default)]
pub struct CreateTodoCommand {
    pub content: Option<String>,
    pub deadline: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub created_by: Option<i32>,
    pub assigned_to: Option<i32>,
}

/// Raw partial update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateTodoCommand {
    pub id: i32,
    pub content: Option<String>,
    pub deadline: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub created_by: Option<i32>,
    pub assigned_to: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTaskStats {
    pub assigned_tasks: i64,
    pub completed_tasks: i64,
    pub completion_rate: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTaskStatsRow {
    pub user_id: i32,
    pub user_name: String,
    pub assigned_tasks: i64,
    pub completed_tasks: i64,
    pub completion_rate: i64,
}

/// Per-user todo listing, as requested by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserListing {
    pub user_id: i32,
    pub role: TodoRole,
}

pub(crate) fn empty_listing_message(listing: Option<UserListing>) -> String {
    match listing {
        None => "No todos found".to_string(),
        Some(UserListing { user_id, role }) => {
            format!("No {role} todos found for user {user_id}")
        }
    }
}

/// Percentage of assigned todos that are completed, rounded up.
pub fn completion_rate(assigned: i64, completed: i64) -> i64 {
    if assigned <= 0 {
        return 0;
    }
    let scaled = completed.max(0) * 100;
    (scaled + assigned - 1) / assigned
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_deadline(value: &str) -> Result<OffsetDateTime, TodoError> {
    let value = value.trim();
    if let Ok(timestamp) = OffsetDateTime::parse(value, &Rfc3339) {
        return Ok(timestamp);
    }
    Date::parse(value, format_description!("[year]-[month]-[day]"))
        .map(|date| date.midnight().assume_utc())
        .map_err(|_| TodoError::invalid("Deadline must be a valid date"))
}

pub fn parse_status(value: &str) -> Result<TodoStatus, TodoError> {
    value
        .parse()
        .map_err(|_| TodoError::invalid("Invalid status"))
}

pub fn parse_priority(value: &str) -> Result<TodoPriority, TodoError> {
    value
        .parse()
        .map_err(|_| TodoError::invalid("Priority must be 'low', 'medium', or 'high'"))
}

pub(crate) fn ensure_content(value: &str, message: &'static str) -> Result<String, TodoError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TodoError::invalid(message));
    }
    Ok(value.to_string())
}
