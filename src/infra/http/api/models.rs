use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::application::repos::{PriorityCount, StatusCount};
use crate::application::todos::{UserTaskStats, UserTaskStatsRow};
use crate::domain::entities::{TodoRecord, UserRecord};

use super::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    pub content: Option<String>,
    pub deadline: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub created_by: Option<Value>,
    pub assigned_to: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTodoRequest {
    pub content: Option<String>,
    pub deadline: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub created_by: Option<Value>,
    pub assigned_to: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TodosResponse {
    pub todos: Vec<TodoRecord>,
    pub cache: bool,
}

#[derive(Debug, Serialize)]
pub struct TodoCreatedResponse {
    pub message: &'static str,
    pub todo: TodoRecord,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CachedDataResponse<T> {
    pub data: T,
    pub cache: bool,
}

pub type StatusCountsResponse = CachedDataResponse<Vec<StatusCount>>;
pub type PriorityCountsResponse = CachedDataResponse<Vec<PriorityCount>>;
pub type PastDeadlineResponse = CachedDataResponse<Vec<TodoRecord>>;

#[derive(Debug, Serialize)]
pub struct UserTaskStatsResponse {
    #[serde(flatten)]
    pub stats: UserTaskStats,
    pub cache: bool,
}

#[derive(Debug, Serialize)]
pub struct AllUserTaskStatsResponse {
    pub data: Vec<UserTaskStatsRow>,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<UserRecord>,
}

#[derive(Debug, Serialize)]
pub struct UserCreatedResponse {
    pub message: &'static str,
    pub user: UserRecord,
}

/// Reads an optional integer id that may arrive as a JSON number or a numeric string.
pub fn id_field(value: Option<Value>, message: &'static str) -> Result<Option<i32>, ApiError> {
    let parsed = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(number)) => number.as_i64().and_then(|id| i32::try_from(id).ok()),
        Some(Value::String(text)) => text.trim().parse::<i32>().ok(),
        Some(_) => None,
    };
    parsed.map(Some).ok_or_else(|| ApiError::bad_request(message))
}
