//! Route handlers for the JSON API.

mod health;
mod todos;
mod users;

pub use health::health;
pub use todos::{
    all_user_task_stats, create_todo, delete_todo, list_todos, list_user_todos,
    past_deadline, todos_count_by_priority, todos_count_by_status, update_todo,
    user_task_stats,
};
pub use users::{create_user, delete_user, list_users};

use axum::Json;
use axum::extract::rejection::JsonRejection;

use crate::application::repos::RepoError;
use crate::application::todos::TodoError;
use crate::application::users::UserError;

use super::error::ApiError;

pub(crate) const INVALID_ID: &str = "Invalid ID: ID must be a number";

pub(crate) fn parse_id(raw: &str) -> Result<i32, ApiError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| ApiError::bad_request(INVALID_ID))
}

pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    ApiError::internal(err.to_string())
}

pub(crate) fn todo_to_api(err: TodoError) -> ApiError {
    match err {
        TodoError::InvalidInput(message) => ApiError::bad_request(message),
        TodoError::NotFound(message) => ApiError::not_found(message),
        TodoError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn user_to_api(err: UserError) -> ApiError {
    match err {
        UserError::InvalidInput(message) => ApiError::bad_request(message),
        UserError::NotFound => ApiError::not_found("User not found"),
        UserError::InUse { count } => ApiError::conflict(
            "User is referenced by existing todos",
            Some(format!("user is referenced by {count} todos")),
        ),
        UserError::Repo(repo) => repo_to_api(repo),
    }
}
