//! Todo handlers

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::todos::{CreateTodoCommand, UpdateTodoCommand, UserListing};
use crate::domain::types::TodoRole;

use super::{json_body, parse_id, todo_to_api};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

const INVALID_TYPE: &str = "Invalid type: Use 'created' or 'assigned'";

pub async fn list_todos(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let cached = state.todos.list_todos(None).await.map_err(todo_to_api)?;

    Ok(Json(TodosResponse {
        todos: cached.value,
        cache: cached.cache,
    }))
}

pub async fn list_user_todos(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
    Query(query): Query<UserListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = parse_id(&user_id)?;
    let role = query
        .kind
        .as_deref()
        .and_then(|kind| kind.parse::<TodoRole>().ok())
        .ok_or_else(|| ApiError::bad_request(INVALID_TYPE))?;

    let cached = state
        .todos
        .list_todos(Some(UserListing { user_id, role }))
        .await
        .map_err(todo_to_api)?;

    Ok(Json(TodosResponse {
        todos: cached.value,
        cache: cached.cache,
    }))
}

pub async fn create_todo(
    State(state): State<ApiState>,
    payload: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = json_body(payload)?;
    let command = CreateTodoCommand {
        created_by: id_field(request.created_by, "Created_by must be an integer")?,
        assigned_to: id_field(request.assigned_to, "Assigned_to must be an integer")?,
        content: request.content,
        deadline: request.deadline,
        status: request.status,
        priority: request.priority,
    };

    let todo = state
        .todos
        .create_todo(command)
        .await
        .map_err(todo_to_api)?;

    Ok((
        StatusCode::CREATED,
        Json(TodoCreatedResponse {
            message: "Todo created",
            todo,
        }),
    ))
}

pub async fn update_todo(
    State(state): State<ApiState>,
    Path(todo_id): Path<String>,
    payload: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&todo_id)?;
    let request = json_body(payload)?;
    let command = UpdateTodoCommand {
        id,
        created_by: id_field(request.created_by, "Created_by must be an integer")?,
        assigned_to: id_field(request.assigned_to, "Assigned_to must be an integer")?,
        content: request.content,
        deadline: request.deadline,
        status: request.status,
        priority: request.priority,
    };

    state
        .todos
        .update_todo(command)
        .await
        .map_err(todo_to_api)?;

    Ok(Json(MessageResponse {
        message: "Todo updated successfully",
    }))
}

pub async fn delete_todo(
    State(state): State<ApiState>,
    Path(todo_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&todo_id)?;

    state.todos.delete_todo(id).await.map_err(todo_to_api)?;

    Ok(Json(MessageResponse {
        message: "Todo deleted successfully",
    }))
}

pub async fn todos_count_by_status(
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, ApiError> {
    let cached = state.todos.count_by_status().await.map_err(todo_to_api)?;

    Ok(Json(StatusCountsResponse {
        data: cached.value,
        cache: cached.cache,
    }))
}

pub async fn todos_count_by_priority(
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, ApiError> {
    let cached = state
        .todos
        .count_by_priority()
        .await
        .map_err(todo_to_api)?;

    Ok(Json(PriorityCountsResponse {
        data: cached.value,
        cache: cached.cache,
    }))
}

pub async fn past_deadline(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let cached = state.todos.past_deadline().await.map_err(todo_to_api)?;

    Ok(Json(PastDeadlineResponse {
        data: cached.value,
        cache: cached.cache,
    }))
}

pub async fn user_task_stats(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = parse_id(&user_id)?;
    let stats = state
        .todos
        .user_task_stats(user_id)
        .await
        .map_err(todo_to_api)?;

    Ok(Json(UserTaskStatsResponse {
        stats,
        cache: false,
    }))
}

pub async fn all_user_task_stats(
    State(state): State<ApiState>,
) -> Result<impl IntoResponse, ApiError> {
    let data = state
        .todos
        .all_user_task_stats()
        .await
        .map_err(todo_to_api)?;

    Ok(Json(AllUserTaskStatsResponse { data }))
}
