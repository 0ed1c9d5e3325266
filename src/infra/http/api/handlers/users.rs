//! User handlers

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::{json_body, parse_id, user_to_api};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn list_users(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let users = state.users.list_users().await.map_err(user_to_api)?;
    Ok(Json(UsersResponse { users }))
}

pub async fn create_user(
    State(state): State<ApiState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = json_body(payload)?;
    let user = state
        .users
        .create_user(request.name.as_deref())
        .await
        .map_err(user_to_api)?;

    Ok((
        StatusCode::CREATED,
        Json(UserCreatedResponse {
            message: "User created",
            user,
        }),
    ))
}

pub async fn delete_user(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&user_id)?;
    state.users.delete_user(id).await.map_err(user_to_api)?;

    Ok(Json(MessageResponse {
        message: "User deleted successfully",
    }))
}
