pub mod error;
pub mod handlers;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, put},
};

use crate::infra::http::middleware::{log_responses, set_request_context};

pub fn build_api_router(state: ApiState) -> Router {
    Router::new()
        .route(
            "/todos",
            get(handlers::list_todos).post(handlers::create_todo),
        )
        .route("/todos/todosPastDeadline", get(handlers::past_deadline))
        .route(
            "/todos/getAllUserTaskStats",
            get(handlers::all_user_task_stats),
        )
        .route(
            "/todos/todosCountByStatus",
            get(handlers::todos_count_by_status),
        )
        .route(
            "/todos/todosCountByPriority",
            get(handlers::todos_count_by_priority),
        )
        .route("/todos/update/{todo_id}", put(handlers::update_todo))
        .route("/todos/delete/{todo_id}", delete(handlers::delete_todo))
        .route(
            "/todos/userTaskStats/{user_id}",
            get(handlers::user_task_stats),
        )
        .route("/todos/{user_id}", get(handlers::list_user_todos))
        .route(
            "/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route("/users/{user_id}", delete(handlers::delete_user))
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
