mod commands;
mod queries;
mod service;
pub mod types;

pub use service::*;
pub use types::{
    CreateTodoCommand, TODO_NOT_FOUND, TodoError, UpdateTodoCommand, UserListing, UserTaskStats,
    UserTaskStatsRow, completion_rate, parse_deadline,
};
