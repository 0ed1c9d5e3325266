//! Mutation events that drive cache invalidation.

use crate::domain::entities::TodoRecord;

/// A committed todo mutation, carrying the row images the planner needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoChange {
    Created(TodoRecord),
    Updated {
        previous: TodoRecord,
        current: TodoRecord,
    },
    /// Row as read before deletion.
    Deleted(TodoRecord),
}

impl TodoChange {
    pub fn kind(&self) -> &'static str {
        match self {
            TodoChange::Created(_) => "created",
            TodoChange::Updated { .. } => "updated",
            TodoChange::Deleted(_) => "deleted",
        }
    }

    pub fn todo_id(&self) -> i32 {
        match self {
            TodoChange::Created(todo) | TodoChange::Deleted(todo) => todo.id,
            TodoChange::Updated { current, .. } => current.id,
        }
    }
}
