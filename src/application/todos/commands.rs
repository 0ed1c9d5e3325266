use tracing::{info, warn};

use crate::application::repos::{CreateTodoParams, RepoError, UpdateTodoParams};
use crate::cache::TodoChange;
use crate::domain::entities::TodoRecord;

use super::service::TodoService;
use super::types::{
    CreateTodoCommand, TODO_NOT_FOUND, TodoError, UpdateTodoCommand, ensure_content,
    parse_deadline, parse_priority, parse_status,
};

impl TodoService {
    pub async fn create_todo(&self, command: CreateTodoCommand) -> Result<TodoRecord, TodoError> {
        let content = command
            .content
            .as_deref()
            .ok_or_else(|| TodoError::invalid("Content is required"))
            .and_then(|value| ensure_content(value, "Content is required"))?;
        let deadline = command
            .deadline
            .as_deref()
            .ok_or_else(|| TodoError::invalid("Deadline must be a valid date"))
            .and_then(parse_deadline)?;
        let status = command
            .status
            .as_deref()
            .map(parse_status)
            .transpose()?
            .unwrap_or_default();
        let priority = command
            .priority
            .as_deref()
            .map(parse_priority)
            .transpose()?
            .unwrap_or_default();
        let created_by = command
            .created_by
            .ok_or_else(|| TodoError::invalid("Created_by must be an integer"))?;
        let assigned_to = command
            .assigned_to
            .ok_or_else(|| TodoError::invalid("Assigned_to must be an integer"))?;

        self.ensure_user(created_by, "Invalid created_by user ID")
            .await?;
        self.ensure_user(assigned_to, "Invalid assigned_to user ID")
            .await?;

        let todo = self
            .writer
            .create_todo(CreateTodoParams {
                content,
                deadline,
                status,
                priority,
                created_by,
                assigned_to,
            })
            .await
            .map_err(reference_error)?;

        self.invalidate(TodoChange::Created(todo.clone())).await;

        info!(todo_id = todo.id, content = %todo.content, "todo created");
        Ok(todo)
    }

    /// Applies the provided fields and returns the updated row.
    pub async fn update_todo(&self, command: UpdateTodoCommand) -> Result<TodoRecord, TodoError> {
        let content = command
            .content
            .as_deref()
            .map(|value| ensure_content(value, "Content cannot be empty"))
            .transpose()?;
        let deadline = command.deadline.as_deref().map(parse_deadline).transpose()?;
        let status = command.status.as_deref().map(parse_status).transpose()?;
        let priority = command.priority.as_deref().map(parse_priority).transpose()?;

        if self.reader.find_by_id(command.id).await?.is_none() {
            return Err(TodoError::NotFound(TODO_NOT_FOUND.to_string()));
        }

        if let Some(user_id) = command.assigned_to {
            self.ensure_user(user_id, "Invalid assigned_to user ID")
                .await?;
        }
        if let Some(user_id) = command.created_by {
            self.ensure_user(user_id, "Invalid created_by user ID")
                .await?;
        }

        let update = self
            .writer
            .update_todo(UpdateTodoParams {
                id: command.id,
                content,
                deadline,
                status,
                priority,
                created_by: command.created_by,
                assigned_to: command.assigned_to,
            })
            .await
            .map_err(reference_error)?;

        let current = update.current.clone();
        self.invalidate(TodoChange::Updated {
            previous: update.previous,
            current: update.current,
        })
        .await;

        info!(todo_id = command.id, "todo updated");
        Ok(current)
    }

    /// Removes the todo and returns the row as it was before deletion.
    pub async fn delete_todo(&self, id: i32) -> Result<TodoRecord, TodoError> {
        let todo = self.writer.delete_todo(id).await.map_err(reference_error)?;

        self.invalidate(TodoChange::Deleted(todo.clone())).await;

        info!(todo_id = id, "todo deleted");
        Ok(todo)
    }

    /// Stale keys left behind by a failed delete expire with their TTL.
    async fn invalidate(&self, change: TodoChange) {
        let outcome = self.invalidator.todo_changed(&change).await;
        if !outcome.is_complete() {
            warn!(
                target = "taskdesk::application::todos",
                change = change.kind(),
                todo_id = change.todo_id(),
                deleted = outcome.deleted.len(),
                failed = outcome.failed.len(),
                "cache invalidation incomplete; affected views may serve stale data until expiry"
            );
        }
    }

    async fn ensure_user(&self, user_id: i32, message: &'static str) -> Result<(), TodoError> {
        match self.users.find_by_id(user_id).await? {
            Some(_) => Ok(()),
            None => Err(TodoError::invalid(message)),
        }
    }
}

fn reference_error(err: RepoError) -> TodoError {
    match err {
        RepoError::NotFound => TodoError::NotFound(TODO_NOT_FOUND.to_string()),
        RepoError::Integrity { .. } => TodoError::invalid("Referenced user does not exist"),
        other => TodoError::Repo(other),
    }
}
