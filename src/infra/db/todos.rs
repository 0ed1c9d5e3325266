use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::{
    application::repos::{
        CreateTodoParams, PriorityCount, RepoError, StatusCount, TodoListFilter, TodoUpdate,
        TodosRepo, TodosWriteRepo, UpdateTodoParams, UserTaskCounts,
    },
    domain::{
        entities::TodoRecord,
        types::{TodoPriority, TodoStatus},
    },
};

use super::{PostgresRepositories, map_sqlx_error};

const TODO_COLUMNS: &str =
    "id, content, deadline, status, priority, created_by, assigned_to, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct TodoRow {
    id: i32,
    content: String,
    deadline: OffsetDateTime,
    status: TodoStatus,
    priority: TodoPriority,
    created_by: i32,
    assigned_to: i32,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<TodoRow> for TodoRecord {
    fn from(row: TodoRow) -> Self {
        Self {
            id: row.id,
            content: row.content,
            deadline: row.deadline,
            status: row.status,
            priority: row.priority,
            created_by: row.created_by,
            assigned_to: row.assigned_to,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct StatusCountRow {
    status: TodoStatus,
    count: i64,
}

#[derive(sqlx::FromRow)]
struct PriorityCountRow {
    priority: TodoPriority,
    count: i64,
}

#[derive(sqlx::FromRow)]
struct UserTaskCountsRow {
    user_id: i32,
    user_name: String,
    assigned: i64,
    completed: i64,
}

#[async_trait]
impl TodosRepo for PostgresRepositories {
    async fn list_todos(&self, filter: TodoListFilter) -> Result<Vec<TodoRecord>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(TODO_COLUMNS);
        qb.push(" FROM todos WHERE 1=1");

        if let Some(user_id) = filter.created_by {
            qb.push(" AND created_by = ");
            qb.push_bind(user_id);
        }
        if let Some(user_id) = filter.assigned_to {
            qb.push(" AND assigned_to = ");
            qb.push_bind(user_id);
        }
        qb.push(" ORDER BY id");

        let rows = qb
            .build_query_as::<TodoRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(TodoRecord::from).collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<TodoRecord>, RepoError> {
        let row = sqlx::query_as::<_, TodoRow>(&format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(TodoRecord::from))
    }

    async fn count_by_status(&self) -> Result<Vec<StatusCount>, RepoError> {
        let rows = sqlx::query_as::<_, StatusCountRow>(
            r#"
            SELECT status, COUNT(*) AS count
            FROM todos
            GROUP BY status
            ORDER BY status
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| StatusCount {
                status: row.status,
                count: row.count,
            })
            .collect())
    }

    async fn count_open_by_priority(&self) -> Result<Vec<PriorityCount>, RepoError> {
        let rows = sqlx::query_as::<_, PriorityCountRow>(
            r#"
            SELECT priority, COUNT(*) AS count
            FROM todos
            WHERE status <> 'completed'
            GROUP BY priority
            ORDER BY priority
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| PriorityCount {
                priority: row.priority,
                count: row.count,
            })
            .collect())
    }

    async fn list_past_deadline(
        &self,
        now: OffsetDateTime,
    ) -> Result<Vec<TodoRecord>, RepoError> {
        let rows = sqlx::query_as::<_, TodoRow>(&format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE deadline < $1 ORDER BY deadline, id"
        ))
        .bind(now)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(TodoRecord::from).collect())
    }

    async fn count_assigned(&self, user_id: i32) -> Result<i64, RepoError> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM todos WHERE assigned_to = $1")
            .bind(user_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn count_completed(&self, user_id: i32) -> Result<i64, RepoError> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM todos WHERE assigned_to = $1 AND status = 'completed'",
        )
        .bind(user_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn list_user_task_counts(&self) -> Result<Vec<UserTaskCounts>, RepoError> {
        let rows = sqlx::query_as::<_, UserTaskCountsRow>(
            r#"
            SELECT
                u.id AS user_id,
                u.name AS user_name,
                COUNT(t.id) AS assigned,
                COUNT(t.id) FILTER (WHERE t.status = 'completed') AS completed
            FROM users u
            LEFT JOIN todos t ON t.assigned_to = u.id
            GROUP BY u.id, u.name
            ORDER BY u.id
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| UserTaskCounts {
                user_id: row.user_id,
                user_name: row.user_name,
                assigned: row.assigned,
                completed: row.completed,
            })
            .collect())
    }
}

#[async_trait]
impl TodosWriteRepo for PostgresRepositories {
    async fn create_todo(&self, params: CreateTodoParams) -> Result<TodoRecord, RepoError> {
        let row = sqlx::query_as::<_, TodoRow>(&format!(
            r#"
            INSERT INTO todos (content, deadline, status, priority, created_by, assigned_to)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {TODO_COLUMNS}
            "#
        ))
        .bind(params.content)
        .bind(params.deadline)
        .bind(params.status)
        .bind(params.priority)
        .bind(params.created_by)
        .bind(params.assigned_to)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_todo(&self, params: UpdateTodoParams) -> Result<TodoUpdate, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let previous = sqlx::query_as::<_, TodoRow>(&format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE id = $1 FOR UPDATE"
        ))
        .bind(params.id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?
        .ok_or(RepoError::NotFound)?;

        let current = sqlx::query_as::<_, TodoRow>(&format!(
            r#"
            UPDATE todos
            SET content = COALESCE($2, content),
                deadline = COALESCE($3, deadline),
                status = COALESCE($4, status),
                priority = COALESCE($5, priority),
                created_by = COALESCE($6, created_by),
                assigned_to = COALESCE($7, assigned_to),
                updated_at = now()
            WHERE id = $1
            RETURNING {TODO_COLUMNS}
            "#
        ))
        .bind(params.id)
        .bind(params.content)
        .bind(params.deadline)
        .bind(params.status)
        .bind(params.priority)
        .bind(params.created_by)
        .bind(params.assigned_to)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(TodoUpdate {
            previous: previous.into(),
            current: current.into(),
        })
    }

    async fn delete_todo(&self, id: i32) -> Result<TodoRecord, RepoError> {
        let row = sqlx::query_as::<_, TodoRow>(&format!(
            "DELETE FROM todos WHERE id = $1 RETURNING {TODO_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?
        .ok_or(RepoError::NotFound)?;

        Ok(row.into())
    }
}
