//! HTTP scenarios against in-memory repositories and a recording cache store.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use time::{Duration as TimeDuration, OffsetDateTime};
use tower::ServiceExt;

use taskdesk::application::repos::{
    CreateTodoParams, HealthRepo, PriorityCount, RepoError, StatusCount, TodoListFilter,
    TodoUpdate, TodosRepo, TodosWriteRepo, UpdateTodoParams, UserTaskCounts, UsersRepo,
};
use taskdesk::application::todos::TodoService;
use taskdesk::application::users::UserService;
use taskdesk::cache::{CacheAside, CacheConfig, CacheError, CacheInvalidator, CacheStore};
use taskdesk::domain::entities::{TodoRecord, UserRecord};
use taskdesk::domain::types::{TodoPriority, TodoStatus};
use taskdesk::infra::http::{ApiState, build_api_router};

#[derive(Default)]
struct FakeDb {
    todos: Mutex<Vec<TodoRecord>>,
    users: Mutex<Vec<UserRecord>>,
    next_id: AtomicI32,
    reads: AtomicUsize,
    unhealthy: AtomicBool,
    broken: AtomicBool,
}

impl FakeDb {
    fn with_users(ids: &[i32]) -> Self {
        let db = Self::default();
        db.next_id.store(100, Ordering::SeqCst);
        *db.users.lock().unwrap() = ids
            .iter()
            .map(|id| UserRecord {
                id: *id,
                name: format!("user-{id}"),
            })
            .collect();
        db
    }

    fn insert(&self, todo: TodoRecord) {
        self.todos.lock().unwrap().push(todo);
    }

    fn check_connection(&self) -> Result<(), RepoError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(RepoError::Persistence("connection reset".to_string()));
        }
        Ok(())
    }

    fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn snapshot(&self) -> Vec<TodoRecord> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.todos.lock().unwrap().clone()
    }
}

#[async_trait]
impl TodosRepo for FakeDb {
    async fn list_todos(&self, filter: TodoListFilter) -> Result<Vec<TodoRecord>, RepoError> {
        self.check_connection()?;
        Ok(self
            .snapshot()
            .into_iter()
            .filter(|todo| filter.created_by.is_none_or(|id| todo.created_by == id))
            .filter(|todo| filter.assigned_to.is_none_or(|id| todo.assigned_to == id))
            .collect())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<TodoRecord>, RepoError> {
        Ok(self.snapshot().into_iter().find(|todo| todo.id == id))
    }

    async fn count_by_status(&self) -> Result<Vec<StatusCount>, RepoError> {
        let mut counts: Vec<StatusCount> = Vec::new();
        for todo in self.snapshot() {
            match counts.iter_mut().find(|entry| entry.status == todo.status) {
                Some(entry) => entry.count += 1,
                None => counts.push(StatusCount {
                    status: todo.status,
                    count: 1,
                }),
            }
        }
        Ok(counts)
    }

    async fn count_open_by_priority(&self) -> Result<Vec<PriorityCount>, RepoError> {
        let mut counts: Vec<PriorityCount> = Vec::new();
        for todo in self.snapshot() {
            if todo.status.is_completed() {
                continue;
            }
            match counts.iter_mut().find(|entry| entry.priority == todo.priority) {
                Some(entry) => entry.count += 1,
                None => counts.push(PriorityCount {
                    priority: todo.priority,
                    count: 1,
                }),
            }
        }
        Ok(counts)
    }

    async fn list_past_deadline(
        &self,
        now: OffsetDateTime,
    ) -> Result<Vec<TodoRecord>, RepoError> {
        Ok(self
            .snapshot()
            .into_iter()
            .filter(|todo| todo.is_past_deadline(now))
            .collect())
    }

    async fn count_assigned(&self, user_id: i32) -> Result<i64, RepoError> {
        Ok(self
            .snapshot()
            .iter()
            .filter(|todo| todo.assigned_to == user_id)
            .count() as i64)
    }

    async fn count_completed(&self, user_id: i32) -> Result<i64, RepoError> {
        Ok(self
            .snapshot()
            .iter()
            .filter(|todo| todo.assigned_to == user_id && todo.status.is_completed())
            .count() as i64)
    }

    async fn list_user_task_counts(&self) -> Result<Vec<UserTaskCounts>, RepoError> {
        let todos = self.snapshot();
        let users = self.users.lock().unwrap().clone();
        Ok(users
            .into_iter()
            .map(|user| {
                let assigned: Vec<_> = todos
                    .iter()
                    .filter(|todo| todo.assigned_to == user.id)
                    .collect();
                UserTaskCounts {
                    user_id: user.id,
                    user_name: user.name,
                    assigned: assigned.len() as i64,
                    completed: assigned
                        .iter()
                        .filter(|todo| todo.status.is_completed())
                        .count() as i64,
                }
            })
            .collect())
    }
}

#[async_trait]
impl TodosWriteRepo for FakeDb {
    async fn create_todo(&self, params: CreateTodoParams) -> Result<TodoRecord, RepoError> {
        self.check_connection()?;
        let now = OffsetDateTime::now_utc();
        let todo = TodoRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            content: params.content,
            deadline: params.deadline,
            status: params.status,
            priority: params.priority,
            created_by: params.created_by,
            assigned_to: params.assigned_to,
            created_at: now,
            updated_at: now,
        };
        self.insert(todo.clone());
        Ok(todo)
    }

    async fn update_todo(&self, params: UpdateTodoParams) -> Result<TodoUpdate, RepoError> {
        let mut todos = self.todos.lock().unwrap();
        let todo = todos
            .iter_mut()
            .find(|todo| todo.id == params.id)
            .ok_or(RepoError::NotFound)?;
        let previous = todo.clone();
        if let Some(content) = params.content {
            todo.content = content;
        }
        if let Some(deadline) = params.deadline {
            todo.deadline = deadline;
        }
        if let Some(status) = params.status {
            todo.status = status;
        }
        if let Some(priority) = params.priority {
            todo.priority = priority;
        }
        if let Some(created_by) = params.created_by {
            todo.created_by = created_by;
        }
        if let Some(assigned_to) = params.assigned_to {
            todo.assigned_to = assigned_to;
        }
        todo.updated_at = OffsetDateTime::now_utc();
        Ok(TodoUpdate {
            previous,
            current: todo.clone(),
        })
    }

    async fn delete_todo(&self, id: i32) -> Result<TodoRecord, RepoError> {
        let mut todos = self.todos.lock().unwrap();
        let index = todos
            .iter()
            .position(|todo| todo.id == id)
            .ok_or(RepoError::NotFound)?;
        Ok(todos.remove(index))
    }
}

#[async_trait]
impl UsersRepo for FakeDb {
    async fn find_by_id(&self, id: i32) -> Result<Option<UserRecord>, RepoError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.id == id)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, RepoError> {
        Ok(self.users.lock().unwrap().clone())
    }

    async fn create_user(&self, name: &str) -> Result<UserRecord, RepoError> {
        let user = UserRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            name: name.to_string(),
        };
        self.users.lock().unwrap().push(user.clone());
        Ok(user)
    }

    async fn count_references(&self, id: i32) -> Result<u64, RepoError> {
        Ok(self
            .todos
            .lock()
            .unwrap()
            .iter()
            .filter(|todo| todo.created_by == id || todo.assigned_to == id)
            .count() as u64)
    }

    async fn delete_user(&self, id: i32) -> Result<(), RepoError> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|user| user.id != id);
        if users.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl HealthRepo for FakeDb {
    async fn ping(&self) -> Result<(), RepoError> {
        if self.unhealthy.load(Ordering::SeqCst) {
            return Err(RepoError::Timeout);
        }
        Ok(())
    }
}

/// Map-backed store that remembers every write and delete it receives.
#[derive(Default)]
struct RecordingStore {
    entries: Mutex<HashMap<String, String>>,
    writes: Mutex<Vec<(String, Duration)>>,
    deletes: Mutex<Vec<String>>,
    offline: AtomicBool,
}

impl RecordingStore {
    fn seed(&self, key: &str, value: &impl serde::Serialize) {
        let raw = serde_json::to_string(value).unwrap();
        self.entries.lock().unwrap().insert(key.to_string(), raw);
    }

    fn writes(&self) -> Vec<(String, Duration)> {
        self.writes.lock().unwrap().clone()
    }

    fn deleted(&self) -> BTreeSet<String> {
        self.deletes.lock().unwrap().iter().cloned().collect()
    }

    fn contains(&self, key: &str) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }

    fn check_online(&self, command: &'static str) -> Result<(), CacheError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(CacheError::command(command, "connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for RecordingStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.check_online("GET")?;
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set_ex(&self, key: &str, ttl: Duration, value: String) -> Result<(), CacheError> {
        self.check_online("SETEX")?;
        self.writes.lock().unwrap().push((key.to_string(), ttl));
        self.entries.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.check_online("DEL")?;
        self.deletes.lock().unwrap().push(key.to_string());
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

fn build_app(db: Arc<FakeDb>, store: Arc<RecordingStore>) -> Router {
    let store: Arc<dyn CacheStore> = store;
    let config = CacheConfig::default();
    let todos = TodoService::new(
        db.clone(),
        db.clone(),
        db.clone(),
        CacheAside::new(store.clone(), &config),
        CacheInvalidator::new(store),
    );
    let users = UserService::new(db.clone());
    build_api_router(ApiState {
        todos: Arc::new(todos),
        users: Arc::new(users),
        health: db,
    })
}

fn todo(id: i32, created_by: i32, assigned_to: i32) -> TodoRecord {
    let now = OffsetDateTime::now_utc();
    TodoRecord {
        id,
        content: "Test Todo".to_string(),
        deadline: now + TimeDuration::days(7),
        status: TodoStatus::Pending,
        priority: TodoPriority::Medium,
        created_by,
        assigned_to,
        created_at: now,
        updated_at: now,
    }
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn keys(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|name| name.to_string()).collect()
}

#[tokio::test]
async fn cached_listing_is_served_without_touching_the_database() {
    let db = Arc::new(FakeDb::with_users(&[1, 2]));
    let store = Arc::new(RecordingStore::default());
    store.seed("todos_list", &vec![todo(1, 1, 2)]);
    let app = build_app(db.clone(), store.clone());

    let (status, body) = send(&app, Method::GET, "/todos", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cache"], json!(true));
    assert_eq!(body["todos"][0]["content"], json!("Test Todo"));
    assert_eq!(db.reads(), 0);
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn listing_miss_loads_then_populates_with_ttl() {
    let db = Arc::new(FakeDb::with_users(&[1, 2]));
    db.insert(todo(1, 1, 2));
    let store = Arc::new(RecordingStore::default());
    let app = build_app(db.clone(), store.clone());

    let (status, body) = send(&app, Method::GET, "/todos", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cache"], json!(false));
    assert_eq!(body["todos"].as_array().map(Vec::len), Some(1));
    assert_eq!(
        store.writes(),
        vec![("todos_list".to_string(), Duration::from_secs(60))]
    );

    let (_, again) = send(&app, Method::GET, "/todos", None).await;
    assert_eq!(again["cache"], json!(true));
    assert_eq!(db.reads(), 1);
}

#[tokio::test]
async fn cache_outage_falls_back_to_the_database() {
    let db = Arc::new(FakeDb::with_users(&[1, 2]));
    db.insert(todo(1, 1, 2));
    let store = Arc::new(RecordingStore::default());
    store.offline.store(true, Ordering::SeqCst);
    let app = build_app(db.clone(), store.clone());

    let (status, body) = send(&app, Method::GET, "/todos", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cache"], json!(false));
    assert_eq!(db.reads(), 1);
}

#[tokio::test]
async fn store_failures_surface_as_opaque_server_errors() {
    let db = Arc::new(FakeDb::with_users(&[1, 2]));
    db.broken.store(true, Ordering::SeqCst);
    let store = Arc::new(RecordingStore::default());
    let app = build_app(db, store.clone());

    let (status, body) = send(&app, Method::GET, "/todos", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Internal Server Error" }));

    let (status, body) = send(
        &app,
        Method::POST,
        "/todos",
        Some(json!({
            "content": "Write report",
            "deadline": "2999-01-01",
            "created_by": 1,
            "assigned_to": 2,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Internal Server Error" }));
    assert!(store.writes().is_empty());
    assert!(store.deleted().is_empty());
}

#[tokio::test]
async fn mutations_succeed_while_cache_deletes_fail() {
    let db = Arc::new(FakeDb::with_users(&[1, 2, 3]));
    db.insert(todo(1, 1, 2));
    let store = Arc::new(RecordingStore::default());
    store.offline.store(true, Ordering::SeqCst);
    let app = build_app(db.clone(), store.clone());

    let (status, body) = send(
        &app,
        Method::POST,
        "/todos",
        Some(json!({
            "content": "Write report",
            "deadline": "2999-01-01",
            "created_by": 1,
            "assigned_to": 2,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["todo"]["content"], json!("Write report"));

    let (status, body) = send(
        &app,
        Method::PUT,
        "/todos/update/1",
        Some(json!({ "assigned_to": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Todo updated successfully" }));

    let (status, body) = send(&app, Method::DELETE, "/todos/delete/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Todo deleted successfully" }));

    assert!(store.deleted().is_empty());
    let remaining = db.todos.lock().unwrap().clone();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].content, "Write report");
}

#[tokio::test]
async fn empty_listing_is_not_found_and_not_cached() {
    let db = Arc::new(FakeDb::with_users(&[7]));
    let store = Arc::new(RecordingStore::default());
    let app = build_app(db, store.clone());

    let (status, body) = send(&app, Method::GET, "/todos", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "No todos found" }));

    let (status, body) = send(&app, Method::GET, "/todos/7?type=created", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "No created todos found for user 7" }));
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn user_listing_uses_role_specific_key() {
    let db = Arc::new(FakeDb::with_users(&[1, 2]));
    db.insert(todo(1, 1, 2));
    let store = Arc::new(RecordingStore::default());
    let app = build_app(db, store.clone());

    let (status, body) = send(&app, Method::GET, "/todos/2?type=assigned", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["todos"][0]["assigned_to"], json!(2));
    assert!(store.contains("todos_list_assigned_to_2"));
    assert!(!store.contains("todos_list"));
}

#[tokio::test]
async fn user_listing_rejects_bad_type_and_id() {
    let app = build_app(
        Arc::new(FakeDb::with_users(&[1])),
        Arc::new(RecordingStore::default()),
    );

    let (status, body) = send(&app, Method::GET, "/todos/1?type=owner", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid type: Use 'created' or 'assigned'" }));

    let (status, body) = send(&app, Method::GET, "/todos/abc?type=created", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid ID: ID must be a number" }));
}

#[tokio::test]
async fn create_todo_invalidates_affected_views() {
    let db = Arc::new(FakeDb::with_users(&[1, 2]));
    let store = Arc::new(RecordingStore::default());
    store.seed("todos_list", &vec![todo(1, 1, 2)]);
    let app = build_app(db, store.clone());

    let (status, body) = send(
        &app,
        Method::POST,
        "/todos",
        Some(json!({
            "content": "Write report",
            "deadline": "2999-01-01",
            "priority": "high",
            "created_by": 1,
            "assigned_to": "2",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], json!("Todo created"));
    assert_eq!(body["todo"]["status"], json!("pending"));
    assert_eq!(body["todo"]["priority"], json!("high"));
    assert!(!store.contains("todos_list"));
    assert_eq!(
        store.deleted(),
        keys(&[
            "todos_count_by_priority",
            "todos_count_by_status",
            "todos_list",
            "todos_list_assigned_to_2",
            "todos_list_created_by_1",
        ])
    );
}

#[tokio::test]
async fn create_todo_validates_input() {
    let db = Arc::new(FakeDb::with_users(&[1]));
    let store = Arc::new(RecordingStore::default());
    let app = build_app(db, store.clone());

    let cases = [
        (
            json!({ "deadline": "2999-01-01", "created_by": 1, "assigned_to": 1 }),
            "Content is required",
        ),
        (
            json!({ "content": "x", "deadline": "soon", "created_by": 1, "assigned_to": 1 }),
            "Deadline must be a valid date",
        ),
        (
            json!({ "content": "x", "deadline": "2999-01-01", "priority": "urgent", "created_by": 1, "assigned_to": 1 }),
            "Priority must be 'low', 'medium', or 'high'",
        ),
        (
            json!({ "content": "x", "deadline": "2999-01-01", "created_by": "one", "assigned_to": 1 }),
            "Created_by must be an integer",
        ),
        (
            json!({ "content": "x", "deadline": "2999-01-01", "created_by": 1, "assigned_to": 9 }),
            "Invalid assigned_to user ID",
        ),
    ];

    for (payload, message) in cases {
        let (status, body) = send(&app, Method::POST, "/todos", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{message}");
        assert_eq!(body, json!({ "error": message }));
    }
    assert!(store.deleted().is_empty());
}

#[tokio::test]
async fn reassignment_invalidates_old_and_new_assignee() {
    let db = Arc::new(FakeDb::with_users(&[1, 2, 3]));
    db.insert(todo(1, 1, 2));
    let store = Arc::new(RecordingStore::default());
    let app = build_app(db.clone(), store.clone());

    let (status, body) = send(
        &app,
        Method::PUT,
        "/todos/update/1",
        Some(json!({ "assigned_to": 3 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Todo updated successfully" }));
    assert_eq!(
        store.deleted(),
        keys(&[
            "todos_list",
            "todos_list_assigned_to_2",
            "todos_list_assigned_to_3",
            "todos_list_created_by_1",
        ])
    );
}

#[tokio::test]
async fn update_of_missing_todo_is_not_found() {
    let store = Arc::new(RecordingStore::default());
    let app = build_app(Arc::new(FakeDb::with_users(&[1])), store.clone());

    let (status, body) = send(
        &app,
        Method::PUT,
        "/todos/update/42",
        Some(json!({ "content": "Renamed" })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Todo not found" }));
    assert!(store.deleted().is_empty());
}

#[tokio::test]
async fn delete_invalidates_views_of_the_removed_row() {
    let db = Arc::new(FakeDb::with_users(&[2, 3]));
    let mut finished = todo(5, 3, 2);
    finished.status = TodoStatus::Completed;
    finished.deadline = OffsetDateTime::now_utc() - TimeDuration::days(1);
    db.insert(finished);
    let store = Arc::new(RecordingStore::default());
    let app = build_app(db, store.clone());

    let (status, body) = send(&app, Method::DELETE, "/todos/delete/5", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Todo deleted successfully" }));
    assert_eq!(
        store.deleted(),
        keys(&[
            "todos_count_by_status",
            "todos_list",
            "todos_list_assigned_to_2",
            "todos_list_created_by_3",
            "todos_past_deadline",
        ])
    );
}

#[tokio::test]
async fn delete_of_missing_todo_is_not_found() {
    let store = Arc::new(RecordingStore::default());
    let app = build_app(Arc::new(FakeDb::with_users(&[1])), store.clone());

    let (status, body) = send(&app, Method::DELETE, "/todos/delete/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Todo not found" }));

    let (status, _) = send(&app, Method::DELETE, "/todos/delete/nine", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(store.deleted().is_empty());
}

#[tokio::test]
async fn aggregates_report_empty_data_without_caching() {
    let store = Arc::new(RecordingStore::default());
    let app = build_app(Arc::new(FakeDb::with_users(&[1])), store.clone());

    for uri in [
        "/todos/todosCountByStatus",
        "/todos/todosCountByPriority",
        "/todos/todosPastDeadline",
    ] {
        let (status, body) = send(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body, json!({ "data": [], "cache": false }), "{uri}");
    }
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn priority_counts_exclude_completed_todos() {
    let db = Arc::new(FakeDb::with_users(&[1]));
    db.insert(todo(1, 1, 1));
    let mut done = todo(2, 1, 1);
    done.status = TodoStatus::Completed;
    db.insert(done);
    let app = build_app(db, Arc::new(RecordingStore::default()));

    let (_, body) = send(&app, Method::GET, "/todos/todosCountByPriority", None).await;
    assert_eq!(
        body["data"],
        json!([{ "priority": "medium", "count": 1 }])
    );

    let (_, body) = send(&app, Method::GET, "/todos/todosCountByPriority", None).await;
    assert_eq!(body["cache"], json!(true));
}

#[tokio::test]
async fn user_task_stats_round_completion_up() {
    let db = Arc::new(FakeDb::with_users(&[1, 2]));
    for id in 1..=3 {
        let mut item = todo(id, 1, 2);
        if id == 1 {
            item.status = TodoStatus::Completed;
        }
        db.insert(item);
    }
    let app = build_app(db, Arc::new(RecordingStore::default()));

    let (status, body) = send(&app, Method::GET, "/todos/userTaskStats/2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "assignedTasks": 3, "completedTasks": 1, "completionRate": 34, "cache": false })
    );

    let (_, body) = send(&app, Method::GET, "/todos/getAllUserTaskStats", None).await;
    assert_eq!(body["data"][0]["userId"], json!(1));
    assert_eq!(body["data"][0]["completionRate"], json!(0));
    assert_eq!(body["data"][1]["userName"], json!("user-2"));
    assert_eq!(body["data"][1]["assignedTasks"], json!(3));
}

#[tokio::test]
async fn users_can_be_created_and_guarded_from_deletion() {
    let db = Arc::new(FakeDb::with_users(&[1, 2]));
    db.insert(todo(1, 1, 2));
    let app = build_app(db, Arc::new(RecordingStore::default()));

    let (status, body) = send(&app, Method::POST, "/users", Some(json!({ "name": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Name is required" }));

    let (status, body) = send(&app, Method::POST, "/users", Some(json!({ "name": "Ada" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["name"], json!("Ada"));
    let new_id = body["user"]["id"].as_i64().unwrap();

    let (status, body) = send(&app, Method::DELETE, "/users/2", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({ "error": "User is referenced by existing todos" }));

    let (status, _) = send(&app, Method::DELETE, &format!("/users/{new_id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::DELETE, "/users/404", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "User not found" }));

    let (_, body) = send(&app, Method::GET, "/users", None).await;
    assert_eq!(body["users"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn health_reflects_database_reachability() {
    let db = Arc::new(FakeDb::with_users(&[]));
    let app = build_app(db.clone(), Arc::new(RecordingStore::default()));

    let (status, _) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    db.unhealthy.store(true, Ordering::SeqCst);
    let (status, _) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let app = build_app(
        Arc::new(FakeDb::with_users(&[])),
        Arc::new(RecordingStore::default()),
    );

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "req-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("x-request-id").map(|v| v.as_bytes()),
        Some(&b"req-123"[..])
    );
}
