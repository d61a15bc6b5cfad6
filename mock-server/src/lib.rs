//! In-memory rendition of the task-management service, for tests.
//!
//! One fixed account, token-based auth, and the resource endpoints the SDK
//! talks to: the user document, tasks (with server-side `includeDeleted`/
//! `includeDone` filtering and a note-append route), categories, and
//! pending share invitations. Collections keep insertion order — the SDK
//! relies on server-assigned order and never re-sorts.

use std::{collections::HashSet, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

const TOKEN_HEADER: &str = "x-session-token";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserDoc {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskDoc {
    pub id: String,
    pub title: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(rename = "dueDate", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<i64>,
    #[serde(rename = "repeatingMethod", skip_serializing_if = "Option::is_none")]
    pub repeating_method: Option<String>,
    #[serde(rename = "assignedTo", skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(rename = "parentGlobalTaskId", skip_serializing_if = "Option::is_none")]
    pub parent_global_task_id: Option<String>,
    pub note: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CategoryDoc {
    pub id: String,
    pub name: String,
    #[serde(rename = "isDefault")]
    pub is_default: bool,
    #[serde(rename = "isDeleted")]
    pub is_deleted: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PendingDoc {
    pub id: String,
    #[serde(rename = "sharedBy")]
    pub shared_by: String,
    pub title: String,
}

#[derive(Debug)]
pub struct ServiceState {
    pub user: UserDoc,
    password: String,
    tokens: HashSet<String>,
    pub tasks: Vec<TaskDoc>,
    pub categories: Vec<CategoryDoc>,
    pub pending: Vec<PendingDoc>,
}

impl ServiceState {
    pub fn new(name: &str, email: &str, password: &str) -> Self {
        Self {
            user: UserDoc {
                id: Uuid::new_v4().to_string(),
                name: name.to_string(),
                email: email.to_string(),
            },
            password: password.to_string(),
            tokens: HashSet::new(),
            tasks: Vec::new(),
            categories: Vec::new(),
            pending: Vec::new(),
        }
    }
}

pub type Db = Arc<RwLock<ServiceState>>;

/// Default account used by most tests.
pub const DEFAULT_EMAIL: &str = "ada@example.com";
pub const DEFAULT_PASSWORD: &str = "correct-horse";

pub fn app() -> Router {
    app_with(Arc::new(RwLock::new(ServiceState::new(
        "Ada",
        DEFAULT_EMAIL,
        DEFAULT_PASSWORD,
    ))))
}

pub fn app_with(db: Db) -> Router {
    Router::new()
        .route("/auth/login", post(login))
        .route("/me", get(get_me).put(update_me))
        .route("/user", axum::routing::delete(delete_user))
        .route("/me/tasks", get(list_tasks).post(create_task))
        .route("/me/tasks/{id}", axum::routing::put(update_task).delete(delete_task))
        .route("/me/tasks/{id}/note", post(add_note))
        .route("/me/categories", get(list_categories).post(create_category))
        .route("/me/pending", get(list_pending))
        .route("/me/pending/{id}/accept", post(accept_pending))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Serve a pre-seeded state, for tests that need existing records.
pub async fn run_with(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(db)).await
}

fn authorized(state: &ServiceState, headers: &HeaderMap) -> Result<(), StatusCode> {
    let token = headers
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;
    if state.tokens.contains(token) {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

// --- auth ---

#[derive(Deserialize)]
struct Credentials {
    email: String,
    password: String,
}

async fn login(
    State(db): State<Db>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<Value>, StatusCode> {
    let mut state = db.write().await;
    if credentials.email != state.user.email || credentials.password != state.password {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let token = Uuid::new_v4().to_string();
    state.tokens.insert(token.clone());
    Ok(Json(json!({
        "authToken": token,
        "id": state.user.id,
        "email": state.user.email,
    })))
}

// --- user ---

async fn get_me(State(db): State<Db>, headers: HeaderMap) -> Result<Json<UserDoc>, StatusCode> {
    let state = db.read().await;
    authorized(&state, &headers)?;
    Ok(Json(state.user.clone()))
}

#[derive(Deserialize)]
struct UpdateUser {
    name: Option<String>,
    email: Option<String>,
}

async fn update_me(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<UpdateUser>,
) -> Result<Json<UserDoc>, StatusCode> {
    let mut state = db.write().await;
    authorized(&state, &headers)?;
    if let Some(name) = input.name {
        state.user.name = name;
    }
    if let Some(email) = input.email {
        state.user.email = email;
    }
    Ok(Json(state.user.clone()))
}

async fn delete_user(State(db): State<Db>, headers: HeaderMap) -> Result<StatusCode, StatusCode> {
    let mut state = db.write().await;
    authorized(&state, &headers)?;
    state.tokens.clear();
    state.tasks.clear();
    state.categories.clear();
    state.pending.clear();
    Ok(StatusCode::NO_CONTENT)
}

// --- tasks ---

#[derive(Deserialize)]
struct ListParams {
    #[serde(rename = "includeDeleted", default)]
    include_deleted: Option<String>,
    #[serde(rename = "includeDone", default)]
    include_done: Option<String>,
}

fn flag(value: &Option<String>) -> bool {
    value.as_deref() == Some("true")
}

async fn list_tasks(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<TaskDoc>>, StatusCode> {
    let state = db.read().await;
    authorized(&state, &headers)?;
    let tasks = state
        .tasks
        .iter()
        .filter(|task| flag(&params.include_deleted) || task.status != "DELETED")
        .filter(|task| flag(&params.include_done) || task.status != "DONE")
        .cloned()
        .collect();
    Ok(Json(tasks))
}

#[derive(Deserialize)]
struct CreateTask {
    title: String,
    status: Option<String>,
    category: Option<String>,
    priority: Option<String>,
    #[serde(rename = "dueDate")]
    due_date: Option<i64>,
    #[serde(rename = "repeatingMethod")]
    repeating_method: Option<String>,
    #[serde(rename = "assignedTo")]
    assigned_to: Option<String>,
    #[serde(rename = "parentGlobalTaskId")]
    parent_global_task_id: Option<String>,
    note: Option<Vec<String>>,
}

async fn create_task(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreateTask>,
) -> Result<(StatusCode, Json<TaskDoc>), StatusCode> {
    let mut state = db.write().await;
    authorized(&state, &headers)?;
    let task = TaskDoc {
        id: Uuid::new_v4().to_string(),
        title: input.title,
        status: input.status.unwrap_or_else(|| "UNCHECKED".to_string()),
        category: input.category,
        priority: input.priority,
        due_date: input.due_date,
        repeating_method: input.repeating_method,
        assigned_to: input.assigned_to,
        parent_global_task_id: input.parent_global_task_id,
        note: input.note.unwrap_or_default(),
    };
    state.tasks.push(task.clone());
    Ok((StatusCode::CREATED, Json(task)))
}

#[derive(Deserialize)]
struct UpdateTask {
    title: Option<String>,
    status: Option<String>,
    category: Option<String>,
    priority: Option<String>,
    #[serde(rename = "dueDate")]
    due_date: Option<i64>,
    #[serde(rename = "repeatingMethod")]
    repeating_method: Option<String>,
    #[serde(rename = "assignedTo")]
    assigned_to: Option<String>,
    #[serde(rename = "parentGlobalTaskId")]
    parent_global_task_id: Option<String>,
}

async fn update_task(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<UpdateTask>,
) -> Result<Json<TaskDoc>, StatusCode> {
    let mut state = db.write().await;
    authorized(&state, &headers)?;
    let task = state
        .tasks
        .iter_mut()
        .find(|task| task.id == id)
        .ok_or(StatusCode::NOT_FOUND)?;
    if let Some(title) = input.title {
        task.title = title;
    }
    if let Some(status) = input.status {
        task.status = status;
    }
    if let Some(category) = input.category {
        task.category = Some(category);
    }
    if let Some(priority) = input.priority {
        task.priority = Some(priority);
    }
    if let Some(due_date) = input.due_date {
        task.due_date = Some(due_date);
    }
    if let Some(repeating_method) = input.repeating_method {
        task.repeating_method = Some(repeating_method);
    }
    if let Some(assigned_to) = input.assigned_to {
        task.assigned_to = Some(assigned_to);
    }
    if let Some(parent) = input.parent_global_task_id {
        task.parent_global_task_id = Some(parent);
    }
    Ok(Json(task.clone()))
}

async fn delete_task(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let mut state = db.write().await;
    authorized(&state, &headers)?;
    let before = state.tasks.len();
    state.tasks.retain(|task| task.id != id);
    if state.tasks.len() < before {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

#[derive(Deserialize)]
struct NoteInput {
    text: String,
}

async fn add_note(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<NoteInput>,
) -> Result<Json<TaskDoc>, StatusCode> {
    let mut state = db.write().await;
    authorized(&state, &headers)?;
    let task = state
        .tasks
        .iter_mut()
        .find(|task| task.id == id)
        .ok_or(StatusCode::NOT_FOUND)?;
    task.note.push(input.text);
    Ok(Json(task.clone()))
}

// --- categories ---

async fn list_categories(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<CategoryDoc>>, StatusCode> {
    let state = db.read().await;
    authorized(&state, &headers)?;
    let categories = state
        .categories
        .iter()
        .filter(|category| flag(&params.include_deleted) || !category.is_deleted)
        .cloned()
        .collect();
    Ok(Json(categories))
}

#[derive(Deserialize)]
struct CreateCategory {
    name: String,
    #[serde(rename = "isDefault", default)]
    is_default: bool,
}

async fn create_category(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreateCategory>,
) -> Result<(StatusCode, Json<CategoryDoc>), StatusCode> {
    let mut state = db.write().await;
    authorized(&state, &headers)?;
    let category = CategoryDoc {
        id: Uuid::new_v4().to_string(),
        name: input.name,
        is_default: input.is_default,
        is_deleted: false,
    };
    state.categories.push(category.clone());
    Ok((StatusCode::CREATED, Json(category)))
}

// --- pending tasks ---

async fn list_pending(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    let state = db.read().await;
    authorized(&state, &headers)?;
    Ok(Json(json!({ "pendingTasks": state.pending })))
}

async fn accept_pending(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let mut state = db.write().await;
    authorized(&state, &headers)?;
    let position = state
        .pending
        .iter()
        .position(|record| record.id == id)
        .ok_or(StatusCode::NOT_FOUND)?;
    let record = state.pending.remove(position);

    // Accepting an invitation materializes the shared task.
    let task = TaskDoc {
        id: record.id.clone(),
        title: record.title.clone(),
        status: "UNCHECKED".to_string(),
        category: None,
        priority: None,
        due_date: None,
        repeating_method: None,
        assigned_to: Some(state.user.email.clone()),
        parent_global_task_id: None,
        note: Vec::new(),
    };
    state.tasks.push(task);
    Ok(Json(json!({ "id": record.id, "status": "accepted" })))
}
