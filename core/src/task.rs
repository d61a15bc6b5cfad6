//! Task resource: status transitions, hierarchy, notes, and filtering.
//!
//! # Design
//! Status transitions (`check`, `done`) are client-requested writes — the
//! server is the authority on legality, and an illegal transition surfaces
//! the server's error verbatim. The subtask relation is computed from
//! `parentGlobalTaskId` on each call, never stored as a pointer, so there
//! is no cyclic ownership between tasks. Notes are append-only from the
//! client's perspective and go through a dedicated endpoint rather than a
//! generic save.

use std::fmt;

use serde_json::{json, Map, Value};

use crate::attrs::AttributeStore;
use crate::constants::TASKS_PATH;
use crate::error::ApiError;
use crate::resource::{create_resource, expect_object, require_fields, Resource};
use crate::transport::Session;
use crate::user::User;

/// Task status, carrying the service's exact case-sensitive tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Unchecked,
    Checked,
    Done,
    Deleted,
}

impl TaskStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Unchecked => "UNCHECKED",
            TaskStatus::Checked => "CHECKED",
            TaskStatus::Done => "DONE",
            TaskStatus::Deleted => "DELETED",
        }
    }

    /// Parse a server token. Comparison is exact; unknown or differently
    /// cased tokens yield `None` and are preserved verbatim in the store.
    pub fn parse(token: &str) -> Option<TaskStatus> {
        match token {
            "UNCHECKED" => Some(TaskStatus::Unchecked),
            "CHECKED" => Some(TaskStatus::Checked),
            "DONE" => Some(TaskStatus::Done),
            "DELETED" => Some(TaskStatus::Deleted),
            _ => None,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task belonging to the authenticated user.
#[derive(Debug, Clone)]
pub struct Task {
    store: AttributeStore,
    session: Session,
}

impl Resource for Task {
    const TYPE_NAME: &'static str = "Task";
    const ENDPOINT: &'static str = TASKS_PATH;
    const ALLOWED_FIELDS: &'static [&'static str] = &[
        "id",
        "title",
        "status",
        "category",
        "priority",
        "dueDate",
        "repeatingMethod",
        "assignedTo",
        "parentGlobalTaskId",
        "note",
    ];
    const REQUIRED_FIELDS: &'static [&'static str] = &["title"];

    fn store(&self) -> &AttributeStore {
        &self.store
    }

    fn store_mut(&mut self) -> &mut AttributeStore {
        &mut self.store
    }

    fn session(&self) -> &Session {
        &self.session
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.store == other.store
    }
}

impl Task {
    /// Wrap a server document. Fails if the required attribute set (title)
    /// is absent.
    pub fn from_data(session: Session, data: Value) -> Result<Task, ApiError> {
        let doc = expect_object(data)?;
        require_fields(Self::TYPE_NAME, Self::REQUIRED_FIELDS, &doc)?;
        Ok(Task {
            store: AttributeStore::from_server(Self::TYPE_NAME, Self::ALLOWED_FIELDS, doc),
            session,
        })
    }

    /// Create a task on the server and append it to the user's cached task
    /// list. Unknown and missing-required fields fail before any request.
    pub fn create(user: &mut User, attrs: Map<String, Value>) -> Result<Task, ApiError> {
        let store = create_resource(
            user.session(),
            Self::TYPE_NAME,
            Self::ENDPOINT,
            Self::ALLOWED_FIELDS,
            Self::REQUIRED_FIELDS,
            attrs,
        )?;
        let task = Task {
            store,
            session: user.session().clone(),
        };
        user.add_task(task.clone());
        Ok(task)
    }

    pub fn title(&self) -> Option<&str> {
        self.store.try_get("title").and_then(Value::as_str)
    }

    /// The raw status token as the server sent it.
    pub fn status_token(&self) -> Option<&str> {
        self.store.try_get("status").and_then(Value::as_str)
    }

    /// The parsed status, `None` when absent or not one of the four known
    /// tokens.
    pub fn status(&self) -> Option<TaskStatus> {
        self.status_token().and_then(TaskStatus::parse)
    }

    pub fn parent_global_task_id(&self) -> Option<&str> {
        self.store
            .try_get("parentGlobalTaskId")
            .and_then(Value::as_str)
    }

    /// Mark the task checked via a partial update.
    pub fn check(&mut self) -> Result<(), ApiError> {
        self.transition(TaskStatus::Checked)
    }

    /// Mark the task done via a partial update.
    pub fn done(&mut self) -> Result<(), ApiError> {
        self.transition(TaskStatus::Done)
    }

    fn transition(&mut self, status: TaskStatus) -> Result<(), ApiError> {
        self.set("status", json!(status.as_str()))?;
        self.save()
    }

    /// Tasks in the user's cached list whose `parentGlobalTaskId` equals
    /// this task's identifier, in cache order. Recomputed on each call.
    pub fn subtasks(&self, user: &User) -> Vec<Task> {
        let Some(id) = self.id() else {
            return Vec::new();
        };
        user.cached_tasks()
            .iter()
            .filter(|task| task.parent_global_task_id() == Some(id))
            .cloned()
            .collect()
    }

    /// `Task::create` with `parentGlobalTaskId` pre-filled from this task.
    pub fn create_subtask(
        &self,
        user: &mut User,
        mut attrs: Map<String, Value>,
    ) -> Result<Task, ApiError> {
        let id = self.id().ok_or_else(|| ApiError::FieldNotFound {
            field: "id".to_string(),
        })?;
        attrs.insert("parentGlobalTaskId".to_string(), json!(id));
        Task::create(user, attrs)
    }

    /// Relink an existing task under this one and save it.
    pub fn add_subtask(&self, task: &mut Task) -> Result<(), ApiError> {
        let id = self.id().ok_or_else(|| ApiError::FieldNotFound {
            field: "id".to_string(),
        })?;
        task.set("parentGlobalTaskId", json!(id))?;
        task.save()
    }

    /// The ordered note strings, empty for a task with no notes field.
    pub fn notes(&self) -> Vec<String> {
        match self.store.try_get("note") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Append a note through the dedicated append endpoint and sync the
    /// local cache from the server's response.
    pub fn add_note(&mut self, text: &str) -> Result<(), ApiError> {
        let id = self.id().ok_or_else(|| ApiError::FieldNotFound {
            field: "id".to_string(),
        })?;
        let path = format!("{}/{}/note", Self::ENDPOINT, id);
        let response = self.session.post(&path, Some(&json!({ "text": text })))?;

        match response {
            Value::Object(doc) => self.store.reload(doc),
            _ => {
                // Older service versions reply with an empty body; append
                // locally as synced state.
                let mut notes: Vec<Value> = self
                    .notes()
                    .into_iter()
                    .map(Value::String)
                    .collect();
                notes.push(Value::String(text.to_string()));
                self.store.sync_field("note", Value::Array(notes))?;
            }
        }
        Ok(())
    }
}

/// Which statuses a task listing keeps. Each `false` flag drops its status;
/// the flags combine as a logical AND of exclusions.
#[derive(Debug, Clone)]
pub struct TaskFilter {
    pub include_deleted: bool,
    pub include_done: bool,
    pub include_checked: bool,
    pub include_unchecked: bool,
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self {
            include_deleted: false,
            include_done: false,
            include_checked: true,
            include_unchecked: true,
        }
    }
}

/// Select tasks by status flags, preserving input order. Tasks with an
/// unknown or absent status are never dropped.
pub fn filter_tasks(tasks: &[Task], filter: &TaskFilter) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| match task.status() {
            Some(TaskStatus::Deleted) => filter.include_deleted,
            Some(TaskStatus::Done) => filter.include_done,
            Some(TaskStatus::Checked) => filter.include_checked,
            Some(TaskStatus::Unchecked) => filter.include_unchecked,
            None => true,
        })
        .cloned()
        .collect()
}
