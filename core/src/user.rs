//! User resource: the root of the authenticated object graph.
//!
//! # Design
//! A `User` composes three lazily populated caches — tasks, categories,
//! and pending share invitations. Each cache is fetched on first access or
//! explicit refresh and replaced wholesale, never merged. Caches hold
//! owned snapshots and accessors return clones: a resource saved by the
//! caller diverges from its cache entry until the next refresh. The caches
//! assume a single writer; concurrent refresh-while-read is not guarded.
//!
//! The password field is write-only at creation and is stripped from the
//! store on every load of server data.

use serde_json::{Map, Value};
use tracing::debug;

use crate::attrs::AttributeStore;
use crate::category::Category;
use crate::constants::{CATEGORIES_PATH, ME_PATH, PENDING_PATH, TASKS_PATH, USER_PATH};
use crate::error::ApiError;
use crate::resource::{create_resource, expect_array, expect_object, require_fields, Resource};
use crate::task::{filter_tasks, Task, TaskFilter};
use crate::transport::Session;

fn bool_token(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// The authenticated user and their task/category collections.
#[derive(Debug, Clone)]
pub struct User {
    store: AttributeStore,
    session: Session,
    tasks_cache: Option<Vec<Task>>,
    categories_cache: Option<Vec<Category>>,
    pending_cache: Option<Vec<Value>>,
}

impl Resource for User {
    const TYPE_NAME: &'static str = "User";
    const ENDPOINT: &'static str = ME_PATH;
    const ALLOWED_FIELDS: &'static [&'static str] = &["id", "name", "email", "password"];
    const REQUIRED_FIELDS: &'static [&'static str] = &["name", "email", "password"];

    fn store(&self) -> &AttributeStore {
        &self.store
    }

    fn store_mut(&mut self) -> &mut AttributeStore {
        &mut self.store
    }

    fn session(&self) -> &Session {
        &self.session
    }

    /// Users save against the `/me` endpoint rather than `ENDPOINT/{id}`.
    fn save(&mut self) -> Result<(), ApiError> {
        self.save_to(Some(ME_PATH))
    }

    /// Account deletion goes through the user endpoint.
    fn destroy(&mut self) -> Result<(), ApiError> {
        self.destroy_to(Some(USER_PATH))
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.store == other.store
    }
}

impl User {
    /// Wrap the server's user document. `name` and `email` must be present;
    /// `password` is required at creation only and is dropped here if the
    /// server ever echoes it.
    pub fn from_data(session: Session, data: Value) -> Result<User, ApiError> {
        let mut doc = expect_object(data)?;
        require_fields(Self::TYPE_NAME, &["name", "email"], &doc)?;
        doc.remove("password");
        Ok(User {
            store: AttributeStore::from_server(Self::TYPE_NAME, Self::ALLOWED_FIELDS, doc),
            session,
            tasks_cache: None,
            categories_cache: None,
            pending_cache: None,
        })
    }

    /// Register a new account. Requires `name`, `email`, and `password`;
    /// the password is consumed by the request and never retained in the
    /// resulting resource.
    pub fn create(session: &Session, attrs: Map<String, Value>) -> Result<User, ApiError> {
        let mut store = create_resource(
            session,
            Self::TYPE_NAME,
            USER_PATH,
            Self::ALLOWED_FIELDS,
            Self::REQUIRED_FIELDS,
            attrs,
        )?;
        store.forget("password");
        Ok(User {
            store,
            session: session.clone(),
            tasks_cache: None,
            categories_cache: None,
            pending_cache: None,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.store.try_get("name").and_then(Value::as_str)
    }

    pub fn email(&self) -> Option<&str> {
        self.store.try_get("email").and_then(Value::as_str)
    }

    /// The remote or cached task list, filtered per the flags. A fetch
    /// happens when the cache is absent or `refresh` is set; the
    /// `includeDeleted`/`includeDone` flags are also forwarded to the
    /// server (it can filter those two), while checked/unchecked filtering
    /// is always applied client-side after the fetch.
    pub fn tasks(&mut self, refresh: bool, filter: &TaskFilter) -> Result<Vec<Task>, ApiError> {
        if self.tasks_cache.is_none() || refresh {
            let query = [
                ("includeDeleted", bool_token(filter.include_deleted)),
                ("includeDone", bool_token(filter.include_done)),
            ];
            debug!(refresh, "fetching task list");
            let data = self.session.get(TASKS_PATH, &query)?;
            let tasks = expect_array(data)?
                .into_iter()
                .map(|item| Task::from_data(self.session.clone(), item))
                .collect::<Result<Vec<_>, _>>()?;
            self.tasks_cache = Some(tasks);
        }
        Ok(filter_tasks(self.cached_tasks(), filter))
    }

    /// The remote or cached category list. Deleted categories are excluded
    /// client-side unless `include_deleted` is set.
    pub fn categories(
        &mut self,
        refresh: bool,
        include_deleted: bool,
    ) -> Result<Vec<Category>, ApiError> {
        if self.categories_cache.is_none() || refresh {
            let query = [("includeDeleted", bool_token(include_deleted))];
            debug!(refresh, "fetching category list");
            let data = self.session.get(CATEGORIES_PATH, &query)?;
            let categories = expect_array(data)?
                .into_iter()
                .map(|item| Category::from_data(self.session.clone(), item))
                .collect::<Result<Vec<_>, _>>()?;
            self.categories_cache = Some(categories);
        }
        Ok(self
            .cached_categories()
            .iter()
            .filter(|category| include_deleted || !category.is_deleted())
            .cloned()
            .collect())
    }

    /// The first category flagged as default, if any.
    pub fn default_category(&mut self) -> Result<Option<Category>, ApiError> {
        Ok(self
            .categories(false, false)?
            .into_iter()
            .find(Category::is_default))
    }

    /// Share-invitation records pending approval.
    pub fn pending_tasks(&mut self, refresh: bool) -> Result<Vec<Value>, ApiError> {
        if self.pending_cache.is_none() || refresh {
            debug!(refresh, "fetching pending tasks");
            let data = self.session.get(PENDING_PATH, &[])?;
            let records = data
                .get("pendingTasks")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            self.pending_cache = Some(records);
        }
        Ok(self.pending_cache.clone().unwrap_or_default())
    }

    /// Identifiers of the pending share invitations.
    pub fn pending_tasks_ids(&mut self, refresh: bool) -> Result<Vec<String>, ApiError> {
        Ok(self
            .pending_tasks(refresh)?
            .iter()
            .filter_map(|record| record.get("id").and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }

    /// Accept a pending share invitation, by explicit id or by a record
    /// carrying one. Fails with `MissingArgument` when neither supplies an
    /// id. Returns the server's response payload.
    pub fn approve_pending_task(
        &self,
        pending_task_id: Option<&str>,
        pending_task: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let id = pending_task_id
            .or_else(|| {
                pending_task
                    .and_then(|record| record.get("id"))
                    .and_then(Value::as_str)
            })
            .ok_or(ApiError::MissingArgument(
                "either pending_task_id or pending_task is required",
            ))?;
        self.session
            .post(&format!("{PENDING_PATH}/{id}/accept"), None)
    }

    /// Append to the task cache without a network call. Used by the create
    /// flow; also usable with a freshly created task from elsewhere.
    pub fn add_task(&mut self, task: Task) {
        self.tasks_cache.get_or_insert_with(Vec::new).push(task);
    }

    /// Append to the category cache without a network call.
    pub fn add_category(&mut self, category: Category) {
        self.categories_cache
            .get_or_insert_with(Vec::new)
            .push(category);
    }

    /// The raw task cache, empty when never loaded. Subtask views are
    /// computed over this.
    pub fn cached_tasks(&self) -> &[Task] {
        self.tasks_cache.as_deref().unwrap_or(&[])
    }

    /// The raw category cache, empty when never loaded.
    pub fn cached_categories(&self) -> &[Category] {
        self.categories_cache.as_deref().unwrap_or(&[])
    }
}
