//! Full SDK lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives the SDK through
//! login, task and category management, the subtask and note flows, and
//! pending-task approval — all over real HTTP. Request-counting assertions
//! live in the module tests; this suite validates end-to-end wiring.

use std::sync::Arc;

use serde_json::json;
use taskdo_core::{ApiError, Category, Client, HttpTransport, Resource, Task, TaskFilter, User};

/// Boot the mock server on a random port and return its base URL.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            let mut state = mock_server::ServiceState::new(
                "Ada",
                mock_server::DEFAULT_EMAIL,
                mock_server::DEFAULT_PASSWORD,
            );
            state.pending.push(mock_server::PendingDoc {
                id: "p-1".to_string(),
                shared_by: "bob@example.com".to_string(),
                title: "Shared task".to_string(),
            });
            let db = Arc::new(tokio::sync::RwLock::new(state));
            mock_server::run_with(listener, db).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn log_in(base_url: &str) -> Client {
    Client::log_in_with(
        Arc::new(HttpTransport::new()),
        base_url,
        mock_server::DEFAULT_EMAIL,
        mock_server::DEFAULT_PASSWORD,
    )
    .unwrap()
}

fn attrs(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    value.as_object().unwrap().clone()
}

#[test]
fn bad_credentials_are_rejected() {
    let base_url = start_server();
    let err = Client::log_in_with(
        Arc::new(HttpTransport::new()),
        &base_url,
        mock_server::DEFAULT_EMAIL,
        "wrong",
    )
    .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized(_)));
}

#[test]
fn task_lifecycle() {
    let base_url = start_server();
    let client = log_in(&base_url);
    let mut user: User = client.me().unwrap();
    assert_eq!(user.email(), Some(mock_server::DEFAULT_EMAIL));

    // Step 1: list — empty to begin with.
    assert!(user.tasks(false, &TaskFilter::default()).unwrap().is_empty());

    // Step 2: create a task; it lands in the cache without a refetch.
    let mut task = Task::create(
        &mut user,
        attrs(json!({
            "title": "Integration task",
            "category": "Personal",
            "priority": "Normal",
            "status": "UNCHECKED"
        })),
    )
    .unwrap();
    let id = task.id().unwrap().to_string();
    assert_eq!(user.cached_tasks().len(), 1);

    // Step 3: reload from the server — the round trip keeps the title.
    let tasks = user.tasks(true, &TaskFilter::default()).unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id(), Some(id.as_str()));
    assert_eq!(tasks[0].title(), Some("Integration task"));

    // Step 4: partial update through the dirty set.
    task.set("title", json!("Renamed task")).unwrap();
    task.save().unwrap();
    assert!(!task.is_dirty());
    let tasks = user.tasks(true, &TaskFilter::default()).unwrap();
    assert_eq!(tasks[0].title(), Some("Renamed task"));

    // Step 5: status transitions; DONE drops out of the default view.
    task.check().unwrap();
    assert_eq!(task.status_token(), Some("CHECKED"));
    task.done().unwrap();
    assert!(user.tasks(true, &TaskFilter::default()).unwrap().is_empty());
    let with_done = TaskFilter {
        include_done: true,
        ..TaskFilter::default()
    };
    assert_eq!(user.tasks(true, &with_done).unwrap().len(), 1);

    // Step 6: destroy — gone after refresh.
    task.destroy().unwrap();
    assert!(user.tasks(true, &with_done).unwrap().is_empty());
}

#[test]
fn subtasks_and_notes() {
    let base_url = start_server();
    let client = log_in(&base_url);
    let mut user = client.me().unwrap();

    let parent = Task::create(
        &mut user,
        attrs(json!({"title": "Parent", "status": "UNCHECKED"})),
    )
    .unwrap();
    let mut child = parent
        .create_subtask(&mut user, attrs(json!({"title": "Child", "status": "UNCHECKED"})))
        .unwrap();
    assert_eq!(child.parent_global_task_id(), parent.id());

    // The subtask view is computed over the user's cache.
    let subtasks = parent.subtasks(&user);
    assert_eq!(subtasks.len(), 1);
    assert_eq!(subtasks[0].id(), child.id());

    // Notes go through the dedicated append endpoint.
    assert!(child.notes().is_empty());
    child.add_note("Hello world").unwrap();
    child.add_note("Second note").unwrap();
    assert_eq!(child.notes(), vec!["Hello world", "Second note"]);

    // A refresh shows the same notes from the server side.
    user.tasks(true, &TaskFilter::default()).unwrap();
    let fetched = parent.subtasks(&user);
    assert_eq!(fetched[0].notes(), vec!["Hello world", "Second note"]);
}

#[test]
fn categories_and_default() {
    let base_url = start_server();
    let client = log_in(&base_url);
    let mut user = client.me().unwrap();

    assert!(user.categories(false, false).unwrap().is_empty());
    assert!(user.default_category().unwrap().is_none());

    Category::create(&mut user, attrs(json!({"name": "Personal", "isDefault": true}))).unwrap();
    Category::create(&mut user, attrs(json!({"name": "Work"}))).unwrap();
    assert_eq!(user.cached_categories().len(), 2);

    let refreshed = user.categories(true, false).unwrap();
    assert_eq!(refreshed.len(), 2);
    let default = user.default_category().unwrap().unwrap();
    assert_eq!(default.name(), Some("Personal"));
}

#[test]
fn pending_task_approval() {
    let base_url = start_server();
    let client = log_in(&base_url);
    let mut user = client.me().unwrap();

    let ids = user.pending_tasks_ids(false).unwrap();
    assert_eq!(ids, vec!["p-1".to_string()]);

    let response = user.approve_pending_task(Some("p-1"), None).unwrap();
    assert_eq!(response["status"], "accepted");

    // The invitation is consumed and the shared task shows up in the list.
    assert!(user.pending_tasks(true).unwrap().is_empty());
    let tasks = user.tasks(true, &TaskFilter::default()).unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title(), Some("Shared task"));
}

#[test]
fn user_profile_update() {
    let base_url = start_server();
    let client = log_in(&base_url);
    let mut user = client.me().unwrap();

    user.set("name", json!("Ada L.")).unwrap();
    user.save().unwrap();
    assert!(!user.is_dirty());

    let fresh = client.me().unwrap();
    assert_eq!(fresh.name(), Some("Ada L."));
}
