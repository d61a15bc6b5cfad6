//! Endpoint configuration for the remote service.
//!
//! Paths are relative to the session's base URL so tests can point the SDK
//! at a local mock server.

/// Production API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.taskdo.io/v2";

/// Login endpoint; accepts JSON credentials, returns an auth token.
pub const LOGIN_PATH: &str = "/auth/login";

/// The authenticated user's own document.
pub const ME_PATH: &str = "/me";

/// User registration and account deletion.
pub const USER_PATH: &str = "/user";

/// Task collection of the authenticated user.
pub const TASKS_PATH: &str = "/me/tasks";

/// Category collection of the authenticated user.
pub const CATEGORIES_PATH: &str = "/me/categories";

/// Pending share-invitation records.
pub const PENDING_PATH: &str = "/me/pending";
