//! Synchronous SDK for the remote task-management service.
//!
//! # Overview
//! Authenticates a user and exposes typed proxies for remote resources
//! (`User`, `Task`, `Category`) that mirror server-side JSON documents,
//! track local mutations, and push them back via minimal API calls.
//!
//! # Design
//! - Every resource owns an `AttributeStore` with `original`/`current`
//!   maps; only fields that actually changed travel in an update, and a
//!   clean resource skips the network entirely on save.
//! - Field access is gated by a fixed per-type allowed field set — reading
//!   or writing an unknown field fails instead of materializing it.
//! - The `Transport` trait keeps the HTTP round-trip substitutable; the
//!   production implementation wraps ureq, tests record requests in-memory
//!   or run against the workspace's mock server.
//! - All operations are synchronous request/response; the `Session` handle
//!   is shared (`Arc`) across resources and caches assume a single writer.

pub mod attrs;
pub mod category;
pub mod client;
pub mod constants;
pub mod error;
pub mod http;
pub mod resource;
pub mod task;
pub mod transport;
pub mod user;

pub use attrs::AttributeStore;
pub use category::Category;
pub use client::Client;
pub use error::ApiError;
pub use http::{HttpRequest, HttpResponse, Method};
pub use resource::Resource;
pub use task::{filter_tasks, Task, TaskFilter, TaskStatus};
pub use transport::{HttpTransport, Session, Transport};
pub use user::User;
