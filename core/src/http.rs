//! HTTP request/response values exchanged with the transport.
//!
//! # Design
//! These types describe HTTP traffic as plain data. Resources build
//! `HttpRequest` values through their `Session`; the `Transport`
//! implementation executes them and hands back an `HttpResponse`. Keeping
//! the boundary as data makes every network interaction recordable and
//! assertable in tests.
//!
//! All fields use owned types (`String`, `Vec`) so values can be stored and
//! replayed without lifetime concerns.

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

/// An HTTP request described as plain data.
///
/// `query` pairs are appended to `path` by the transport; the service uses
/// them for server-side task-list filtering.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// An HTTP response described as plain data.
///
/// Produced by the `Transport` after executing an `HttpRequest`. Non-2xx
/// statuses are returned as data, not transport errors; the `Session`
/// decides how to interpret them.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}
