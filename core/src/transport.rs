//! Transport abstraction and the shared session handle.
//!
//! # Design
//! `Transport` executes one `HttpRequest` and returns the raw
//! `HttpResponse`; non-2xx statuses come back as data, not errors, so the
//! `Session` owns status interpretation. The production implementation
//! wraps `ureq` with status-as-error disabled. Tests substitute a recording
//! transport to assert exactly which requests a resource issued — including
//! the zero-request path of a clean `save()`.
//!
//! `Session` is the shared handle threaded through every resource
//! constructor: an `Arc`'d transport plus base URL and auth token. Cloning
//! is cheap and all clones talk through the same transport. The session is
//! expected to outlive every resource spawned from it.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Method};

/// Header carrying the auth token returned by login.
pub const SESSION_TOKEN_HEADER: &str = "x-session-token";

/// Executes a single HTTP round-trip.
pub trait Transport: Send + Sync {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Production `Transport` over ureq.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses are returned as data rather than `Err`, letting the session
/// handle status interpretation.
pub struct HttpTransport {
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let url = if request.query.is_empty() {
            request.path.clone()
        } else {
            format!("{}?{}", request.path, encode_query(&request.query))
        };

        let mut response = match (request.method, request.body) {
            (Method::Get, _) => {
                let mut r = self.agent.get(&url);
                for (name, value) in &request.headers {
                    r = r.header(name.as_str(), value.as_str());
                }
                r.call()
            }
            (Method::Delete, _) => {
                let mut r = self.agent.delete(&url);
                for (name, value) in &request.headers {
                    r = r.header(name.as_str(), value.as_str());
                }
                r.call()
            }
            (Method::Post, body) => {
                let mut r = self.agent.post(&url);
                for (name, value) in &request.headers {
                    r = r.header(name.as_str(), value.as_str());
                }
                match body {
                    Some(body) => r.send(body.as_bytes()),
                    None => r.send_empty(),
                }
            }
            (Method::Put, body) => {
                let mut r = self.agent.put(&url);
                for (name, value) in &request.headers {
                    r = r.header(name.as_str(), value.as_str());
                }
                match body {
                    Some(body) => r.send(body.as_bytes()),
                    None => r.send_empty(),
                }
            }
        }
        .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response.body_mut().read_to_string().unwrap_or_default();

        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body,
        })
    }
}

/// Join query pairs into a query string. The SDK only sends fixed boolean
/// tokens here, so no percent-encoding is required.
fn encode_query(query: &[(String, String)]) -> String {
    query
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Shared handle for talking to the service.
///
/// Holds the transport, the base URL, and the auth token issued by login.
/// Every resource keeps a clone; the underlying transport is shared.
#[derive(Clone)]
pub struct Session {
    transport: Arc<dyn Transport>,
    base_url: String,
    auth_token: Option<String>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.auth_token.is_some())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// An unauthenticated session, enough for login and user registration.
    pub fn new(transport: Arc<dyn Transport>, base_url: &str) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token: None,
        }
    }

    /// Attach the auth token issued by login. Subsequent requests carry it
    /// in the session-token header.
    pub fn with_token(mut self, token: String) -> Self {
        self.auth_token = Some(token);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, ApiError> {
        self.request(Method::Get, path, query, None)
    }

    pub fn post(&self, path: &str, body: Option<&Value>) -> Result<Value, ApiError> {
        self.request(Method::Post, path, &[], body)
    }

    pub fn put(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.request(Method::Put, path, &[], Some(body))
    }

    pub fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::Delete, path, &[], None)
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let mut headers = vec![("accept".to_string(), "application/json".to_string())];
        if body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        if let Some(token) = &self.auth_token {
            headers.push((SESSION_TOKEN_HEADER.to_string(), token.clone()));
        }

        let body = body.map(serde_json::to_string).transpose()?;
        let request = HttpRequest {
            method,
            path: format!("{}{}", self.base_url, path),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            headers,
            body,
        };

        debug!(?method, path, "issuing request");
        let response = self.transport.execute(request)?;
        interpret(response)
    }
}

/// Map a raw response to a JSON value or the matching error kind.
///
/// 2xx bodies parse as JSON (empty body becomes `Null`); 401 maps to
/// `Unauthorized`, other 4xx to `Client`, 5xx to `InternalServer`. Bodies
/// are carried verbatim.
fn interpret(response: HttpResponse) -> Result<Value, ApiError> {
    match response.status {
        200..=299 => {
            if response.body.trim().is_empty() {
                Ok(Value::Null)
            } else {
                Ok(serde_json::from_str(&response.body)?)
            }
        }
        401 => Err(ApiError::Unauthorized(response.body)),
        400..=499 => Err(ApiError::Client {
            status: response.status,
            body: response.body,
        }),
        500..=599 => Err(ApiError::InternalServer {
            status: response.status,
            body: response.body,
        }),
        other => Err(ApiError::Transport(format!("unexpected HTTP status {other}"))),
    }
}
