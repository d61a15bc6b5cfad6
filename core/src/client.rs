//! Authentication entry point.
//!
//! # Design
//! `Client` performs the credential handshake and hands out the
//! authenticated `User`. Login is the only operation allowed on an
//! unauthenticated session (besides registration); every rejection of
//! credentials — whatever 4xx the server chose — maps to `Unauthorized`.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug;

use crate::constants::{DEFAULT_BASE_URL, LOGIN_PATH, ME_PATH};
use crate::error::ApiError;
use crate::transport::{HttpTransport, Session, Transport};
use crate::user::User;

/// The main interface for communication with the API. Responsible for
/// authentication.
#[derive(Debug)]
pub struct Client {
    session: Session,
}

impl Client {
    /// Log in against the production service.
    pub fn log_in(email: &str, password: &str) -> Result<Client, ApiError> {
        Self::log_in_with(
            Arc::new(HttpTransport::new()),
            DEFAULT_BASE_URL,
            email,
            password,
        )
    }

    /// Log in with an explicit transport and base URL. Tests point this at
    /// a local mock server.
    pub fn log_in_with(
        transport: Arc<dyn Transport>,
        base_url: &str,
        email: &str,
        password: &str,
    ) -> Result<Client, ApiError> {
        let session = Session::new(transport, base_url);
        let credentials = json!({ "email": email, "password": password });

        debug!(email, "logging in");
        let response = match session.post(LOGIN_PATH, Some(&credentials)) {
            Ok(value) => value,
            Err(ApiError::Unauthorized(body)) | Err(ApiError::Client { body, .. }) => {
                return Err(ApiError::Unauthorized(body));
            }
            Err(other) => return Err(other),
        };

        let token = response
            .get("authToken")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ApiError::Unauthorized("login response carried no auth token".to_string())
            })?;

        Ok(Client {
            session: session.with_token(token.to_string()),
        })
    }

    /// The authenticated session. Shared by every resource the client
    /// produces; it must outlive them all.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Fetch the authenticated user's document and wrap it.
    pub fn me(&self) -> Result<User, ApiError> {
        let data = self.session.get(ME_PATH, &[])?;
        User::from_data(self.session.clone(), data)
    }
}
