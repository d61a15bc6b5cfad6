//! Error types for the task-management SDK.
//!
//! # Design
//! Client-side contract violations (unknown field, missing required
//! attributes, missing call argument) are raised before any request is
//! issued. Server-side failures keep the upstream status and body verbatim:
//! 4xx lands in `Client`, 5xx in `InternalServer`. Neither is ever retried
//! or translated here; the caller owns retry policy.

use thiserror::Error;

/// Errors returned by the SDK.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Credentials were rejected during login, or the session expired.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A required attribute was absent when creating or loading a resource.
    /// Checked client-side to avoid a guaranteed-to-fail round trip.
    #[error("{resource} is missing required attributes: {}", fields.join(", "))]
    MissingRequiredAttributes {
        resource: &'static str,
        fields: Vec<String>,
    },

    /// The field is not part of the resource type's allowed field set.
    #[error("unknown field `{field}` for {resource}")]
    UnknownField {
        resource: &'static str,
        field: String,
    },

    /// The field is allowed for the resource type but has no value.
    #[error("field `{field}` is not set")]
    FieldNotFound { field: String },

    /// A required call argument was omitted.
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    /// The server returned a 4xx status. Body is passed through verbatim.
    #[error("client error: HTTP {status}: {body}")]
    Client { status: u16, body: String },

    /// The server returned a 5xx status. Body is passed through verbatim.
    #[error("internal server error: HTTP {status}: {body}")]
    InternalServer { status: u16, body: String },

    /// The request could not be executed at all (connect failure, timeout).
    #[error("transport failure: {0}")]
    Transport(String),

    /// A request payload or response body failed to (de)serialize.
    #[error("serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_attributes_lists_fields() {
        let err = ApiError::MissingRequiredAttributes {
            resource: "Task",
            fields: vec!["title".to_string(), "status".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Task is missing required attributes: title, status"
        );
    }

    #[test]
    fn server_errors_keep_status_and_body() {
        let err = ApiError::InternalServer {
            status: 503,
            body: "overloaded".to_string(),
        };
        assert_eq!(err.to_string(), "internal server error: HTTP 503: overloaded");
    }
}
