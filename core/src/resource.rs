//! The capability set shared by every remote resource.
//!
//! # Design
//! `Resource` is a trait rather than a base class: each concrete type
//! (User, Task, Category) supplies its endpoint, allowed field set, and
//! accessors to its store and session; load/save/destroy behavior lives in
//! provided methods. A save consults the dirty set first — a clean
//! resource issues zero requests. Updates carry only the dirty payload,
//! never the whole document.
//!
//! On a failed save the store keeps its local edits and stays dirty
//! (retain-on-failure); callers can `revert` through the store if they want
//! to roll back instead.

use serde_json::{Map, Value};
use tracing::debug;

use crate::attrs::AttributeStore;
use crate::error::ApiError;
use crate::transport::Session;

/// Shared behavior of remote resources: dirty-tracked field access plus
/// load/save/destroy semantics against the resource's endpoint.
pub trait Resource {
    /// Human-readable type name used in error messages.
    const TYPE_NAME: &'static str;

    /// Collection endpoint, e.g. `/me/tasks`.
    const ENDPOINT: &'static str;

    /// The fixed field set this resource type accepts.
    const ALLOWED_FIELDS: &'static [&'static str];

    /// Fields that must be present when creating a new record.
    const REQUIRED_FIELDS: &'static [&'static str];

    fn store(&self) -> &AttributeStore;
    fn store_mut(&mut self) -> &mut AttributeStore;
    fn session(&self) -> &Session;

    /// Read a tracked field. Unknown fields fail instead of silently
    /// materializing — this is what separates a resource proxy from an
    /// arbitrary key/value bag.
    fn get(&self, field: &str) -> Result<&Value, ApiError> {
        self.store().get(field)
    }

    /// Assign a tracked field, subject to the allowed field set.
    fn set(&mut self, field: &str, value: Value) -> Result<(), ApiError> {
        self.store_mut().set(field, value)
    }

    /// Server-assigned identifier, absent until the record exists remotely.
    fn id(&self) -> Option<&str> {
        self.store().try_get("id").and_then(Value::as_str)
    }

    fn is_dirty(&self) -> bool {
        self.store().is_dirty()
    }

    /// Push changed fields to the server. No-op (zero requests) when
    /// nothing changed since the last load or commit.
    fn save(&mut self) -> Result<(), ApiError> {
        self.save_to(None)
    }

    /// Like `save`, but against an alternate endpoint. `User` saves to the
    /// `/me` endpoint this way instead of the generic user endpoint.
    fn save_to(&mut self, alternate_endpoint: Option<&str>) -> Result<(), ApiError> {
        if !self.is_dirty() {
            debug!(resource = Self::TYPE_NAME, "nothing changed, skipping save");
            return Ok(());
        }

        let path = match alternate_endpoint {
            Some(path) => path.to_string(),
            None => {
                let id = self.id().ok_or_else(|| ApiError::FieldNotFound {
                    field: "id".to_string(),
                })?;
                format!("{}/{}", Self::ENDPOINT, id)
            }
        };

        let payload = Value::Object(self.store().dirty_payload());
        debug!(resource = Self::TYPE_NAME, %path, "saving dirty fields");
        let response = self.session().put(&path, &payload)?;

        // The service echoes the updated document back; sync from it when
        // present, otherwise just mark the store clean.
        match response {
            Value::Object(doc) => self.store_mut().reload(doc),
            _ => self.store_mut().commit(),
        }
        Ok(())
    }

    /// Delete the record on the server. The resource is logically dead
    /// afterwards and must not be reused.
    fn destroy(&mut self) -> Result<(), ApiError> {
        self.destroy_to(None)
    }

    /// Like `destroy`, but against an alternate endpoint.
    fn destroy_to(&mut self, alternate_endpoint: Option<&str>) -> Result<(), ApiError> {
        let path = match alternate_endpoint {
            Some(path) => path.to_string(),
            None => {
                let id = self.id().ok_or_else(|| ApiError::FieldNotFound {
                    field: "id".to_string(),
                })?;
                format!("{}/{}", Self::ENDPOINT, id)
            }
        };
        debug!(resource = Self::TYPE_NAME, %path, "destroying");
        self.session().delete(&path)?;
        Ok(())
    }

    /// Pure alias for `destroy`: identical request, identical post-condition.
    fn delete(&mut self) -> Result<(), ApiError> {
        self.destroy()
    }
}

/// Fail with `MissingRequiredAttributes` naming every absent field.
pub(crate) fn require_fields(
    resource: &'static str,
    required: &[&str],
    data: &Map<String, Value>,
) -> Result<(), ApiError> {
    let missing: Vec<String> = required
        .iter()
        .filter(|field| !data.get(**field).is_some_and(|v| !v.is_null()))
        .map(|field| field.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ApiError::MissingRequiredAttributes {
            resource,
            fields: missing,
        })
    }
}

pub(crate) fn expect_object(value: Value) -> Result<Map<String, Value>, ApiError> {
    match value {
        Value::Object(doc) => Ok(doc),
        other => Err(ApiError::Json(serde::de::Error::custom(format!(
            "expected a JSON object, got {other}"
        )))),
    }
}

pub(crate) fn expect_array(value: Value) -> Result<Vec<Value>, ApiError> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(ApiError::Json(serde::de::Error::custom(format!(
            "expected a JSON array, got {other}"
        )))),
    }
}

/// Client-side validation plus the create request, shared by every
/// resource type's `create`.
///
/// Unknown fields and missing required fields fail before any request is
/// issued; on success the server's document seeds a clean store carrying
/// the assigned identifier.
pub(crate) fn create_resource(
    session: &Session,
    resource: &'static str,
    endpoint: &str,
    allowed: &'static [&'static str],
    required: &'static [&'static str],
    attrs: Map<String, Value>,
) -> Result<AttributeStore, ApiError> {
    for field in attrs.keys() {
        if !allowed.contains(&field.as_str()) {
            return Err(ApiError::UnknownField {
                resource,
                field: field.clone(),
            });
        }
    }
    require_fields(resource, required, &attrs)?;

    debug!(resource, endpoint, "creating");
    let response = session.post(endpoint, Some(&Value::Object(attrs)))?;
    let doc = expect_object(response)?;
    Ok(AttributeStore::from_server(resource, allowed, doc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::mock_session;
    use serde_json::json;

    const ALLOWED: &[&str] = &["id", "title", "status"];

    struct Widget {
        store: AttributeStore,
        session: Session,
    }

    impl Widget {
        fn from_server(session: Session, data: Value) -> Self {
            Self {
                store: AttributeStore::from_server(
                    Self::TYPE_NAME,
                    Self::ALLOWED_FIELDS,
                    data.as_object().unwrap().clone(),
                ),
                session,
            }
        }
    }

    impl Resource for Widget {
        const TYPE_NAME: &'static str = "Widget";
        const ENDPOINT: &'static str = "/me/widgets";
        const ALLOWED_FIELDS: &'static [&'static str] = ALLOWED;
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

    #[test]
    fn clean_save_issues_zero_requests() {
        let (transport, session) = mock_session();
        let mut widget = Widget::from_server(session, json!({"id": "w-1", "title": "A"}));

        widget.save().unwrap();
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn setting_equal_value_then_save_issues_zero_requests() {
        let (transport, session) = mock_session();
        let mut widget = Widget::from_server(session, json!({"id": "w-1", "title": "A"}));

        widget.set("title", json!("A")).unwrap();
        widget.save().unwrap();
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn dirty_save_puts_only_changed_fields() {
        let (transport, session) = mock_session();
        let mut widget = Widget::from_server(
            session,
            json!({"id": "w-1", "title": "A", "status": "UNCHECKED"}),
        );
        transport.push_response(
            200,
            r#"{"id": "w-1", "title": "B", "status": "UNCHECKED"}"#,
        );

        widget.set("title", json!("B")).unwrap();
        widget.save().unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "http://mock/me/widgets/w-1");
        let body: Value = serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"title": "B"}));
        assert!(!widget.is_dirty());
    }

    #[test]
    fn failed_save_retains_local_edits_dirty() {
        let (transport, session) = mock_session();
        let mut widget = Widget::from_server(session, json!({"id": "w-1", "title": "A"}));
        transport.push_response(500, "boom");

        widget.set("title", json!("B")).unwrap();
        let err = widget.save().unwrap_err();
        assert!(matches!(err, ApiError::InternalServer { status: 500, .. }));
        assert!(widget.is_dirty());
        assert_eq!(widget.get("title").unwrap(), "B");
    }

    #[test]
    fn save_without_id_or_alternate_endpoint_fails() {
        let (transport, session) = mock_session();
        let mut widget = Widget {
            store: AttributeStore::from_local(
                "Widget",
                ALLOWED,
                json!({"title": "A"}).as_object().unwrap().clone(),
            ),
            session,
        };

        let err = widget.save().unwrap_err();
        assert!(matches!(err, ApiError::FieldNotFound { field } if field == "id"));
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn destroy_and_delete_issue_identical_requests() {
        let (transport, session) = mock_session();
        let data = json!({"id": "w-1", "title": "A"});
        let mut first = Widget::from_server(session.clone(), data.clone());
        let mut second = Widget::from_server(session, data);
        transport.push_response(204, "");
        transport.push_response(204, "");

        first.destroy().unwrap();
        second.delete().unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, requests[1].method);
        assert_eq!(requests[0].path, requests[1].path);
        assert_eq!(requests[0].body, requests[1].body);
    }

    #[test]
    fn create_rejects_unknown_fields_before_any_request() {
        let (transport, session) = mock_session();
        let attrs = json!({"title": "A", "bogus": 1}).as_object().unwrap().clone();

        let err = create_resource(&session, "Widget", "/me/widgets", ALLOWED, &["title"], attrs)
            .unwrap_err();
        assert!(matches!(err, ApiError::UnknownField { field, .. } if field == "bogus"));
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn create_lists_all_missing_required_fields() {
        let (transport, session) = mock_session();
        let attrs = json!({"status": "UNCHECKED"}).as_object().unwrap().clone();

        let err = create_resource(
            &session,
            "Widget",
            "/me/widgets",
            ALLOWED,
            &["title", "id"],
            attrs,
        )
        .unwrap_err();
        match err {
            ApiError::MissingRequiredAttributes { fields, .. } => {
                assert_eq!(fields, vec!["title".to_string(), "id".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn create_seeds_clean_store_from_server_document() {
        let (transport, session) = mock_session();
        transport.push_response(201, r#"{"id": "w-9", "title": "A", "status": "UNCHECKED"}"#);
        let attrs = json!({"title": "A"}).as_object().unwrap().clone();

        let store =
            create_resource(&session, "Widget", "/me/widgets", ALLOWED, &["title"], attrs).unwrap();
        assert!(!store.is_dirty());
        assert_eq!(store.get("id").unwrap(), "w-9");
    }

    #[test]
    fn create_surfaces_server_errors_verbatim() {
        let (transport, session) = mock_session();
        transport.push_response(500, "cannot create");
        let attrs = json!({"title": "A"}).as_object().unwrap().clone();

        let err = create_resource(&session, "Widget", "/me/widgets", ALLOWED, &["title"], attrs)
            .unwrap_err();
        assert!(matches!(err, ApiError::InternalServer { body, .. } if body == "cannot create"));
    }
}
