//! Attribute storage with change tracking.
//!
//! # Design
//! Each resource owns an `AttributeStore` holding two maps: `original`
//! (fields as last synced with the server) and `current` (possibly
//! mutated). A field is dirty when the two disagree by value; the dirty
//! set drives minimal update payloads, and an empty dirty set means a save
//! is a no-op. Every key in `current` must belong to the resource type's
//! fixed allowed field set — assignment of an unknown field is rejected
//! without mutating the store. Keys outside the allowed set in incoming
//! server documents are dropped on load, so the invariant holds even when
//! the server grows new fields.
//!
//! Save-failure policy: local edits are retained and stay dirty. `revert`
//! exists for callers that want to roll back to the last synced state, but
//! nothing calls it implicitly.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::ApiError;

/// A resource's known fields plus change-tracking metadata.
#[derive(Debug, Clone)]
pub struct AttributeStore {
    resource: &'static str,
    allowed: &'static [&'static str],
    original: BTreeMap<String, Value>,
    current: BTreeMap<String, Value>,
}

impl AttributeStore {
    /// Wrap an existing server document: all fields clean.
    pub fn from_server(
        resource: &'static str,
        allowed: &'static [&'static str],
        data: Map<String, Value>,
    ) -> Self {
        let current: BTreeMap<String, Value> = data
            .into_iter()
            .filter(|(key, _)| allowed.contains(&key.as_str()))
            .collect();
        Self {
            resource,
            allowed,
            original: current.clone(),
            current,
        }
    }

    /// Seed a record that does not exist on the server yet: all fields
    /// dirty, so the first save sends everything.
    pub fn from_local(
        resource: &'static str,
        allowed: &'static [&'static str],
        data: Map<String, Value>,
    ) -> Self {
        let current: BTreeMap<String, Value> = data
            .into_iter()
            .filter(|(key, _)| allowed.contains(&key.as_str()))
            .collect();
        Self {
            resource,
            allowed,
            original: BTreeMap::new(),
            current,
        }
    }

    pub fn resource(&self) -> &'static str {
        self.resource
    }

    /// Read a field. Unknown fields (outside the allowed set) fail with
    /// `UnknownField`; allowed-but-unset fields fail with `FieldNotFound`.
    pub fn get(&self, field: &str) -> Result<&Value, ApiError> {
        if !self.allowed.contains(&field) {
            return Err(ApiError::UnknownField {
                resource: self.resource,
                field: field.to_string(),
            });
        }
        self.current.get(field).ok_or_else(|| ApiError::FieldNotFound {
            field: field.to_string(),
        })
    }

    /// A field's value, or `None` when unset. Still rejects fields outside
    /// the allowed set.
    pub fn try_get(&self, field: &str) -> Option<&Value> {
        self.current.get(field)
    }

    /// Assign a field. Fields outside the allowed set are rejected and the
    /// store is left untouched. Assigning a value equal to the present one
    /// does not make the field dirty — dirtiness compares values, not
    /// assignment occurrences.
    pub fn set(&mut self, field: &str, value: Value) -> Result<(), ApiError> {
        if !self.allowed.contains(&field) {
            return Err(ApiError::UnknownField {
                resource: self.resource,
                field: field.to_string(),
            });
        }
        self.current.insert(field.to_string(), value);
        Ok(())
    }

    /// True iff any field differs between `current` and `original`.
    pub fn is_dirty(&self) -> bool {
        self.current != self.original
    }

    /// Only the changed fields, for minimal update requests.
    pub fn dirty_payload(&self) -> Map<String, Value> {
        self.current
            .iter()
            .filter(|(key, value)| self.original.get(*key) != Some(*value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Mark the store clean after a confirmed server round-trip.
    pub fn commit(&mut self) {
        self.original = self.current.clone();
    }

    /// Discard local edits, restoring the last synced state.
    pub fn revert(&mut self) {
        self.current = self.original.clone();
    }

    /// Replace the whole store from a fresh server document, clean.
    pub fn reload(&mut self, data: Map<String, Value>) {
        self.current = data
            .into_iter()
            .filter(|(key, _)| self.allowed.contains(&key.as_str()))
            .collect();
        self.original = self.current.clone();
    }

    /// Write a field as already-synced server state: both maps are updated,
    /// so the field reads back clean and other fields' dirtiness is
    /// untouched. Used when a dedicated endpoint (note append) returns the
    /// new value out of band of a generic save.
    pub fn sync_field(&mut self, field: &str, value: Value) -> Result<(), ApiError> {
        if !self.allowed.contains(&field) {
            return Err(ApiError::UnknownField {
                resource: self.resource,
                field: field.to_string(),
            });
        }
        self.current.insert(field.to_string(), value.clone());
        self.original.insert(field.to_string(), value);
        Ok(())
    }

    /// Remove a field from both maps. Used for write-only fields such as a
    /// user's password, which must not be retained after creation.
    pub fn forget(&mut self, field: &str) {
        self.current.remove(field);
        self.original.remove(field);
    }

    /// Current attributes as a JSON object.
    pub fn to_json(&self) -> Map<String, Value> {
        self.current
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// Two stores are equal iff all tracked attributes are equal.
impl PartialEq for AttributeStore {
    fn eq(&self, other: &Self) -> bool {
        self.current == other.current
    }
}

impl Eq for AttributeStore {}
