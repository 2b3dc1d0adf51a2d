//! Canonical record representation
//!
//! A `CanonicalRecord` is the format-independent shape of one ingested item:
//! an insertion-ordered mapping from field name to a JSON value. CSV sources
//! only ever produce strings, nulls and lists of strings; JSON sources are
//! carried verbatim.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One normalized item, with fields in source order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalRecord(Map<String, Value>);

impl CanonicalRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Append a field, keeping insertion order
    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.0.insert(field.into(), value);
    }

    /// Builder-style variant of [`CanonicalRecord::insert`]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value.into());
        self
    }

    /// Get a field value
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Whether the field is present (a present field may still be null)
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Field names in source order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render a field as text for a string column.
    ///
    /// Absent and null fields yield `None`. Strings are returned as-is, other
    /// scalars use their JSON text, lists and objects are serialized as JSON.
    pub fn text(&self, field: &str) -> Option<String> {
        match self.0.get(field)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Serialize the full record as compact JSON, preserving field order
    pub fn to_json(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }

    /// Borrow the underlying map
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for CanonicalRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
