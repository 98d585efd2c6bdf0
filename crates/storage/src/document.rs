//! Untyped nested document model.
//!
//! Trial, clinical, and genomic documents are heterogeneous curated data —
//! Design Note 2 directs against generating a static schema for them. A
//! `Document` is a tagged variant tree (scalar | sequence | mapping) with
//! convenience accessors, backed directly by `serde_json::Value` the way
//! `crates/eval/src/fact_provider.rs`'s `FactProvider`/`AdapterFactProvider`
//! pass untyped JSON around instead of typed structs.

use serde_json::Value;
use std::collections::BTreeMap;

/// A single document as returned from or sent to a collection.
///
/// Thin wrapper over `serde_json::Value` so callers get path-navigation
/// helpers without committing this crate to any document store's own
/// value representation.
#[derive(Debug, Clone, PartialEq)]
pub struct Document(pub Value);

impl Document {
    pub fn new(value: Value) -> Self {
        Document(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Look up a single key on this document if it is a mapping.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.as_object().and_then(|obj| obj.get(key))
    }

    /// Navigate a dotted path of keys/array indices, e.g. `"arm.0.dose"`.
    pub fn get_path(&self, path: &[PathSegment]) -> Option<&Value> {
        let mut cur = &self.0;
        for seg in path {
            cur = match (seg, cur) {
                (PathSegment::Key(k), Value::Object(obj)) => obj.get(k.as_str())?,
                (PathSegment::Index(i), Value::Array(arr)) => arr.get(*i)?,
                _ => return None,
            };
        }
        Some(cur)
    }

    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }

    pub fn as_object(&self) -> Option<&serde_json::Map<String, Value>> {
        self.0.as_object()
    }

    /// Read a string field, normalized (lowercased and trimmed), falling
    /// back to `default` when the field is absent. Per Design Note 4, the
    /// extractor must read with an explicit default rather than mutating
    /// the input document.
    pub fn normalized_string_field(&self, key: &str, default: &str) -> String {
        self.get(key)
            .and_then(Value::as_str)
            .map(|s| s.trim().to_ascii_lowercase())
            .unwrap_or_else(|| default.to_string())
    }
}

impl From<Value> for Document {
    fn from(value: Value) -> Self {
        Document(value)
    }
}

/// One segment of a parent path: a dict key, or a list index.
///
/// A trial's `parent_path` (spec.md §4.2) is the ordered chain of these
/// leading from the trial root to a `match` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathSegment::Key(k) => write!(f, "{k}"),
            PathSegment::Index(i) => write!(f, "{i}"),
        }
    }
}

/// A predicate applied to one field in a query — `{"$in": [...]}`,
/// `{"$gte": 18}`, or a bare equality value.
pub type DocumentPredicate = Value;

/// A single conjunctive clause: field name -> predicate, all ANDed together.
pub type AndClause = BTreeMap<String, DocumentPredicate>;
