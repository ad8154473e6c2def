//! Group keys and their extraction from structured records.
//!
//! Records are arbitrarily nested maps (`serde_json::Value`). A group key
//! is an ordered tuple of field values pulled out of a record by walking a
//! configured list of dotted paths. Records sharing a key tuple form a
//! group and share one rate-limiting budget.

use serde_json::{Map, Value};
use std::fmt;

/// One element of a group key: the extracted field value, or a marker for
/// a field the record did not carry.
///
/// Absence is part of the key, not an error — two records both missing the
/// same field land in the same group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPart {
    /// The field value, rendered to text.
    Text(String),
    /// The field (or one of its parent segments) was missing.
    Absent,
}

impl KeyPart {
    /// Render a terminal record value into a key part.
    ///
    /// Strings are taken verbatim; other scalars use their JSON form.
    /// An explicit `null` counts as absent.
    fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => KeyPart::Absent,
            Value::String(s) => KeyPart::Text(s.clone()),
            other => KeyPart::Text(other.to_string()),
        }
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Text(s) => f.write_str(s),
            KeyPart::Absent => f.write_str("-"),
        }
    }
}

/// An ordered, fixed-arity tuple identifying a group of records.
///
/// Arity and field order are fixed by configuration for the process
/// lifetime, so keys compare and hash by plain value equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey(Box<[KeyPart]>);

impl GroupKey {
    /// Build a key from extracted parts.
    pub fn new(parts: Vec<KeyPart>) -> Self {
        GroupKey(parts.into_boxed_slice())
    }

    /// The key's parts, in configured path order.
    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", part)?;
        }
        Ok(())
    }
}

/// A dotted field path, split into segments once at configuration time.
#[derive(Debug, Clone)]
pub struct KeyPath {
    raw: String,
    segments: Vec<String>,
}

impl KeyPath {
    /// Parse a dotted path such as `kubernetes.container_name`.
    pub fn parse(path: &str) -> Self {
        KeyPath {
            raw: path.to_string(),
            segments: path.split('.').map(str::to_string).collect(),
        }
    }

    /// The original dotted form.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Derives group keys from records.
///
/// Navigation never fails: a missing segment, a non-object intermediate
/// value, or an explicit `null` all degrade to [`KeyPart::Absent`].
#[derive(Debug, Clone)]
pub struct KeyExtractor {
    paths: Vec<KeyPath>,
}

impl KeyExtractor {
    /// Build an extractor for the configured dotted paths.
    pub fn new<S: AsRef<str>>(paths: &[S]) -> Self {
        KeyExtractor {
            paths: paths.iter().map(|p| KeyPath::parse(p.as_ref())).collect(),
        }
    }

    /// The configured paths, in key order.
    pub fn paths(&self) -> &[KeyPath] {
        &self.paths
    }

    /// Extract the group key for a record.
    pub fn extract(&self, record: &Value) -> GroupKey {
        let parts = self
            .paths
            .iter()
            .map(|path| {
                dig(record, &path.segments)
                    .map(KeyPart::from_value)
                    .unwrap_or(KeyPart::Absent)
            })
            .collect();
        GroupKey::new(parts)
    }
}

/// Walk a record through the path segments.
fn dig<'a>(record: &'a Value, segments: &[String]) -> Option<&'a Value> {
    let mut current = record;
    for segment in segments {
        match current {
            Value::Object(map) => current = field(map, segment)?,
            _ => return None,
        }
    }
    Some(current)
}

/// Look up a segment in a record map.
///
/// Some upstream serializers keep map keys in a symbol-prefixed form
/// (`:name` rather than `name`); both spellings address the same field.
fn field<'a>(map: &'a Map<String, Value>, segment: &str) -> Option<&'a Value> {
    if let Some(value) = map.get(segment) {
        return Some(value);
    }
    let mut symbol = String::with_capacity(segment.len() + 1);
    symbol.push(':');
    symbol.push_str(segment);
    map.get(&symbol)
}
