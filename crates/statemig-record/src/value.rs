//! Untyped record values
//!
//! [`Value`] is the tagged union every persisted attribute is stored as, and
//! [`RawRecord`] is the string-keyed mapping the migrator operates on. Both
//! serialize as plain JSON.

use std::collections::btree_map::{self, BTreeMap};

use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Number, Value as JsonValue};

use crate::path::{is_index, FieldPath};

/// A JSON-shaped attribute value
///
/// Numbers keep their exact JSON representation so a record survives a
/// load/upgrade/store cycle byte-for-byte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "JsonValue", into = "JsonValue")]
pub enum Value {
    /// Explicit null (an attribute that is declared but unset)
    Null,
    /// Boolean scalar
    Bool(bool),
    /// Numeric scalar
    Number(Number),
    /// String scalar
    String(String),
    /// Ordered sequence (lists and sets are both stored as sequences)
    Sequence(Vec<Value>),
    /// Nested record
    Nested(RawRecord),
}

impl Value {
    /// Check for explicit null
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check for a scalar (string, bool or number)
    #[inline]
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Bool(_) | Self::Number(_) | Self::String(_))
    }

    /// String contents, if this is a string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean contents, if this is a bool
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Sequence elements, if this is a sequence
    #[inline]
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Nested record, if this is one
    #[inline]
    #[must_use]
    pub fn as_record(&self) -> Option<&RawRecord> {
        match self {
            Self::Nested(record) => Some(record),
            _ => None,
        }
    }

    /// Short name of the variant, for diagnostics
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Sequence(_) => "sequence",
            Self::Nested(_) => "nested",
        }
    }

    /// Nesting depth: scalars are 0, each sequence or record adds 1
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Sequence(items) => 1 + items.iter().map(Value::depth).max().unwrap_or(0),
            Self::Nested(record) => record.depth(),
            _ => 0,
        }
    }

    /// Wrap this value as the single element of a sequence
    #[inline]
    #[must_use]
    pub fn into_singleton(self) -> Self {
        Self::Sequence(vec![self])
    }

    fn child(&self, segment: &str) -> Option<&Value> {
        match self {
            Self::Nested(record) => record.get(segment),
            Self::Sequence(items) if is_index(segment) => {
                segment.parse::<usize>().ok().and_then(|i| items.get(i))
            }
            _ => None,
        }
    }

    fn child_mut(&mut self, segment: &str) -> Option<&mut Value> {
        match self {
            Self::Nested(record) => record.get_mut(segment),
            Self::Sequence(items) if is_index(segment) => {
                segment.parse::<usize>().ok().and_then(|i| items.get_mut(i))
            }
            _ => None,
        }
    }
}

impl From<JsonValue> for Value {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(b),
            JsonValue::Number(n) => Self::Number(n),
            JsonValue::String(s) => Self::String(s),
            JsonValue::Array(items) => Self::Sequence(items.into_iter().map(Self::from).collect()),
            JsonValue::Object(map) => Self::Nested(RawRecord::from(map)),
        }
    }
}

impl From<Value> for JsonValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(b),
            Value::Number(n) => JsonValue::Number(n),
            Value::String(s) => JsonValue::String(s),
            Value::Sequence(items) => JsonValue::Array(items.into_iter().map(Into::into).collect()),
            Value::Nested(record) => JsonValue::Object(record.into()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Self::Number(n.into())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Sequence(items)
    }
}

impl From<RawRecord> for Value {
    fn from(record: RawRecord) -> Self {
        Self::Nested(record)
    }
}

/// Untyped, string-keyed persisted state of one resource instance
///
/// Keys are kept sorted so iteration and serialization are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(BTreeMap<String, Value>);

impl RawRecord {
    /// Create empty record
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a JSON object
    ///
    /// # Errors
    /// Returns error if the text is not JSON or not a JSON object
    pub fn from_json(json: &str) -> Result<Self, RecordError> {
        let value: JsonValue = serde_json::from_str(json)?;
        Self::try_from(value)
    }

    /// Serialize to pretty-printed JSON
    ///
    /// # Errors
    /// Returns error if serialization fails (rare for JSON)
    pub fn to_json_pretty(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Value under `key`, including explicit nulls
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Mutable value under `key`
    #[inline]
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    /// Insert a value, returning the previous one
    #[inline]
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Remove a key, returning its value
    #[inline]
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Whether `key` exists, even if null
    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Whether `key` exists and is not null
    #[inline]
    #[must_use]
    pub fn is_present(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(|v| !v.is_null())
    }

    /// Keys in sorted order
    #[inline]
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Entries in key order
    #[inline]
    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.0.iter()
    }

    /// Number of keys
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the record has no keys
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Nesting depth: a flat record is 1
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + self.0.values().map(Value::depth).max().unwrap_or(0)
    }

    /// Resolve a [`FieldPath`], stepping through nested records and
    /// sequence indices
    #[must_use]
    pub fn get_path(&self, path: &FieldPath) -> Option<&Value> {
        let mut segments = path.iter();
        let mut current = self.get(segments.next()?)?;
        for segment in segments {
            current = current.child(segment)?;
        }
        Some(current)
    }

    /// Mutable variant of [`RawRecord::get_path`]
    pub fn get_path_mut(&mut self, path: &FieldPath) -> Option<&mut Value> {
        let mut segments = path.iter();
        let mut current = self.get_mut(segments.next()?)?;
        for segment in segments {
            current = current.child_mut(segment)?;
        }
        Some(current)
    }
}

impl From<JsonMap<String, JsonValue>> for RawRecord {
    fn from(map: JsonMap<String, JsonValue>) -> Self {
        Self(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
    }
}

impl From<RawRecord> for JsonMap<String, JsonValue> {
    fn from(record: RawRecord) -> Self {
        record.0.into_iter().map(|(k, v)| (k, v.into())).collect()
    }
}

impl TryFrom<JsonValue> for RawRecord {
    type Error = RecordError;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        match value {
            JsonValue::Object(map) => Ok(Self::from(map)),
            other => Err(RecordError::NotAnObject(Value::from(other).kind_name())),
        }
    }
}

impl From<RawRecord> for JsonValue {
    fn from(record: RawRecord) -> Self {
        JsonValue::Object(record.into())
    }
}

impl FromIterator<(String, Value)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for RawRecord {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a RawRecord {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Errors loading or storing records
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// Top-level JSON was not an object
    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),

    /// Malformed JSON
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: JsonValue) -> RawRecord {
        RawRecord::try_from(value).unwrap()
    }

    #[test]
    fn json_conversion_keeps_shape() {
        let json = json!({
            "display_name": "app",
            "owners": ["a", "b"],
            "web": [{"homepage_url": null, "implicit_grant": [{"access_token_issuance_enabled": true}]}],
            "count": 3
        });
        let rec = record(json.clone());

        assert_eq!(rec.get("display_name"), Some(&Value::from("app")));
        assert_eq!(rec.get("count"), Some(&Value::from(3_i64)));
        assert_eq!(JsonValue::from(rec), json);
    }

    #[test]
    fn serde_round_trip_is_plain_json() {
        let rec = record(json!({"public_client": true, "group_membership_claims": "All"}));
        let text = serde_json::to_string(&rec).unwrap();
        assert_eq!(text, r#"{"group_membership_claims":"All","public_client":true}"#);

        let back: RawRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(back, rec);
    }

    #[test]
    fn from_json_rejects_non_object() {
        let result = RawRecord::from_json("[1, 2]");
        assert!(matches!(result, Err(RecordError::NotAnObject("sequence"))));
    }

    #[test]
    fn from_json_rejects_garbage() {
        assert!(matches!(
            RawRecord::from_json("not json"),
            Err(RecordError::InvalidJson(_))
        ));
    }

    #[test]
    fn presence_distinguishes_null() {
        let rec = record(json!({"a": null, "b": false}));
        assert!(rec.contains_key("a"));
        assert!(!rec.is_present("a"));
        assert!(rec.is_present("b"));
        assert!(!rec.is_present("c"));
    }

    #[test]
    fn depth_counts_nesting() {
        assert_eq!(RawRecord::new().depth(), 1);
        assert_eq!(record(json!({"a": 1})).depth(), 1);
        assert_eq!(record(json!({"a": [1]})).depth(), 2);
        assert_eq!(
            record(json!({"optional_claims": [{"access_token": [{"additional_properties": ["x"]}]}]}))
                .depth(),
            6
        );
    }

    #[test]
    fn get_path_steps_through_sequences() {
        let rec = record(json!({
            "web": [{"implicit_grant": [{"access_token_issuance_enabled": true}]}]
        }));
        let path: FieldPath = "web.0.implicit_grant.0.access_token_issuance_enabled"
            .parse()
            .unwrap();
        assert_eq!(rec.get_path(&path), Some(&Value::Bool(true)));

        let missing: FieldPath = "web.1.logout_url".parse().unwrap();
        assert!(rec.get_path(&missing).is_none());
        assert!(rec.get_path(&FieldPath::root()).is_none());
    }

    #[test]
    fn get_path_mut_updates_in_place() {
        let mut rec = record(json!({"web": [{"logout_url": "https://a"}]}));
        let path: FieldPath = "web.0.logout_url".parse().unwrap();
        *rec.get_path_mut(&path).unwrap() = Value::from("https://b");
        assert_eq!(rec.get_path(&path), Some(&Value::from("https://b")));
    }

    #[test]
    fn singleton_wraps_value() {
        assert_eq!(
            Value::from("All").into_singleton(),
            Value::Sequence(vec![Value::from("All")])
        );
    }
}
