//! Canonical record fingerprints
//!
//! Provides [`RecordDigest`], a Blake3 hash over a record's canonical JSON
//! form (sorted keys, no whitespace). Two records that compare equal always
//! produce the same digest.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde_json::Value as JsonValue;

use crate::value::{RawRecord, Value};

/// A 32-byte record fingerprint (Blake3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordDigest([u8; 32]);

impl RecordDigest {
    /// Create from raw bytes
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Underlying bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Fingerprint a record
    #[must_use]
    pub fn of(record: &RawRecord) -> Self {
        // serde_json maps are key-sorted and its Display is compact
        let canonical = JsonValue::from(Value::Nested(record.clone())).to_string();
        Self(*blake3::hash(canonical.as_bytes()).as_bytes())
    }

    /// Short string representation (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for RecordDigest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for RecordDigest {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        let arr: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| DigestError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            })?;
        Ok(Self(arr))
    }
}

/// Errors parsing a digest
#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    /// Invalid digest length
    #[error("invalid digest length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Hex decoding error
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> RawRecord {
        RawRecord::try_from(value).unwrap()
    }

    #[test]
    fn digest_ignores_key_order() {
        let a = RawRecord::from_json(r#"{"b": 1, "a": [true, "x"]}"#).unwrap();
        let b = RawRecord::from_json(r#"{"a": [true, "x"], "b": 1}"#).unwrap();
        assert_eq!(RecordDigest::of(&a), RecordDigest::of(&b));
    }

    #[test]
    fn digest_distinguishes_shape() {
        let scalar = record(json!({"group_membership_claims": "All"}));
        let wrapped = record(json!({"group_membership_claims": ["All"]}));
        assert_ne!(RecordDigest::of(&scalar), RecordDigest::of(&wrapped));
    }

    #[test]
    fn digest_distinguishes_null_from_absent() {
        let with_null = record(json!({"public_client": null}));
        assert_ne!(RecordDigest::of(&with_null), RecordDigest::of(&RawRecord::new()));
    }

    #[test]
    fn digest_escapes_strings() {
        let a = record(json!({"k": "a\",\"b"}));
        let b = record(json!({"k": "a", "b": null}));
        assert_ne!(RecordDigest::of(&a), RecordDigest::of(&b));
    }

    #[test]
    fn digest_hashes_compact_json() {
        let input = r#"{"z": {"b": 1.10, "a": "q\"uote"}, "a": [1e2, null]}"#;
        let record = RawRecord::from_json(input).unwrap();
        let compact = serde_json::to_string(&record).unwrap();
        assert_eq!(compact, r#"{"a":[1e2,null],"z":{"a":"q\"uote","b":1.10}}"#);
        assert_eq!(
            RecordDigest::of(&record),
            RecordDigest::new(*blake3::hash(compact.as_bytes()).as_bytes())
        );
    }

    #[test]
    fn digest_distinguishes_special_keys() {
        let quoted = record(json!({"a\":\"b": 1}));
        let split = record(json!({"a": "b", "\"": 1}));
        let unicode = record(json!({"\u{e9}": 1}));
        let escaped = record(json!({"\\u00e9": 1}));
        assert_ne!(RecordDigest::of(&quoted), RecordDigest::of(&split));
        assert_ne!(RecordDigest::of(&unicode), RecordDigest::of(&escaped));
    }

    #[test]
    fn digest_keeps_number_text() {
        let a = RawRecord::from_json(r#"{"n": 1.10}"#).unwrap();
        let b = RawRecord::from_json(r#"{"n": 1.1}"#).unwrap();
        assert_ne!(RecordDigest::of(&a), RecordDigest::of(&b));
    }

    #[test]
    fn digest_display_and_parse() {
        let digest = RecordDigest::of(&record(json!({"x": 1})));
        let parsed: RecordDigest = digest.to_string().parse().unwrap();
        assert_eq!(parsed, digest);
        assert_eq!(digest.short().len(), 16);
        assert!(digest.to_string().starts_with(&digest.short()));
    }

    #[test]
    fn digest_parse_wrong_length() {
        let result: Result<RecordDigest, _> = "abcd".parse();
        assert!(matches!(
            result,
            Err(DigestError::InvalidLength { expected: 32, actual: 2 })
        ));
    }
}
