//! statemig record model
//!
//! Untyped, JSON-shaped persisted state for one resource instance.
//!
//! # Core Concepts
//!
//! - [`RawRecord`]: string-keyed mapping of attribute values
//! - [`Value`]: `Null | Bool | Number | String | Sequence | Nested`
//! - [`FieldPath`]: dotted addressing (`web.0.homepage_url`)
//! - [`RecordDigest`]: canonical Blake3 fingerprint of a record
//!
//! # Example
//!
//! ```rust
//! use statemig_record::{FieldPath, RawRecord, Value};
//!
//! let record = RawRecord::from_json(r#"{"web": [{"logout_url": "https://example.com"}]}"#).unwrap();
//! let path: FieldPath = "web.0.logout_url".parse().unwrap();
//! assert_eq!(record.get_path(&path), Some(&Value::from("https://example.com")));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod digest;
mod path;
mod value;

pub use digest::{DigestError, RecordDigest};
pub use path::{FieldPath, PathError};
pub use value::{RawRecord, RecordError, Value};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
