//! statemig Schema Descriptors
//!
//! Immutable, declarative field trees for one resource type at one schema
//! version. Descriptors are pure data: building one never fails and
//! querying one never mutates anything.
//!
//! # Core Concepts
//!
//! - [`ResourceSchema`]: type name, [`SchemaVersion`] and root [`Block`]
//! - [`FieldSchema`]: name, [`ValueKind`], [`Cardinality`], [`Constraint`]s,
//!   [`Validation`] predicates, deprecation, default and item bounds
//! - [`resources::application`]: the `azuread_application` v0 and v1 layouts
//!
//! # Example
//!
//! ```rust
//! use statemig_schema::resources::application;
//!
//! let v0 = application::schema_v0();
//! assert!(v0.field("public_client").unwrap().is_deprecated());
//! assert!(!application::schema_v1().declares("public_client"));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod field;
mod kind;
mod resource;
mod version;

pub mod resources;

pub use field::{Block, FieldSchema};
pub use kind::{
    Cardinality, Constraint, Element, ScalarKind, SequenceOrder, Validation, ValueKind,
};
pub use resource::ResourceSchema;
pub use version::SchemaVersion;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
