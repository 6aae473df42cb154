//! statemig Core
//!
//! Rule-based rewriting of persisted resource state from one schema
//! version to the next.
//!
//! # Core Concepts
//!
//! - [`FieldTransformRule`]: `Rename`, `WrapInSequence`, `ConditionalCopy`,
//!   `Delete`, each reporting a [`RuleOutcome`]
//! - [`StateTransition`]: ordered rules from version `N` to `N + 1`
//! - [`StateUpgrader`]: registry that chains transitions without skipping
//! - [`MigratorConfig`]: target version and batch tuning
//!
//! # Example
//!
//! ```rust
//! use statemig_core::resources::application;
//! use statemig_record::{RawRecord, Value};
//!
//! let legacy = RawRecord::from_json(r#"{"public_client": true}"#).unwrap();
//! let upgraded = application::upgrade_v0(&legacy).unwrap();
//!
//! assert_eq!(upgraded.get("fallback_public_client_enabled"), Some(&Value::Bool(true)));
//! assert!(!upgraded.contains_key("public_client"));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod resources;
pub mod rule;
pub mod transition;
pub mod upgrader;

pub use config::{ConfigFormat, MigratorConfig};
pub use error::{BuildError, ConfigError, MigrationError, RegistryError, UpgradeError};
pub use rule::{FieldTransformRule, Presence, RuleOutcome, SkipReason};
pub use transition::{Migrated, OrderingConstraint, StateTransition, TransitionBuilder};
pub use upgrader::{StateUpgrader, VersionedRecord};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
