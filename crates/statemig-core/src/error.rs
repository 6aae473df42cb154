//! Error types for state migration
//!
//! - [`MigrationError`]: a single transition could not rewrite a record
//! - [`UpgradeError`]: a versioned record could not be brought to its target
//! - [`RegistryError`]: a transition table is inconsistent
//! - [`BuildError`]: a transition was declared incorrectly
//! - [`ConfigError`]: migrator configuration could not be parsed

use statemig_schema::SchemaVersion;

/// Failure of one transition on one record
///
/// The only way a well-declared transition fails: the record lacks a value
/// the transition depends on, which means the stored state is corrupted or
/// was edited by hand. Never retryable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MigrationError {
    /// Required field absent (or null) in the source record
    #[error("required field `{field}` is missing from {version} state")]
    MissingField {
        /// Field name in the source layout
        field: String,
        /// Version the record was expected to conform to
        version: SchemaVersion,
    },
}

impl MigrationError {
    /// Create missing-field error
    #[inline]
    pub fn missing_field(field: impl Into<String>, version: SchemaVersion) -> Self {
        Self::MissingField {
            field: field.into(),
            version,
        }
    }

    /// Name of the field involved
    #[inline]
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::MissingField { field, .. } => field,
        }
    }

    /// Migration failures indicate corrupted state; retrying cannot help
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        false
    }
}

/// Failure to bring a versioned record to its target version
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpgradeError {
    /// A transition failed
    #[error("migration failed: {0}")]
    Migration(#[from] MigrationError),

    /// Chain has a gap
    #[error("no transition registered from {from}")]
    MissingTransition { from: SchemaVersion },

    /// Record was written by a newer release
    #[error("stored state is at {stored}, newer than the supported {current}")]
    FutureVersion {
        stored: SchemaVersion,
        current: SchemaVersion,
    },

    /// Target lies behind the stored version
    #[error("cannot downgrade state from {stored} to {target}")]
    Downgrade {
        stored: SchemaVersion,
        target: SchemaVersion,
    },

    /// Requested target is beyond the supported version
    #[error("target {target} is beyond the supported {current}")]
    UnsupportedTarget {
        target: SchemaVersion,
        current: SchemaVersion,
    },
}

impl UpgradeError {
    /// Check if the failure comes from the record rather than the registry
    #[inline]
    #[must_use]
    pub fn is_record_fault(&self) -> bool {
        matches!(self, Self::Migration(_) | Self::FutureVersion { .. })
    }
}

/// Inconsistent transition table
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Two transitions start at the same version
    #[error("a transition from {from} is already registered")]
    DuplicateTransition { from: SchemaVersion },

    /// Transition ends past the current version
    #[error("transition from {from} leads past the current {current}")]
    TransitionBeyondCurrent {
        from: SchemaVersion,
        current: SchemaVersion,
    },
}

/// Invalid transition declaration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// Source version not set
    #[error("transition is missing its source version")]
    MissingSource,

    /// No rules declared
    #[error("transition from {0} declares no rules")]
    NoRules(SchemaVersion),

    /// Rule reads and writes the same key
    #[error("rule {index} moves `{field}` onto itself")]
    SelfReference { index: usize, field: String },

    /// Empty field name
    #[error("rule {index} names an empty field")]
    EmptyField { index: usize },
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid TOML: {0}")]
    InvalidToml(#[from] toml::de::Error),

    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),
}
