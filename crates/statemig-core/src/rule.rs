//! Field-level transformation rules
//!
//! Provides [`FieldTransformRule`], the closed set of record rewrites a
//! transition is built from. Rules are structural: they move and reshape
//! values, they never interpret them.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use statemig_record::{RawRecord, Value};
use statemig_schema::SchemaVersion;

use crate::error::MigrationError;

/// Whether the source layout guarantees a field is set
///
/// A null value counts as absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    /// Absence means the record is corrupted
    Required,
    /// Absence means there is nothing to migrate
    Optional,
}

/// One migration action on a record
///
/// # Invariants
/// - Rules read and write top-level keys only
/// - A transition applies its rules in declaration order; a rule sees every
///   write made by the rules before it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum FieldTransformRule {
    /// Move `from` to `to`, overwriting whatever `to` held
    Rename {
        /// Key read and removed
        from: String,
        /// Key written
        to: String,
        /// What to do when `from` is absent or null
        presence: Presence,
    },

    /// Replace the value `v` of `field` with `[v]`
    WrapInSequence {
        /// Key rewritten in place
        field: String,
        /// What to do when `field` is absent or null
        presence: Presence,
    },

    /// Copy `from` into `to` unless `to` already holds a non-null value
    ///
    /// The source key is left in place; pair with [`FieldTransformRule::Delete`]
    /// to express a rename where new input wins over legacy input.
    ConditionalCopy {
        /// Key read; left in place
        from: String,
        /// Key written only while absent or null
        to: String,
        /// What to do when `from` is absent or null
        presence: Presence,
    },

    /// Remove `field`; never fails
    Delete {
        /// Key removed
        field: String,
    },
}

impl FieldTransformRule {
    /// Unconditional rename
    #[inline]
    pub fn rename(from: impl Into<String>, to: impl Into<String>, presence: Presence) -> Self {
        Self::Rename {
            from: from.into(),
            to: to.into(),
            presence,
        }
    }

    /// Scalar-to-sequence reshape
    #[inline]
    pub fn wrap_in_sequence(field: impl Into<String>, presence: Presence) -> Self {
        Self::WrapInSequence {
            field: field.into(),
            presence,
        }
    }

    /// Copy that never overwrites explicit new input
    #[inline]
    pub fn conditional_copy(
        from: impl Into<String>,
        to: impl Into<String>,
        presence: Presence,
    ) -> Self {
        Self::ConditionalCopy {
            from: from.into(),
            to: to.into(),
            presence,
        }
    }

    /// Key removal
    #[inline]
    pub fn delete(field: impl Into<String>) -> Self {
        Self::Delete {
            field: field.into(),
        }
    }

    /// Keys whose current value the rule inspects
    #[must_use]
    pub fn reads(&self) -> Vec<&str> {
        match self {
            Self::Rename { from, .. } => vec![from.as_str()],
            Self::WrapInSequence { field, .. } => vec![field.as_str()],
            Self::ConditionalCopy { from, to, .. } => vec![from.as_str(), to.as_str()],
            Self::Delete { .. } => Vec::new(),
        }
    }

    /// Keys the rule may change
    #[must_use]
    pub fn writes(&self) -> Vec<&str> {
        match self {
            Self::Rename { from, to, .. } => vec![from.as_str(), to.as_str()],
            Self::WrapInSequence { field, .. } | Self::Delete { field } => vec![field.as_str()],
            Self::ConditionalCopy { to, .. } => vec![to.as_str()],
        }
    }

    /// Check if the rule can fail on a record
    #[inline]
    #[must_use]
    pub fn can_fail(&self) -> bool {
        match self {
            Self::Rename { presence, .. }
            | Self::WrapInSequence { presence, .. }
            | Self::ConditionalCopy { presence, .. } => *presence == Presence::Required,
            Self::Delete { .. } => false,
        }
    }

    /// Apply the rule to `record` in place
    ///
    /// `version` is the layout the record is expected to conform to and only
    /// feeds error reporting.
    ///
    /// # Errors
    /// Returns [`MigrationError::MissingField`] if a `Required` source field
    /// is absent or null. The record is untouched in that case.
    pub fn apply(
        &self,
        record: &mut RawRecord,
        version: SchemaVersion,
    ) -> Result<RuleOutcome, MigrationError> {
        let outcome = match self {
            Self::Rename { from, to, presence } => {
                if !source_present(record, from, *presence, version)? {
                    // drop a lingering null so the old key never survives
                    record.remove(from);
                    RuleOutcome::Skipped(SkipReason::SourceAbsent)
                } else if let Some(value) = record.remove(from) {
                    record.insert(to.clone(), value);
                    RuleOutcome::Applied
                } else {
                    RuleOutcome::Skipped(SkipReason::SourceAbsent)
                }
            }
            Self::WrapInSequence { field, presence } => {
                if !source_present(record, field, *presence, version)? {
                    RuleOutcome::Skipped(SkipReason::SourceAbsent)
                } else if let Some(slot) = record.get_mut(field) {
                    let value = std::mem::replace(slot, Value::Null);
                    *slot = value.into_singleton();
                    RuleOutcome::Applied
                } else {
                    RuleOutcome::Skipped(SkipReason::SourceAbsent)
                }
            }
            Self::ConditionalCopy { from, to, presence } => {
                if !source_present(record, from, *presence, version)? {
                    RuleOutcome::Skipped(SkipReason::SourceAbsent)
                } else if record.is_present(to) {
                    RuleOutcome::Skipped(SkipReason::TargetPresent)
                } else if let Some(value) = record.get(from).cloned() {
                    record.insert(to.clone(), value);
                    RuleOutcome::Applied
                } else {
                    RuleOutcome::Skipped(SkipReason::SourceAbsent)
                }
            }
            Self::Delete { field } => {
                if record.remove(field).is_some() {
                    RuleOutcome::Applied
                } else {
                    RuleOutcome::Skipped(SkipReason::NothingToDelete)
                }
            }
        };

        tracing::debug!("{} ({})", self, outcome);
        Ok(outcome)
    }
}

/// Presence check shared by the reading rules
fn source_present(
    record: &RawRecord,
    field: &str,
    presence: Presence,
    version: SchemaVersion,
) -> Result<bool, MigrationError> {
    if record.is_present(field) {
        return Ok(true);
    }
    match presence {
        Presence::Required => Err(MigrationError::missing_field(field, version)),
        Presence::Optional => Ok(false),
    }
}

impl Display for FieldTransformRule {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rename { from, to, .. } => write!(f, "rename `{from}` to `{to}`"),
            Self::WrapInSequence { field, .. } => write!(f, "wrap `{field}` in a sequence"),
            Self::ConditionalCopy { from, to, .. } => {
                write!(f, "copy `{from}` to `{to}` unless already set")
            }
            Self::Delete { field } => write!(f, "delete `{field}`"),
        }
    }
}

/// What a rule did to a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOutcome {
    /// The record changed
    Applied,
    /// The record was left as it was
    Skipped(SkipReason),
}

impl RuleOutcome {
    /// Check if the rule changed the record
    #[inline]
    #[must_use]
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

impl Display for RuleOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied => f.write_str("applied"),
            Self::Skipped(reason) => write!(f, "skipped: {reason}"),
        }
    }
}

/// Why a rule left the record untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Optional source field was absent or null
    SourceAbsent,
    /// Target already held explicit input
    TargetPresent,
    /// Key to delete did not exist
    NothingToDelete,
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SourceAbsent => "source absent",
            Self::TargetPresent => "target already set",
            Self::NothingToDelete => "nothing to delete",
        })
    }
}
