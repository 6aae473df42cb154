//! Version-to-version transitions
//!
//! A [`StateTransition`] rewrites a record laid out per schema version `N`
//! into the layout of `N + 1` by applying an ordered list of
//! [`FieldTransformRule`]s.
//!
//! # Example
//!
//! ```rust
//! use statemig_core::{FieldTransformRule, Presence, TransitionBuilder};
//! use statemig_record::RawRecord;
//! use statemig_schema::SchemaVersion;
//!
//! let transition = TransitionBuilder::new()
//!     .from(SchemaVersion::new(0))
//!     .rule(FieldTransformRule::rename("name", "display_name", Presence::Optional))
//!     .build()
//!     .unwrap();
//!
//! let mut record = RawRecord::new();
//! record.insert("name", "app");
//! let upgraded = transition.upgrade(&record).unwrap();
//! assert_eq!(upgraded.get("display_name").and_then(|v| v.as_str()), Some("app"));
//! assert!(!upgraded.contains_key("name"));
//! ```

use serde::Serialize;
use statemig_record::RawRecord;
use statemig_schema::SchemaVersion;

use crate::error::{BuildError, MigrationError};
use crate::rule::{FieldTransformRule, RuleOutcome};

/// Rewrite of a record from one schema version to the next
///
/// # Invariants
/// - `to() == from().next()`
/// - Rules run in declaration order against a private copy; the input is
///   never observed half-migrated
/// - Keys no rule mentions pass through unchanged
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateTransition {
    from: SchemaVersion,
    rules: Vec<FieldTransformRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl StateTransition {
    /// Create transition from `from` to its successor
    ///
    /// Prefer [`TransitionBuilder`] for declarations that should be checked.
    #[inline]
    #[must_use]
    pub fn new(from: SchemaVersion, rules: Vec<FieldTransformRule>) -> Self {
        Self {
            from,
            rules,
            description: None,
        }
    }

    /// Attach a human-readable summary
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Source version
    #[inline]
    #[must_use]
    pub fn from(&self) -> SchemaVersion {
        self.from
    }

    /// Target version
    #[inline]
    #[must_use]
    pub fn to(&self) -> SchemaVersion {
        self.from.next()
    }

    /// Rules in application order
    #[inline]
    #[must_use]
    pub fn rules(&self) -> &[FieldTransformRule] {
        &self.rules
    }

    /// Summary, if any
    #[inline]
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Apply every rule, reporting what each one did
    ///
    /// # Errors
    /// Returns the first [`MigrationError`] raised by a rule; no partial
    /// result is produced.
    pub fn apply(&self, record: &RawRecord) -> Result<Migrated, MigrationError> {
        let mut working = record.clone();
        let outcomes = self
            .rules
            .iter()
            .map(|rule| rule.apply(&mut working, self.from))
            .collect::<Result<Vec<_>, _>>()?;

        let applied = outcomes.iter().filter(|o| o.is_applied()).count();
        tracing::info!(
            "Migrated record {} -> {} ({}/{} rules applied)",
            self.from,
            self.to(),
            applied,
            outcomes.len()
        );

        Ok(Migrated {
            record: working,
            outcomes,
        })
    }

    /// Upgrade a record to the next version
    ///
    /// # Errors
    /// Returns [`MigrationError::MissingField`] if a required source field is
    /// absent or null.
    #[inline]
    pub fn upgrade(&self, record: &RawRecord) -> Result<RawRecord, MigrationError> {
        self.apply(record).map(|migrated| migrated.record)
    }

    /// Ordering constraints between rules
    ///
    /// Rule `i` must follow rule `j < i` when `j` writes a key `i` touches,
    /// or `i` writes a key `j` reads. Rules absent from the result commute
    /// with every earlier rule.
    #[must_use]
    pub fn dependencies(&self) -> Vec<OrderingConstraint> {
        let mut constraints = Vec::new();

        for (i, later) in self.rules.iter().enumerate() {
            let later_reads = later.reads();
            let later_writes = later.writes();

            let must_follow: Vec<usize> = self.rules[..i]
                .iter()
                .enumerate()
                .filter(|(_, earlier)| {
                    let earlier_writes = earlier.writes();
                    earlier_writes
                        .iter()
                        .any(|k| later_reads.contains(k) || later_writes.contains(k))
                        || earlier.reads().iter().any(|k| later_writes.contains(k))
                })
                .map(|(j, _)| j)
                .collect();

            if !must_follow.is_empty() {
                constraints.push(OrderingConstraint::new(i, must_follow));
            }
        }

        constraints
    }
}

/// Result of [`StateTransition::apply`]
#[derive(Debug, Clone, PartialEq)]
pub struct Migrated {
    /// Record in the target layout
    pub record: RawRecord,
    /// One outcome per rule, in rule order
    pub outcomes: Vec<RuleOutcome>,
}

/// Rule `rule_index` has to run after every rule in `must_follow`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderingConstraint {
    /// Position of the constrained rule
    pub rule_index: usize,
    /// Earlier rules it shares a key with, ascending
    pub must_follow: Vec<usize>,
}

impl OrderingConstraint {
    /// Create constraint
    #[inline]
    #[must_use]
    pub fn new(rule_index: usize, must_follow: Vec<usize>) -> Self {
        Self {
            rule_index,
            must_follow,
        }
    }
}

/// Builder for checked transitions
#[derive(Debug, Default)]
pub struct TransitionBuilder {
    from: Option<SchemaVersion>,
    rules: Vec<FieldTransformRule>,
    description: Option<String>,
}

impl TransitionBuilder {
    /// Create new builder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set source version
    #[inline]
    #[must_use]
    pub fn from(mut self, version: SchemaVersion) -> Self {
        self.from = Some(version);
        self
    }

    /// Append a rule
    #[inline]
    #[must_use]
    pub fn rule(mut self, rule: FieldTransformRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Append several rules
    #[must_use]
    pub fn rules(mut self, rules: impl IntoIterator<Item = FieldTransformRule>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Set summary
    #[inline]
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Build transition
    ///
    /// # Errors
    /// - [`BuildError::MissingSource`] if no source version was set
    /// - [`BuildError::NoRules`] if no rule was added
    /// - [`BuildError::EmptyField`] if a rule names an empty key
    /// - [`BuildError::SelfReference`] if a rename or copy targets its own
    ///   source
    pub fn build(self) -> Result<StateTransition, BuildError> {
        let from = self.from.ok_or(BuildError::MissingSource)?;

        if self.rules.is_empty() {
            return Err(BuildError::NoRules(from));
        }

        for (index, rule) in self.rules.iter().enumerate() {
            if rule.reads().iter().chain(rule.writes().iter()).any(|k| k.is_empty()) {
                return Err(BuildError::EmptyField { index });
            }
            match rule {
                FieldTransformRule::Rename {
                    from: source,
                    to: target,
                    ..
                }
                | FieldTransformRule::ConditionalCopy {
                    from: source,
                    to: target,
                    ..
                } if source == target => {
                    return Err(BuildError::SelfReference {
                        index,
                        field: source.clone(),
                    });
                }
                _ => {}
            }
        }

        Ok(StateTransition {
            from,
            rules: self.rules,
            description: self.description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{Presence, SkipReason};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(value: serde_json::Value) -> RawRecord {
        RawRecord::try_from(value).unwrap()
    }

    fn sample() -> StateTransition {
        TransitionBuilder::new()
            .from(SchemaVersion::new(0))
            .rule(FieldTransformRule::wrap_in_sequence("claims", Presence::Optional))
            .rule(FieldTransformRule::conditional_copy("old", "new", Presence::Optional))
            .rule(FieldTransformRule::delete("old"))
            .description("sample")
            .build()
            .unwrap()
    }

    #[test]
    fn versions_are_adjacent() {
        let t = sample();
        assert_eq!(t.from(), SchemaVersion::new(0));
        assert_eq!(t.to(), SchemaVersion::new(1));
        assert!(t.from().is_adjacent_to(t.to()));
        assert_eq!(t.description(), Some("sample"));
    }

    #[test]
    fn apply_reports_outcomes_in_order() {
        let migrated = sample()
            .apply(&record(json!({"old": true, "new": false, "x": 1})))
            .unwrap();

        assert_eq!(
            migrated.outcomes,
            vec![
                RuleOutcome::Skipped(SkipReason::SourceAbsent),
                RuleOutcome::Skipped(SkipReason::TargetPresent),
                RuleOutcome::Applied,
            ]
        );
        assert_eq!(migrated.record, record(json!({"new": false, "x": 1})));
    }

    #[test]
    fn failure_leaves_input_untouched() {
        let t = TransitionBuilder::new()
            .from(SchemaVersion::new(0))
            .rule(FieldTransformRule::delete("a"))
            .rule(FieldTransformRule::rename("b", "c", Presence::Required))
            .build()
            .unwrap();
        let input = record(json!({"a": 1}));

        let err = t.upgrade(&input).unwrap_err();
        assert_eq!(err.field(), "b");
        assert_eq!(input, record(json!({"a": 1})));
    }

    #[test]
    fn dependencies_follow_shared_keys() {
        let deps = sample().dependencies();
        // delete(old) follows copy(old -> new); wrap(claims) is independent
        assert_eq!(deps, vec![OrderingConstraint::new(2, vec![1])]);
    }

    #[test]
    fn builder_rejects_bad_declarations() {
        assert_eq!(
            TransitionBuilder::new()
                .rule(FieldTransformRule::delete("a"))
                .build()
                .unwrap_err(),
            BuildError::MissingSource
        );
        assert_eq!(
            TransitionBuilder::new()
                .from(SchemaVersion::new(2))
                .build()
                .unwrap_err(),
            BuildError::NoRules(SchemaVersion::new(2))
        );
        assert_eq!(
            TransitionBuilder::new()
                .from(SchemaVersion::new(0))
                .rule(FieldTransformRule::delete("a"))
                .rule(FieldTransformRule::rename("b", "b", Presence::Optional))
                .build()
                .unwrap_err(),
            BuildError::SelfReference {
                index: 1,
                field: "b".to_string()
            }
        );
        assert_eq!(
            TransitionBuilder::new()
                .from(SchemaVersion::new(0))
                .rule(FieldTransformRule::delete(""))
                .build()
                .unwrap_err(),
            BuildError::EmptyField { index: 0 }
        );
    }

    #[test]
    fn new_skips_checks() {
        let t = StateTransition::new(SchemaVersion::new(4), Vec::new());
        assert!(t.rules().is_empty());
        assert_eq!(t.upgrade(&record(json!({"k": "v"}))).unwrap(), record(json!({"k": "v"})));
    }
}
