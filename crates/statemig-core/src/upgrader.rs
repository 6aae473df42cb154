//! Transition registry and multi-step upgrades
//!
//! A [`StateUpgrader`] holds every transition of one resource type and
//! walks a stored record through them, one adjacent version at a time,
//! until it reaches the target version.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statemig_record::RawRecord;
use statemig_schema::SchemaVersion;

use crate::config::MigratorConfig;
use crate::error::{RegistryError, UpgradeError};
use crate::transition::StateTransition;

/// Persisted record together with the layout version it was written in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedRecord {
    /// Layout the attributes are stored in
    pub schema_version: SchemaVersion,
    /// Attribute values
    pub attributes: RawRecord,
}

impl VersionedRecord {
    /// Create envelope
    #[inline]
    #[must_use]
    pub fn new(schema_version: SchemaVersion, attributes: RawRecord) -> Self {
        Self {
            schema_version,
            attributes,
        }
    }

    /// Check if the record predates `current`
    #[inline]
    #[must_use]
    pub fn is_stale(&self, current: SchemaVersion) -> bool {
        self.schema_version < current
    }
}

/// Ordered set of transitions for one resource type
///
/// # Invariants
/// - At most one transition per source version
/// - No transition leads past `current`
/// - An upgrade never skips a version
#[derive(Debug, Clone)]
pub struct StateUpgrader {
    type_name: String,
    current: SchemaVersion,
    transitions: BTreeMap<SchemaVersion, StateTransition>,
    config: MigratorConfig,
}

impl StateUpgrader {
    /// Create an empty registry whose layouts end at `current`
    #[must_use]
    pub fn new(type_name: impl Into<String>, current: SchemaVersion) -> Self {
        Self {
            type_name: type_name.into(),
            current,
            transitions: BTreeMap::new(),
            config: MigratorConfig::default(),
        }
    }

    /// Registry over a table known to be consistent
    pub(crate) fn from_table(
        type_name: impl Into<String>,
        current: SchemaVersion,
        table: impl IntoIterator<Item = StateTransition>,
    ) -> Self {
        let mut upgrader = Self::new(type_name, current);
        upgrader.transitions = table.into_iter().map(|t| (t.from(), t)).collect();
        upgrader
    }

    /// With configuration
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: MigratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a transition
    ///
    /// # Errors
    /// - [`RegistryError::DuplicateTransition`] if one already starts at the
    ///   same version
    /// - [`RegistryError::TransitionBeyondCurrent`] if it would produce a
    ///   version newer than `current`
    pub fn register(&mut self, transition: StateTransition) -> Result<(), RegistryError> {
        let from = transition.from();
        if from >= self.current {
            return Err(RegistryError::TransitionBeyondCurrent {
                from,
                current: self.current,
            });
        }
        if self.transitions.contains_key(&from) {
            return Err(RegistryError::DuplicateTransition { from });
        }
        tracing::debug!("Registered {} transition {} -> {}", self.type_name, from, transition.to());
        self.transitions.insert(from, transition);
        Ok(())
    }

    /// Resource type name
    #[inline]
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Newest layout version
    #[inline]
    #[must_use]
    pub fn current(&self) -> SchemaVersion {
        self.current
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &MigratorConfig {
        &self.config
    }

    /// Version [`upgrade`](Self::upgrade) brings records to
    #[inline]
    #[must_use]
    pub fn target(&self) -> SchemaVersion {
        self.config.target_version.unwrap_or(self.current)
    }

    /// Transition starting at `from`
    #[inline]
    #[must_use]
    pub fn transition(&self, from: SchemaVersion) -> Option<&StateTransition> {
        self.transitions.get(&from)
    }

    /// Registered transitions in version order
    #[inline]
    pub fn transitions(&self) -> impl Iterator<Item = &StateTransition> {
        self.transitions.values()
    }

    /// Upgrade a record to [`target`](Self::target)
    ///
    /// # Errors
    /// See [`upgrade_to`](Self::upgrade_to).
    #[inline]
    pub fn upgrade(&self, record: &VersionedRecord) -> Result<VersionedRecord, UpgradeError> {
        self.upgrade_to(record, self.target())
    }

    /// Upgrade a record to `target`, one version at a time
    ///
    /// The whole chain is resolved before any rule runs. A record already at
    /// `target` comes back unchanged.
    ///
    /// # Errors
    /// - [`UpgradeError::UnsupportedTarget`] if `target` is past `current`
    /// - [`UpgradeError::FutureVersion`] if the record is newer than `current`
    /// - [`UpgradeError::Downgrade`] if the record is newer than `target`
    /// - [`UpgradeError::MissingTransition`] if the chain has a gap
    /// - [`UpgradeError::Migration`] if a transition fails on the record
    pub fn upgrade_to(
        &self,
        record: &VersionedRecord,
        target: SchemaVersion,
    ) -> Result<VersionedRecord, UpgradeError> {
        let stored = record.schema_version;

        if target > self.current {
            return Err(UpgradeError::UnsupportedTarget {
                target,
                current: self.current,
            });
        }
        if stored > self.current {
            return Err(UpgradeError::FutureVersion {
                stored,
                current: self.current,
            });
        }
        if stored > target {
            return Err(UpgradeError::Downgrade { stored, target });
        }

        let chain = self.chain(stored, target)?;
        if chain.is_empty() {
            tracing::debug!("{} state already at {}", self.type_name, target);
            return Ok(record.clone());
        }

        tracing::info!(
            "Upgrading {} state {} -> {} ({} steps)",
            self.type_name,
            stored,
            target,
            chain.len()
        );

        let mut attributes = chain[0].upgrade(&record.attributes)?;
        for transition in &chain[1..] {
            attributes = transition.upgrade(&attributes)?;
        }

        Ok(VersionedRecord::new(target, attributes))
    }

    /// Upgrade many independent records
    ///
    /// Runs on the rayon pool when the batch holds at least
    /// [`MigratorConfig::parallel_threshold`] records. Results line up with
    /// the input.
    pub fn upgrade_batch(
        &self,
        records: &[VersionedRecord],
    ) -> Vec<Result<VersionedRecord, UpgradeError>> {
        if records.len() >= self.config.parallel_threshold.max(1) {
            tracing::debug!("Upgrading batch of {} in parallel", records.len());
            records.par_iter().map(|r| self.upgrade(r)).collect()
        } else {
            records.iter().map(|r| self.upgrade(r)).collect()
        }
    }

    fn chain(
        &self,
        stored: SchemaVersion,
        target: SchemaVersion,
    ) -> Result<Vec<&StateTransition>, UpgradeError> {
        (stored.get()..target.get())
            .map(SchemaVersion::new)
            .map(|from| {
                self.transitions
                    .get(&from)
                    .ok_or(UpgradeError::MissingTransition { from })
            })
            .collect()
    }
}
