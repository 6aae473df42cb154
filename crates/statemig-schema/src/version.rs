//! Schema versions

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Monotonic identifier of a resource's field layout
///
/// Versions are totally ordered; a migration is only ever defined between
/// a version and its immediate successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaVersion(u32);

impl SchemaVersion {
    /// Create a version
    #[inline]
    #[must_use]
    pub const fn new(version: u32) -> Self {
        Self(version)
    }

    /// Raw version number
    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// The immediate successor (saturates at `u32::MAX`)
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// The immediate predecessor, if any
    #[inline]
    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        match self.0.checked_sub(1) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Whether `other` is exactly one step after `self`
    #[inline]
    #[must_use]
    pub const fn is_adjacent_to(self, other: Self) -> bool {
        other.0 > self.0 && other.0 - self.0 == 1
    }
}

impl Display for SchemaVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl From<u32> for SchemaVersion {
    fn from(version: u32) -> Self {
        Self(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_are_ordered() {
        assert!(SchemaVersion::new(0) < SchemaVersion::new(1));
        assert_eq!(SchemaVersion::new(0).next(), SchemaVersion::new(1));
    }

    #[test]
    fn previous_of_zero_is_none() {
        assert_eq!(SchemaVersion::new(0).previous(), None);
        assert_eq!(SchemaVersion::new(3).previous(), Some(SchemaVersion::new(2)));
    }

    #[test]
    fn adjacency_is_one_step_forward() {
        let v0 = SchemaVersion::new(0);
        assert!(v0.is_adjacent_to(SchemaVersion::new(1)));
        assert!(!v0.is_adjacent_to(SchemaVersion::new(2)));
        assert!(!SchemaVersion::new(1).is_adjacent_to(v0));
    }

    #[test]
    fn display_prefixes_v() {
        assert_eq!(SchemaVersion::new(1).to_string(), "v1");
    }
}
