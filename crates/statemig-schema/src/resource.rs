//! Resource schema descriptors
//!
//! A [`ResourceSchema`] is the complete, immutable field tree of one
//! resource type at one [`SchemaVersion`]. Every query is infallible and
//! read-only.

use serde::Serialize;
use statemig_record::{FieldPath, RawRecord};

use crate::field::{Block, FieldSchema};
use crate::kind::Constraint;
use crate::version::SchemaVersion;

/// Field tree of one resource type at one schema version
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceSchema {
    type_name: String,
    version: SchemaVersion,
    block: Block,
}

impl ResourceSchema {
    /// Create descriptor
    #[inline]
    #[must_use]
    pub fn new(type_name: impl Into<String>, version: SchemaVersion, block: Block) -> Self {
        Self {
            type_name: type_name.into(),
            version,
            block,
        }
    }

    /// Resource type name, e.g. `azuread_application`
    #[inline]
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Schema version
    #[inline]
    #[must_use]
    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    /// Root block
    #[inline]
    #[must_use]
    pub fn block(&self) -> &Block {
        &self.block
    }

    /// Top-level field by name
    #[inline]
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.block.get(name)
    }

    /// Top-level fields in name order
    #[inline]
    pub fn fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.block.fields()
    }

    /// Top-level key names in order
    #[must_use]
    pub fn top_level_keys(&self) -> Vec<&str> {
        self.block.names().collect()
    }

    /// Whether a top-level key is declared
    #[inline]
    #[must_use]
    pub fn declares(&self, name: &str) -> bool {
        self.block.get(name).is_some()
    }

    /// Resolve a possibly nested path
    ///
    /// Index segments (`web.0.logout_url`) are ignored, so record paths and
    /// schema paths resolve the same way.
    #[must_use]
    pub fn lookup(&self, path: &FieldPath) -> Option<&FieldSchema> {
        let path = path.without_indices();
        let mut segments = path.iter();
        let mut field = self.block.get(segments.next()?)?;
        for segment in segments {
            field = field.kind().block()?.get(segment)?;
        }
        Some(field)
    }

    /// Constraints declared on the field at `path`; empty when unknown
    #[must_use]
    pub fn constraints_for(&self, path: &FieldPath) -> &[Constraint] {
        self.lookup(path).map(FieldSchema::constraints).unwrap_or(&[])
    }

    /// Every deprecated field, nested ones included, with its message
    #[must_use]
    pub fn deprecated_fields(&self) -> Vec<(FieldPath, &str)> {
        let mut out = Vec::new();
        collect_deprecated(&self.block, &FieldPath::root(), &mut out);
        out
    }

    /// Block nesting depth; the root block counts as one level
    #[inline]
    #[must_use]
    pub fn nesting_depth(&self) -> usize {
        self.block.nesting_depth()
    }

    /// Top-level keys of `record` this version does not declare
    ///
    /// Looks at key names only, never at values.
    #[must_use]
    pub fn unknown_keys(&self, record: &RawRecord) -> Vec<String> {
        record
            .keys()
            .filter(|key| !self.declares(key))
            .map(str::to_string)
            .collect()
    }
}

fn collect_deprecated<'a>(block: &'a Block, prefix: &FieldPath, out: &mut Vec<(FieldPath, &'a str)>) {
    for field in block.fields() {
        let path = prefix.child(field.name());
        if let Some(message) = field.deprecation() {
            out.push((path.clone(), message));
        }
        if let Some(nested) = field.kind().block() {
            collect_deprecated(nested, &path, out);
        }
    }
}
