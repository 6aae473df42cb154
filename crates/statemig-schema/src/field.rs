//! Field definitions and blocks

use std::collections::BTreeMap;

use serde::Serialize;
use statemig_record::{FieldPath, Value};

use crate::kind::{
    Cardinality, Constraint, Element, ScalarKind, SequenceOrder, Validation, ValueKind,
};

/// Declaration of one field
///
/// Built with the constructor for its kind and refined with the chained
/// setters:
///
/// ```rust
/// use statemig_schema::{Cardinality, FieldSchema};
///
/// let field = FieldSchema::bool("public_client")
///     .optional()
///     .computed()
///     .deprecated("renamed to `fallback_public_client_enabled`");
/// assert_eq!(field.cardinality(), Cardinality::OptionalComputed);
/// assert!(field.is_deprecated());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSchema {
    name: String,
    kind: ValueKind,
    cardinality: Cardinality,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    constraints: Vec<Constraint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    validation: Option<Validation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deprecated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_items: Option<usize>,
}

impl FieldSchema {
    /// Create field of the given kind; cardinality starts as `Optional`
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            cardinality: Cardinality::Optional,
            constraints: Vec::new(),
            validation: None,
            deprecated: None,
            default: None,
            min_items: None,
            max_items: None,
        }
    }

    /// String scalar
    #[inline]
    #[must_use]
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ValueKind::Scalar(ScalarKind::String))
    }

    /// Boolean scalar
    #[inline]
    #[must_use]
    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, ValueKind::Scalar(ScalarKind::Bool))
    }

    /// Numeric scalar
    #[inline]
    #[must_use]
    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, ValueKind::Scalar(ScalarKind::Number))
    }

    /// Ordered list of scalars
    #[inline]
    #[must_use]
    pub fn list_of(name: impl Into<String>, element: ScalarKind) -> Self {
        Self::new(
            name,
            ValueKind::Sequence {
                element: Element::Scalar(element),
                order: SequenceOrder::Ordered,
            },
        )
    }

    /// Unordered set of scalars
    #[inline]
    #[must_use]
    pub fn set_of(name: impl Into<String>, element: ScalarKind) -> Self {
        Self::new(
            name,
            ValueKind::Sequence {
                element: Element::Scalar(element),
                order: SequenceOrder::Unordered,
            },
        )
    }

    /// Ordered list of nested blocks
    #[inline]
    #[must_use]
    pub fn block_list(name: impl Into<String>, block: Block) -> Self {
        Self::new(
            name,
            ValueKind::Sequence {
                element: Element::Block(block),
                order: SequenceOrder::Ordered,
            },
        )
    }

    /// Set of nested blocks
    #[inline]
    #[must_use]
    pub fn block_set(name: impl Into<String>, block: Block) -> Self {
        Self::new(name, ValueKind::Nested { block, as_set: true })
    }

    /// At most one nested block
    #[inline]
    #[must_use]
    pub fn single_block(name: impl Into<String>, block: Block) -> Self {
        Self::new(name, ValueKind::Nested { block, as_set: false }).max_items(1)
    }

    /// Mark required
    #[inline]
    #[must_use]
    pub fn required(mut self) -> Self {
        self.cardinality = Cardinality::Required;
        self
    }

    /// Mark optional (keeps a computed flag)
    #[inline]
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.cardinality = match self.cardinality {
            Cardinality::Computed | Cardinality::OptionalComputed => Cardinality::OptionalComputed,
            _ => Cardinality::Optional,
        };
        self
    }

    /// Mark computed; an optional field becomes optional+computed
    #[inline]
    #[must_use]
    pub fn computed(mut self) -> Self {
        self.cardinality = match self.cardinality {
            Cardinality::Optional | Cardinality::OptionalComputed => Cardinality::OptionalComputed,
            _ => Cardinality::Computed,
        };
        self
    }

    /// Mark computed only (not user-settable)
    #[inline]
    #[must_use]
    pub fn computed_only(mut self) -> Self {
        self.cardinality = Cardinality::Computed;
        self
    }

    /// Declare an exactly-one-of group
    #[must_use]
    pub fn exactly_one_of(mut self, fields: impl IntoIterator<Item = FieldPath>) -> Self {
        self.constraints
            .push(Constraint::ExactlyOneOf(fields.into_iter().collect()));
        self
    }

    /// Declare conflicting fields
    #[must_use]
    pub fn conflicts_with(mut self, fields: impl IntoIterator<Item = FieldPath>) -> Self {
        self.constraints
            .push(Constraint::ConflictsWith(fields.into_iter().collect()));
        self
    }

    /// Declare a value predicate; on sequences it applies per element
    #[inline]
    #[must_use]
    pub fn validation(mut self, validation: Validation) -> Self {
        self.validation = Some(validation);
        self
    }

    /// Mark deprecated with a message
    #[inline]
    #[must_use]
    pub fn deprecated(mut self, message: impl Into<String>) -> Self {
        self.deprecated = Some(message.into());
        self
    }

    /// Default applied by the host when the user leaves the field unset
    #[inline]
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Minimum number of elements for sequence kinds
    #[inline]
    #[must_use]
    pub fn min_items(mut self, min: usize) -> Self {
        self.min_items = Some(min);
        self
    }

    /// Maximum number of elements for sequence kinds
    #[inline]
    #[must_use]
    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }

    /// Field name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    /// Cardinality
    #[inline]
    #[must_use]
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// Declared constraints
    #[inline]
    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Declared value predicate
    #[inline]
    #[must_use]
    pub fn validator(&self) -> Option<&Validation> {
        self.validation.as_ref()
    }

    /// Deprecation message, if deprecated
    #[inline]
    #[must_use]
    pub fn deprecation(&self) -> Option<&str> {
        self.deprecated.as_deref()
    }

    /// Whether the field is deprecated
    #[inline]
    #[must_use]
    pub fn is_deprecated(&self) -> bool {
        self.deprecated.is_some()
    }

    /// Declared default
    #[inline]
    #[must_use]
    pub fn declared_default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Minimum element count
    #[inline]
    #[must_use]
    pub fn min_len(&self) -> Option<usize> {
        self.min_items
    }

    /// Maximum element count
    #[inline]
    #[must_use]
    pub fn max_len(&self) -> Option<usize> {
        self.max_items
    }

    /// Nesting levels this field adds below its block
    ///
    /// Scalars add nothing, scalar sequences add one level, nested blocks
    /// add the block's own depth.
    #[must_use]
    pub fn nesting_depth(&self) -> usize {
        match &self.kind {
            ValueKind::Scalar(_) => 0,
            ValueKind::Sequence {
                element: Element::Scalar(_),
                ..
            } => 1,
            ValueKind::Sequence {
                element: Element::Block(block),
                ..
            }
            | ValueKind::Nested { block, .. } => block.nesting_depth(),
        }
    }
}

/// Named group of fields
///
/// Field names are unique; declaring a name twice keeps the later
/// declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Block {
    fields: BTreeMap<String, FieldSchema>,
}

impl Block {
    /// Create empty block
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field
    #[must_use]
    pub fn field(mut self, field: FieldSchema) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    /// Remove a field by name
    #[must_use]
    pub fn without(mut self, name: &str) -> Self {
        self.fields.remove(name);
        self
    }

    /// Look up a field by name
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.get(name)
    }

    /// Fields in name order
    #[inline]
    pub fn fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.fields.values()
    }

    /// Field names in order
    #[inline]
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of fields
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the block has no fields
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Nesting depth counting this block as one level
    #[must_use]
    pub fn nesting_depth(&self) -> usize {
        1 + self
            .fields
            .values()
            .map(FieldSchema::nesting_depth)
            .max()
            .unwrap_or(0)
    }
}

impl FromIterator<FieldSchema> for Block {
    fn from_iter<I: IntoIterator<Item = FieldSchema>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), Self::field)
    }
}
