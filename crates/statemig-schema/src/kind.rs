//! Value kinds, cardinality and cross-field constraints

use std::fmt::{self, Display, Formatter};

use serde::Serialize;
use statemig_record::FieldPath;

use crate::field::Block;

/// Scalar value kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    String,
    Bool,
    Number,
}

/// Whether a sequence's element order is meaningful
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceOrder {
    /// List semantics
    Ordered,
    /// Set semantics
    Unordered,
}

/// Element type of a sequence
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    Scalar(ScalarKind),
    Block(Block),
}

/// Shape of a field's value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Single scalar
    Scalar(ScalarKind),

    /// Sequence of scalars or of nested blocks
    Sequence {
        element: Element,
        order: SequenceOrder,
    },

    /// Nested block, optionally repeated as a set
    Nested { block: Block, as_set: bool },
}

impl ValueKind {
    /// Nested block declared by this kind, if any
    #[inline]
    #[must_use]
    pub fn block(&self) -> Option<&Block> {
        match self {
            Self::Nested { block, .. }
            | Self::Sequence {
                element: Element::Block(block),
                ..
            } => Some(block),
            _ => None,
        }
    }

    /// Whether values of this kind are stored as a sequence
    #[inline]
    #[must_use]
    pub fn is_sequence(&self) -> bool {
        !matches!(self, Self::Scalar(_))
    }

    /// Short human-readable description
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Scalar(kind) => format!("{kind:?}").to_lowercase(),
            Self::Sequence {
                element: Element::Scalar(kind),
                order,
            } => format!("{}<{}>", order_name(*order), format!("{kind:?}").to_lowercase()),
            Self::Sequence {
                element: Element::Block(_),
                order,
            } => format!("{}<block>", order_name(*order)),
            Self::Nested { as_set: true, .. } => "set<block>".to_string(),
            Self::Nested { as_set: false, .. } => "block".to_string(),
        }
    }
}

fn order_name(order: SequenceOrder) -> &'static str {
    match order {
        SequenceOrder::Ordered => "list",
        SequenceOrder::Unordered => "set",
    }
}

/// Whether a field must, may, or cannot be set by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// Must be set
    Required,
    /// May be set
    Optional,
    /// Set only by the remote service
    Computed,
    /// May be set; filled in by the remote service otherwise
    OptionalComputed,
}

impl Cardinality {
    /// Whether a well-formed record must carry this field
    #[inline]
    #[must_use]
    pub fn is_required(self) -> bool {
        matches!(self, Self::Required)
    }

    /// Whether the remote service may fill this field
    #[inline]
    #[must_use]
    pub fn is_computed(self) -> bool {
        matches!(self, Self::Computed | Self::OptionalComputed)
    }
}

impl Display for Cardinality {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Required => "required",
            Self::Optional => "optional",
            Self::Computed => "computed",
            Self::OptionalComputed => "optional, computed",
        })
    }
}

/// Cross-field constraint declared on a field
///
/// Declared only; checking happens in a later validation stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    /// Exactly one of these fields may be set
    ExactlyOneOf(Vec<FieldPath>),
    /// These fields must not be set together with the declaring field
    ConflictsWith(Vec<FieldPath>),
}

impl Constraint {
    /// Fields referenced by the constraint
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[FieldPath] {
        match self {
            Self::ExactlyOneOf(fields) | Self::ConflictsWith(fields) => fields,
        }
    }
}

/// Value predicate declared on a field
///
/// On sequence fields the predicate applies to each element. Declared only;
/// the migrator never evaluates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Validation {
    /// Value must be one of the listed strings (case-sensitive)
    OneOf(Vec<String>),
    /// String must not be empty
    NotEmpty,
    /// String must be a UUID
    Uuid,
    /// String must be an `http` or `https` URL
    HttpUrl,
    /// String must be an application identifier URI
    AppUri,
    /// String must be a valid role or scope claim value
    ClaimValue,
}

impl Validation {
    /// Allowed-values predicate
    #[must_use]
    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::OneOf(values.into_iter().map(Into::into).collect())
    }

    /// Allowed values, if this is a [`Validation::OneOf`]
    #[inline]
    #[must_use]
    pub fn allowed_values(&self) -> Option<&[String]> {
        match self {
            Self::OneOf(values) => Some(values),
            _ => None,
        }
    }
}

impl Display for Validation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::OneOf(values) => write!(f, "one of [{}]", values.join(", ")),
            Self::NotEmpty => f.write_str("not empty"),
            Self::Uuid => f.write_str("uuid"),
            Self::HttpUrl => f.write_str("http(s) url"),
            Self::AppUri => f.write_str("app uri"),
            Self::ClaimValue => f.write_str("claim value"),
        }
    }
}

impl Display for Constraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ExactlyOneOf(_) => "exactly one of",
            Self::ConflictsWith(_) => "conflicts with",
        };
        let fields: Vec<String> = self.fields().iter().map(ToString::to_string).collect();
        write!(f, "{label} [{}]", fields.join(", "))
    }
}
