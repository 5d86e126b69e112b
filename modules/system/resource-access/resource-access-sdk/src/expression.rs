//! Compiled filter expressions.
//!
//! An [`Expression`] is the store-agnostic predicate tree produced by the
//! filter compiler. Its serialized form is a wire contract shared with the
//! query-execution layer:
//!
//! ```text
//! {"=":   {"field": "Vm-name", "value": "bb"}}
//! {"AND": [ {..}, {..} ]}
//! {"OR":  [ {..}, {..} ]}
//! ```
//!
//! Operator strings are fixed literals, see [`FilterOp::as_str`].

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value, json};

/// Operator of a leaf condition, rendered exactly as the query layer expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Is,
    IsNull,
    IsNotNull,
    Before,
    After,
    RegexMatches,
    RegexDoesNotMatch,
    IncludesAll,
}

impl FilterOp {
    /// Wire literal of this operator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Is => "IS",
            Self::IsNull => "IS NULL",
            Self::IsNotNull => "IS NOT NULL",
            Self::Before => "BEFORE",
            Self::After => "AFTER",
            Self::RegexMatches => "REGULAR EXPRESSION MATCHES",
            Self::RegexDoesNotMatch => "REGULAR EXPRESSION DOES NOT MATCH",
            Self::IncludesAll => "includes all",
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully-qualified attribute reference: `Type[.association]-attribute`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    /// Type the filter was compiled against (e.g. `Vm`).
    pub type_name: String,
    /// Optional single association hop (e.g. `host`).
    pub association: Option<String>,
    /// Leaf attribute on the (possibly associated) type.
    pub attribute: String,
}

impl FieldRef {
    #[must_use]
    pub fn new(type_name: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            association: None,
            attribute: attribute.into(),
        }
    }

    #[must_use]
    pub fn through(
        type_name: impl Into<String>,
        association: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            association: Some(association.into()),
            attribute: attribute.into(),
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.association {
            Some(assoc) => write!(f, "{}.{}-{}", self.type_name, assoc, self.attribute),
            None => write!(f, "{}-{}", self.type_name, self.attribute),
        }
    }
}

/// A single `field <op> value` predicate.
///
/// Values stay strings; coercion belongs to the query-execution layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub op: FilterOp,
    pub field: FieldRef,
    pub value: Option<String>,
}

impl Condition {
    #[must_use]
    pub fn new(op: FilterOp, field: FieldRef, value: Option<String>) -> Self {
        Self { op, field, value }
    }
}

/// Boolean predicate tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Leaf(Condition),
    And(Vec<Expression>),
    Or(Vec<Expression>),
}

impl Expression {
    /// Build a leaf from its parts.
    #[must_use]
    pub fn leaf(op: FilterOp, field: FieldRef, value: Option<String>) -> Self {
        Self::Leaf(Condition::new(op, field, value))
    }

    /// Conjunction that collapses a single child to the child itself.
    #[must_use]
    pub fn all(mut children: Vec<Expression>) -> Self {
        if children.len() == 1 {
            children.remove(0)
        } else {
            Self::And(children)
        }
    }

    /// Disjunction that collapses a single child to the child itself.
    #[must_use]
    pub fn any(mut children: Vec<Expression>) -> Self {
        if children.len() == 1 {
            children.remove(0)
        } else {
            Self::Or(children)
        }
    }

    /// Iterate over every leaf condition, depth first, left to right.
    #[must_use]
    pub fn conditions(&self) -> Box<dyn Iterator<Item = &Condition> + '_> {
        match self {
            Self::Leaf(c) => Box::new(std::iter::once(c)),
            Self::And(children) | Self::Or(children) => {
                Box::new(children.iter().flat_map(Expression::conditions))
            }
        }
    }

    /// Render the wire shape as a JSON value.
    #[must_use]
    pub fn to_wire(&self) -> Value {
        match self {
            Self::Leaf(c) => {
                let mut map = Map::new();
                map.insert(
                    c.op.as_str().to_owned(),
                    json!({ "field": c.field.to_string(), "value": c.value }),
                );
                Value::Object(map)
            }
            Self::And(children) => {
                json!({ "AND": children.iter().map(Expression::to_wire).collect::<Vec<_>>() })
            }
            Self::Or(children) => {
                json!({ "OR": children.iter().map(Expression::to_wire).collect::<Vec<_>>() })
            }
        }
    }
}

impl Serialize for Expression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_wire().serialize(serializer)
    }
}
