//! Filter query compilation.
//!
//! - [`FilterClause`] - syntactic parse of one `attr <op> value` clause
//! - [`find_operator`] - longest-operator, leftmost-position split
//! - [`FilterCompiler`] - schema-aware interpretation and AND/OR composition

use serde::{Deserialize, Serialize};

pub mod clause;
pub mod compiler;
pub mod operator;

pub use clause::{AttributePath, FilterClause};
pub use compiler::{FilterCompiler, compile};
pub use operator::{OperatorToken, find_operator};

/// Grouping of `or`-flagged clauses.
///
/// With `or_priority`, every plain clause is ANDed into one group and each
/// `or` clause is ORed against that group: `a, b, or c` is `(a AND b) OR c`.
/// With `and_priority`, each `or` clause joins the group of the clause before
/// it and groups are ANDed: `a, or b, c` is `(a OR b) AND c`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterPriority {
    #[default]
    OrPriority,
    AndPriority,
}
