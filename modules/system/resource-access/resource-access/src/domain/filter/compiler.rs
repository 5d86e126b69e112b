//! Schema-aware filter compiler.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use resource_access_sdk::{
    AccessError, AttributeType, Expression, FieldRef, FilterOp, SchemaInspector,
};
use tracing::debug;

use super::FilterPriority;
use super::clause::{AttributePath, FilterClause};
use super::operator::OperatorToken;

/// Naive date-time layouts accepted for temporal comparisons, besides RFC 3339.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Compiles textual filter clauses against one target type.
#[derive(Clone, Copy)]
pub struct FilterCompiler<'a> {
    schema: &'a dyn SchemaInspector,
    priority: FilterPriority,
}

impl<'a> FilterCompiler<'a> {
    #[must_use]
    pub fn new(schema: &'a dyn SchemaInspector) -> Self {
        Self {
            schema,
            priority: FilterPriority::default(),
        }
    }

    #[must_use]
    pub fn with_priority(mut self, priority: FilterPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Compile `clauses` (in order) into one expression over `type_name`.
    ///
    /// # Errors
    ///
    /// `InvalidFilter` for an empty clause list, an unknown operator, an
    /// unknown attribute or association, more than one association hop, an
    /// operator unsupported for a date/datetime attribute, or an unparsable
    /// date/datetime value.
    pub fn compile<S: AsRef<str>>(
        &self,
        type_name: &str,
        clauses: &[S],
    ) -> Result<Expression, AccessError> {
        if clauses.is_empty() {
            return Err(AccessError::invalid_filter("No filter clauses specified"));
        }

        let mut terms = Vec::with_capacity(clauses.len());
        for text in clauses {
            let clause = FilterClause::parse(text.as_ref())?;
            let expr = self.compile_clause(type_name, &clause)?;
            terms.push((clause.logical_or, expr));
        }

        debug!(
            type_name,
            clauses = terms.len(),
            priority = ?self.priority,
            "compiled filter clauses"
        );

        Ok(match self.priority {
            FilterPriority::OrPriority => compose_or_priority(terms),
            FilterPriority::AndPriority => compose_and_priority(terms),
        })
    }

    fn compile_clause(
        &self,
        type_name: &str,
        clause: &FilterClause,
    ) -> Result<Expression, AccessError> {
        let (field, attr_type) = resolve_field(self.schema, type_name, &clause.path)?;
        let (op, value) = interpret_value(clause, attr_type)?;
        Ok(Expression::leaf(op, field, value))
    }
}

/// Compile `clauses` over `type_name` with the default priority.
///
/// # Errors
///
/// See [`FilterCompiler::compile`].
pub fn compile<S: AsRef<str>>(
    clauses: &[S],
    type_name: &str,
    schema: &dyn SchemaInspector,
) -> Result<Expression, AccessError> {
    FilterCompiler::new(schema).compile(type_name, clauses)
}

/// Resolve an attribute path to a field reference and its declared type.
pub(crate) fn resolve_field(
    schema: &dyn SchemaInspector,
    type_name: &str,
    path: &AttributePath,
) -> Result<(FieldRef, Option<AttributeType>), AccessError> {
    let leaf_type = match &path.association {
        Some(association) => schema
            .associated_type(type_name, association)
            .ok_or_else(|| {
                AccessError::invalid_filter(format!(
                    "Unknown association {association} for {type_name}"
                ))
            })?,
        None => type_name.to_owned(),
    };

    if !schema.is_real_attribute(&leaf_type, &path.attribute) {
        return Err(AccessError::invalid_filter(format!(
            "Attribute {} does not exist for {leaf_type}",
            path.attribute
        )));
    }

    let field = FieldRef {
        type_name: type_name.to_owned(),
        association: path.association.clone(),
        attribute: path.attribute.clone(),
    };
    Ok((field, schema.attribute_type(&leaf_type, &path.attribute)))
}

/// Pick the wire operator and value for a clause.
fn interpret_value(
    clause: &FilterClause,
    attr_type: Option<AttributeType>,
) -> Result<(FilterOp, Option<String>), AccessError> {
    let rendering = clause.operator.rendering();
    let raw = clause.raw_value.as_str();

    if let Some(inner) = unquote(raw) {
        if clause.operator.is_explicit_regex() {
            return Ok((rendering.default, Some(regex_literal(inner))));
        }
        if has_wildcards(inner) {
            if attr_type == Some(AttributeType::StringSet) && clause.operator == OperatorToken::Eq {
                return Ok((FilterOp::IncludesAll, Some(inner.to_owned())));
            }
            if let Some(op) = rendering.regex {
                return Ok((op, Some(wildcard_regex(inner))));
            }
        }
        if let Some(t) = attr_type.filter(|t| t.is_temporal()) {
            return temporal_value(clause, t, inner);
        }
        return Ok((rendering.default, Some(inner.to_owned())));
    }

    if raw.eq_ignore_ascii_case("null") || raw.eq_ignore_ascii_case("nil") {
        return Ok((rendering.null.unwrap_or(rendering.default), None));
    }

    if let Some(t) = attr_type.filter(|t| t.is_temporal()) {
        return temporal_value(clause, t, raw);
    }

    if clause.operator.is_explicit_regex() {
        return Ok((rendering.default, Some(regex_literal(raw))));
    }

    Ok((rendering.default, Some(raw.to_owned())))
}

/// Date/datetime comparison: only `<`, `>` and `=` apply, and `value` must parse.
fn temporal_value(
    clause: &FilterClause,
    attr_type: AttributeType,
    value: &str,
) -> Result<(FilterOp, Option<String>), AccessError> {
    let label = if attr_type == AttributeType::Date { "date" } else { "datetime" };
    let Some(op) = clause.operator.rendering().temporal else {
        return Err(AccessError::invalid_filter(format!(
            "Unsupported operator for {label}: {}",
            clause.operator.as_str()
        )));
    };
    if !parses_as_time(value) {
        return Err(AccessError::invalid_filter(format!(
            "Bad format for {label}: {value}"
        )));
    }
    Ok((op, Some(value.to_owned())))
}

fn unquote(raw: &str) -> Option<&str> {
    let quote = raw.chars().next().filter(|c| matches!(*c, '\'' | '"'))?;
    if raw.len() >= 2 && raw.ends_with(quote) {
        Some(&raw[1..raw.len() - 1])
    } else {
        None
    }
}

fn has_wildcards(value: &str) -> bool {
    value.contains(['%', '*'])
}

/// Anchored pattern where `%` and `*` match any sequence.
fn wildcard_regex(value: &str) -> String {
    let body = regex::escape(value).replace("\\*", ".*").replace('%', ".*");
    format!("/\\A{body}\\z/")
}

/// Wrap a user-supplied regex source in `/.../` unless already wrapped.
fn regex_literal(source: &str) -> String {
    if source.len() >= 2 && source.starts_with('/') && source.ends_with('/') {
        source.to_owned()
    } else {
        format!("/{source}/")
    }
}

fn parses_as_time(raw: &str) -> bool {
    DateTime::parse_from_rfc3339(raw).is_ok()
        || DATETIME_FORMATS
            .iter()
            .any(|layout| NaiveDateTime::parse_from_str(raw, layout).is_ok())
        || NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok()
}

/// `(a AND b ...) OR c OR d ...`
fn compose_or_priority(terms: Vec<(bool, Expression)>) -> Expression {
    let (or_terms, and_terms): (Vec<_>, Vec<_>) = terms.into_iter().partition(|(or, _)| *or);
    let and_terms: Vec<Expression> = and_terms.into_iter().map(|(_, e)| e).collect();
    let or_terms: Vec<Expression> = or_terms.into_iter().map(|(_, e)| e).collect();

    if or_terms.is_empty() {
        return Expression::all(and_terms);
    }
    let mut alternatives = Vec::with_capacity(or_terms.len() + 1);
    if !and_terms.is_empty() {
        alternatives.push(Expression::all(and_terms));
    }
    alternatives.extend(or_terms);
    Expression::any(alternatives)
}

/// `(a OR b) AND (c OR d) ...`, each `or` clause joining the preceding group.
fn compose_and_priority(terms: Vec<(bool, Expression)>) -> Expression {
    let mut groups: Vec<Vec<Expression>> = Vec::new();
    for (logical_or, expr) in terms {
        if logical_or && let Some(group) = groups.last_mut() {
            group.push(expr);
        } else {
            groups.push(vec![expr]);
        }
    }
    Expression::all(groups.into_iter().map(Expression::any).collect())
}
