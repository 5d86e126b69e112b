//! Syntactic parsing of a single filter clause.

use resource_access_sdk::AccessError;

use super::operator::{OperatorToken, find_operator};

/// `[association.]attribute`, at most one association hop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributePath {
    pub association: Option<String>,
    pub attribute: String,
}

impl AttributePath {
    /// Split a dotted attribute expression.
    ///
    /// # Errors
    ///
    /// `InvalidFilter` when the expression is empty, has empty segments, or
    /// traverses more than one association.
    pub fn parse(expr: &str) -> Result<Self, AccessError> {
        let segments: Vec<&str> = expr.split('.').map(str::trim).collect();
        if segments.len() > 2 {
            return Err(AccessError::invalid_filter(format!(
                "Filtering of attributes with more than one association away is not \
                 supported: {expr}"
            )));
        }
        if segments.iter().any(|s| s.is_empty()) {
            return Err(AccessError::invalid_filter(format!(
                "Missing attribute in filter expression '{expr}'"
            )));
        }
        Ok(match segments.as_slice() {
            [association, attribute] => Self {
                association: Some((*association).to_owned()),
                attribute: (*attribute).to_owned(),
            },
            _ => Self {
                association: None,
                attribute: segments.concat(),
            },
        })
    }
}

/// One parsed clause, before value interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterClause {
    pub path: AttributePath,
    pub operator: OperatorToken,
    /// Trimmed text right of the operator, quotes included.
    pub raw_value: String,
    /// The clause started with `or `.
    pub logical_or: bool,
}

impl FilterClause {
    /// Parse `text` into attribute path, operator and raw value.
    ///
    /// # Errors
    ///
    /// `InvalidFilter` when no operator is present or the attribute path is invalid.
    pub fn parse(text: &str) -> Result<Self, AccessError> {
        let (logical_or, body) = strip_or_marker(text.trim());
        if body.is_empty() {
            return Err(AccessError::invalid_filter("Empty filter clause"));
        }

        let Some(found) = find_operator(body) else {
            return Err(AccessError::invalid_filter(format!(
                "Unknown filter operator specified in '{body}'"
            )));
        };

        let attribute_expr = body[..found.start].trim();
        let raw_value = body[found.end..].trim();

        Ok(Self {
            path: AttributePath::parse(attribute_expr)?,
            operator: found.token,
            raw_value: raw_value.to_owned(),
            logical_or,
        })
    }
}

/// Detect a leading case-insensitive `or ` and strip it.
fn strip_or_marker(text: &str) -> (bool, &str) {
    match text.get(..3) {
        Some(head) if head.eq_ignore_ascii_case("or ") => (true, text[3..].trim_start()),
        _ => (false, text),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn splits_attribute_operator_and_value() {
        let clause = FilterClause::parse("  name = 'bb'  ").unwrap();
        assert_eq!(clause.path.attribute, "name");
        assert_eq!(clause.path.association, None);
        assert_eq!(clause.operator, OperatorToken::Eq);
        assert_eq!(clause.raw_value, "'bb'");
        assert!(!clause.logical_or);
    }

    #[test]
    fn or_marker_is_case_insensitive() {
        for text in ["or id > 10", "OR id > 10", "Or   id > 10"] {
            let clause = FilterClause::parse(text).unwrap();
            assert!(clause.logical_or, "{text}");
            assert_eq!(clause.path.attribute, "id");
            assert_eq!(clause.operator, OperatorToken::Gt);
        }
        let clause = FilterClause::parse("origin=x").unwrap();
        assert!(!clause.logical_or);
        assert_eq!(clause.path.attribute, "origin");
    }

    #[test]
    fn one_association_hop_is_allowed() {
        let clause = FilterClause::parse("host.name=foo").unwrap();
        assert_eq!(clause.path.association.as_deref(), Some("host"));
        assert_eq!(clause.path.attribute, "name");
    }

    #[test]
    fn two_association_hops_are_rejected() {
        let err = FilterClause::parse("host.hardware.memory_mb>1024").unwrap_err();
        assert!(matches!(err, AccessError::InvalidFilter { .. }));
        assert!(err.message().contains("more than one association"));
    }

    #[test]
    fn missing_operator_is_rejected() {
        let err = FilterClause::parse("name bb").unwrap_err();
        assert!(err.message().contains("Unknown filter operator"));
    }

    #[test]
    fn missing_attribute_is_rejected() {
        assert!(FilterClause::parse("=5").is_err());
        assert!(FilterClause::parse("host.=5").is_err());
        assert!(FilterClause::parse("or ").is_err());
    }
}
