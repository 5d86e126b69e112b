//! Filter operator tokens and how each one renders on the wire.

use resource_access_sdk::FilterOp;

/// Operator as written in a filter clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorToken {
    /// `=`
    Eq,
    /// `==`
    EqEq,
    /// `!=`
    Ne,
    /// `!==`
    NeEq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Le,
    /// `>=`
    Ge,
    /// `=~`
    Matches,
    /// `!~`
    DoesNotMatch,
}

/// Operator alphabet, longest tokens first.
const TOKENS: &[(&str, OperatorToken)] = &[
    ("!==", OperatorToken::NeEq),
    ("!=", OperatorToken::Ne),
    ("<=", OperatorToken::Le),
    (">=", OperatorToken::Ge),
    ("==", OperatorToken::EqEq),
    ("=~", OperatorToken::Matches),
    ("!~", OperatorToken::DoesNotMatch),
    ("<", OperatorToken::Lt),
    (">", OperatorToken::Gt),
    ("=", OperatorToken::Eq),
];

/// Wire operators an [`OperatorToken`] may render as, by value kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rendering {
    pub default: FilterOp,
    /// Used when a quoted value carries `%` / `*` wildcards.
    pub regex: Option<FilterOp>,
    /// Used for unquoted `NULL` / `nil`.
    pub null: Option<FilterOp>,
    /// Used against date and datetime attributes; `None` rejects the clause.
    pub temporal: Option<FilterOp>,
}

impl OperatorToken {
    /// Source text of this token.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        TOKENS
            .iter()
            .find(|(_, token)| *token == self)
            .map_or("", |(text, _)| *text)
    }

    /// `=~` and `!~` take a regular expression as their value.
    #[must_use]
    pub fn is_explicit_regex(self) -> bool {
        matches!(self, Self::Matches | Self::DoesNotMatch)
    }

    #[must_use]
    pub fn rendering(self) -> Rendering {
        match self {
            Self::Eq | Self::EqEq => Rendering {
                default: FilterOp::Eq,
                regex: Some(FilterOp::RegexMatches),
                null: Some(FilterOp::IsNull),
                temporal: Some(FilterOp::Is),
            },
            Self::Ne | Self::NeEq => Rendering {
                default: FilterOp::Ne,
                regex: Some(FilterOp::RegexDoesNotMatch),
                null: Some(FilterOp::IsNotNull),
                temporal: None,
            },
            Self::Lt => Rendering {
                default: FilterOp::Lt,
                regex: None,
                null: None,
                temporal: Some(FilterOp::Before),
            },
            Self::Gt => Rendering {
                default: FilterOp::Gt,
                regex: None,
                null: None,
                temporal: Some(FilterOp::After),
            },
            Self::Le => Rendering {
                default: FilterOp::Le,
                regex: None,
                null: None,
                temporal: None,
            },
            Self::Ge => Rendering {
                default: FilterOp::Ge,
                regex: None,
                null: None,
                temporal: None,
            },
            Self::Matches => Rendering {
                default: FilterOp::RegexMatches,
                regex: Some(FilterOp::RegexMatches),
                null: None,
                temporal: None,
            },
            Self::DoesNotMatch => Rendering {
                default: FilterOp::RegexDoesNotMatch,
                regex: Some(FilterOp::RegexDoesNotMatch),
                null: None,
                temporal: None,
            },
        }
    }
}

/// Operator match inside a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorMatch {
    pub token: OperatorToken,
    /// Byte offset of the operator in the clause.
    pub start: usize,
    /// Byte offset just past the operator.
    pub end: usize,
}

/// Find the split point of a clause.
///
/// Scans left to right and takes the first position where any operator
/// matches, preferring the longest operator at that position. Operator
/// characters inside a quoted value are never reached when the attribute
/// side carries the real operator.
#[must_use]
pub fn find_operator(clause: &str) -> Option<OperatorMatch> {
    clause.char_indices().find_map(|(start, _)| {
        let rest = &clause[start..];
        TOKENS
            .iter()
            .find(|(text, _)| rest.starts_with(text))
            .map(|(text, token)| OperatorMatch {
                token: *token,
                start,
                end: start + text.len(),
            })
    })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn token(clause: &str) -> Option<OperatorToken> {
        find_operator(clause).map(|m| m.token)
    }

    #[test]
    fn longest_operator_wins_at_a_position() {
        assert_eq!(token("a!==b"), Some(OperatorToken::NeEq));
        assert_eq!(token("a!=b"), Some(OperatorToken::Ne));
        assert_eq!(token("a==b"), Some(OperatorToken::EqEq));
        assert_eq!(token("a=~b"), Some(OperatorToken::Matches));
        assert_eq!(token("a<=b"), Some(OperatorToken::Le));
        assert_eq!(token("a<b"), Some(OperatorToken::Lt));
        assert_eq!(token("a=b"), Some(OperatorToken::Eq));
    }

    #[test]
    fn leftmost_position_wins_over_length() {
        let m = find_operator("name='x!=y'").unwrap();
        assert_eq!(m.token, OperatorToken::Eq);
        assert_eq!(m.start, 4);
        assert_eq!(m.end, 5);
    }

    #[test]
    fn unquoted_operator_like_values_split_at_first_operator() {
        let m = find_operator("label=a=b").unwrap();
        assert_eq!(m.start, 5);
        let m = find_operator("note<=x=y").unwrap();
        assert_eq!(m.token, OperatorToken::Le);
    }

    #[test]
    fn clause_without_operator() {
        assert_eq!(find_operator("name bb"), None);
        assert_eq!(find_operator(""), None);
    }

    #[test]
    fn token_text_round_trips() {
        for (text, token) in TOKENS {
            assert_eq!(token.as_str(), *text);
        }
    }

    #[test]
    fn only_lt_gt_eq_support_dates() {
        assert_eq!(OperatorToken::Lt.rendering().temporal, Some(FilterOp::Before));
        assert_eq!(OperatorToken::Gt.rendering().temporal, Some(FilterOp::After));
        assert_eq!(OperatorToken::Eq.rendering().temporal, Some(FilterOp::Is));
        assert_eq!(OperatorToken::Le.rendering().temporal, None);
        assert_eq!(OperatorToken::Ge.rendering().temporal, None);
        assert_eq!(OperatorToken::Ne.rendering().temporal, None);
    }
}
