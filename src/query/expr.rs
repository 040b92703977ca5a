//! Boolean filter expressions.
//!
//! Store-neutral query tree; store clients translate it into their native
//! query language.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use unicode_normalization::UnicodeNormalization;

/// A boolean combination of clauses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoolExpr {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must: Vec<Expr>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub should: Vec<Expr>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter: Vec<Expr>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must_not: Vec<Expr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_should_match: Option<usize>,
}

impl BoolExpr {
    pub fn is_empty(&self) -> bool {
        self.must.is_empty()
            && self.should.is_empty()
            && self.filter.is_empty()
            && self.must_not.is_empty()
    }

    /// Number of `should` clauses that must match.
    ///
    /// Without an explicit minimum, `should` clauses are required only when
    /// the expression has no `must` or `filter` clause.
    pub fn required_should(&self) -> usize {
        match self.minimum_should_match {
            Some(n) => n,
            None if self.should.is_empty() => 0,
            None if self.must.is_empty() && self.filter.is_empty() => 1,
            None => 0,
        }
    }
}

/// Operator joining the words of a match clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOperator {
    And,
    Or,
}

/// One node of a boolean filter tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    MatchAll,
    MatchNone,
    Term {
        field: String,
        value: Value,
    },
    /// Matches any of `values`; an empty list matches nothing
    Terms {
        field: String,
        values: Vec<Value>,
    },
    /// Matches documents by id; an empty list matches nothing
    Ids(Vec<String>),
    Match {
        field: String,
        text: String,
        operator: MatchOperator,
    },
    Prefix {
        field: String,
        prefix: String,
    },
    Range {
        field: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        gte: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lte: Option<Value>,
    },
    Exists {
        field: String,
    },
    /// Clause evaluated per element of the nested object array at `path`
    Nested {
        path: String,
        query: Box<Expr>,
    },
    Bool(BoolExpr),
}

impl Expr {
    pub fn term(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Expr::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn terms<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Expr::Terms {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn ids<S: Into<String>>(ids: impl IntoIterator<Item = S>) -> Self {
        Expr::Ids(ids.into_iter().map(Into::into).collect())
    }

    /// All words of `text` must occur in `field` (NFC-normalized, case-insensitive)
    pub fn match_all_words(field: impl Into<String>, text: &str) -> Self {
        Expr::Match {
            field: field.into(),
            text: normalize_text(text),
            operator: MatchOperator::And,
        }
    }

    /// Any word of `text` must occur in `field`
    pub fn match_any_word(field: impl Into<String>, text: &str) -> Self {
        Expr::Match {
            field: field.into(),
            text: normalize_text(text),
            operator: MatchOperator::Or,
        }
    }

    pub fn prefix(field: impl Into<String>, prefix: &str) -> Self {
        Expr::Prefix {
            field: field.into(),
            prefix: normalize_text(prefix),
        }
    }

    pub fn range(
        field: impl Into<String>,
        gte: Option<Value>,
        lte: Option<Value>,
    ) -> Self {
        Expr::Range {
            field: field.into(),
            gte,
            lte,
        }
    }

    pub fn exists(field: impl Into<String>) -> Self {
        Expr::Exists {
            field: field.into(),
        }
    }

    pub fn nested(path: impl Into<String>, query: Expr) -> Self {
        Expr::Nested {
            path: path.into(),
            query: Box::new(query),
        }
    }

    /// `should` over `clauses` with at least one required
    pub fn any_of(clauses: Vec<Expr>) -> Self {
        Expr::Bool(BoolExpr {
            should: clauses,
            minimum_should_match: Some(1),
            ..BoolExpr::default()
        })
    }
}

/// NFC-normalize and trim user-supplied query text.
///
/// Transliterations carry combining diacritics; normalizing keeps composed and
/// decomposed input equivalent.
pub fn normalize_text(text: &str) -> String {
    text.trim().nfc().collect()
}
