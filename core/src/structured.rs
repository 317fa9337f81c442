//! Structured query expressions.
//!
//! A small AST for the service's structured query syntax. Values of this
//! type can be used anywhere a search term or filter is accepted; the
//! default query adapters render them and switch `q.parser` to
//! `structured`.
//!
//! ```
//! use cloudsearch_core::StructuredQuery;
//!
//! let q = StructuredQuery::and(vec![
//!     StructuredQuery::term("genres", "Sci-Fi"),
//!     StructuredQuery::not(StructuredQuery::range("year", ..1990)),
//! ]);
//! assert_eq!(
//!     q.to_query_string(),
//!     "(and (term field=genres 'Sci-Fi') (not (range field=year {,1990})))"
//! );
//! ```

use std::ops::{Bound, RangeBounds};

/// A literal compared against a field.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Text(String),
    Int(i64),
    Float(f64),
}

impl Literal {
    fn render(&self) -> String {
        match self {
            Literal::Text(s) => quote(s),
            Literal::Int(i) => i.to_string(),
            Literal::Float(f) => f.to_string(),
        }
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::Text(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::Text(s)
    }
}

impl From<i64> for Literal {
    fn from(i: i64) -> Self {
        Literal::Int(i)
    }
}

impl From<i32> for Literal {
    fn from(i: i32) -> Self {
        Literal::Int(i64::from(i))
    }
}

impl From<f64> for Literal {
    fn from(f: f64) -> Self {
        Literal::Float(f)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StructuredQuery {
    MatchAll,
    Term {
        field: Option<String>,
        value: Literal,
        boost: Option<u32>,
    },
    Phrase {
        field: Option<String>,
        text: String,
        boost: Option<u32>,
    },
    Prefix {
        field: Option<String>,
        text: String,
        boost: Option<u32>,
    },
    Range {
        field: String,
        lower: Bound<Literal>,
        upper: Bound<Literal>,
    },
    And(Vec<StructuredQuery>),
    Or(Vec<StructuredQuery>),
    Not(Box<StructuredQuery>),
}

impl StructuredQuery {
    pub fn match_all() -> Self {
        StructuredQuery::MatchAll
    }

    pub fn term(field: impl Into<String>, value: impl Into<Literal>) -> Self {
        StructuredQuery::Term {
            field: Some(field.into()),
            value: value.into(),
            boost: None,
        }
    }

    /// Term matched against every text field.
    pub fn any_term(value: impl Into<Literal>) -> Self {
        StructuredQuery::Term {
            field: None,
            value: value.into(),
            boost: None,
        }
    }

    pub fn phrase(field: impl Into<String>, text: impl Into<String>) -> Self {
        StructuredQuery::Phrase {
            field: Some(field.into()),
            text: text.into(),
            boost: None,
        }
    }

    pub fn prefix(field: impl Into<String>, text: impl Into<String>) -> Self {
        StructuredQuery::Prefix {
            field: Some(field.into()),
            text: text.into(),
            boost: None,
        }
    }

    pub fn range<L, R>(field: impl Into<String>, range: R) -> Self
    where
        L: Into<Literal> + Clone,
        R: RangeBounds<L>,
    {
        let map = |b: Bound<&L>| match b {
            Bound::Included(v) => Bound::Included(v.clone().into()),
            Bound::Excluded(v) => Bound::Excluded(v.clone().into()),
            Bound::Unbounded => Bound::Unbounded,
        };
        StructuredQuery::Range {
            field: field.into(),
            lower: map(range.start_bound()),
            upper: map(range.end_bound()),
        }
    }

    pub fn and(queries: Vec<StructuredQuery>) -> Self {
        StructuredQuery::And(queries)
    }

    pub fn or(queries: Vec<StructuredQuery>) -> Self {
        StructuredQuery::Or(queries)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(query: StructuredQuery) -> Self {
        StructuredQuery::Not(Box::new(query))
    }

    /// Attach a boost to a term, phrase or prefix. Other nodes are returned
    /// unchanged.
    pub fn boost(mut self, weight: u32) -> Self {
        match &mut self {
            StructuredQuery::Term { boost, .. }
            | StructuredQuery::Phrase { boost, .. }
            | StructuredQuery::Prefix { boost, .. } => *boost = Some(weight),
            _ => {}
        }
        self
    }

    /// Render in the structured parser's syntax.
    pub fn to_query_string(&self) -> String {
        match self {
            StructuredQuery::MatchAll => "matchall".to_string(),
            StructuredQuery::Term { field, value, boost } => {
                leaf("term", field.as_deref(), *boost, &value.render())
            }
            StructuredQuery::Phrase { field, text, boost } => {
                leaf("phrase", field.as_deref(), *boost, &quote(text))
            }
            StructuredQuery::Prefix { field, text, boost } => {
                leaf("prefix", field.as_deref(), *boost, &quote(text))
            }
            StructuredQuery::Range { field, lower, upper } => {
                let lower = match lower {
                    Bound::Included(v) => format!("[{}", v.render()),
                    Bound::Excluded(v) => format!("{{{}", v.render()),
                    Bound::Unbounded => "{".to_string(),
                };
                let upper = match upper {
                    Bound::Included(v) => format!("{}]", v.render()),
                    Bound::Excluded(v) => format!("{}}}", v.render()),
                    Bound::Unbounded => "}".to_string(),
                };
                format!("(range field={field} {lower},{upper})")
            }
            StructuredQuery::And(qs) => compound("and", qs),
            StructuredQuery::Or(qs) => compound("or", qs),
            StructuredQuery::Not(q) => format!("(not {})", q.to_query_string()),
        }
    }
}

fn leaf(op: &str, field: Option<&str>, boost: Option<u32>, value: &str) -> String {
    let mut out = format!("({op}");
    if let Some(field) = field {
        out.push_str(" field=");
        out.push_str(field);
    }
    if let Some(boost) = boost {
        out.push_str(&format!(" boost={boost}"));
    }
    out.push(' ');
    out.push_str(value);
    out.push(')');
    out
}

fn compound(op: &str, queries: &[StructuredQuery]) -> String {
    let mut out = format!("({op}");
    for q in queries {
        out.push(' ');
        out.push_str(&q.to_query_string());
    }
    out.push(')');
    out
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}
