//! Translation of query-like values into wire query strings.
//!
//! # Design
//! A search term is either plain text or a structured expression object.
//! Plain text is sent as-is and leaves the parser mode alone. Expression
//! objects are rendered by an adapter registered for their concrete type,
//! and force the `structured` parser. A value whose type has no adapter is
//! an error.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{CloudSearchError, Result};
use crate::structured::StructuredQuery;

/// Grammar used by the service to interpret `q`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParserMode {
    Simple,
    Structured,
    Lucene,
    Dismax,
}

impl ParserMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ParserMode::Simple => "simple",
            ParserMode::Structured => "structured",
            ParserMode::Lucene => "lucene",
            ParserMode::Dismax => "dismax",
        }
    }
}

impl fmt::Display for ParserMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParserMode {
    type Err = CloudSearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "simple" => Ok(ParserMode::Simple),
            "structured" => Ok(ParserMode::Structured),
            "lucene" => Ok(ParserMode::Lucene),
            "dismax" => Ok(ParserMode::Dismax),
            other => Err(CloudSearchError::InvalidOption {
                option: "parser".to_string(),
                reason: format!("unknown parser `{other}`"),
            }),
        }
    }
}

/// An expression object carried opaquely until dispatch.
#[derive(Clone)]
pub struct QueryExpression {
    value: Arc<dyn Any + Send + Sync>,
    type_id: TypeId,
    type_name: &'static str,
}

impl QueryExpression {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}

impl fmt::Debug for QueryExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryExpression")
            .field("type", &self.type_name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for QueryExpression {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

/// A search term or filter: plain text or an expression object.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryLike {
    Text(String),
    Expression(QueryExpression),
}

impl QueryLike {
    pub fn expression<T: Any + Send + Sync>(value: T) -> Self {
        QueryLike::Expression(QueryExpression::new(value))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            QueryLike::Text(_) => "text",
            QueryLike::Expression(e) => e.type_name(),
        }
    }
}

impl From<&str> for QueryLike {
    fn from(s: &str) -> Self {
        QueryLike::Text(s.to_string())
    }
}

impl From<String> for QueryLike {
    fn from(s: String) -> Self {
        QueryLike::Text(s)
    }
}

impl From<StructuredQuery> for QueryLike {
    fn from(q: StructuredQuery) -> Self {
        QueryLike::expression(q)
    }
}

type Render = Arc<dyn Fn(&QueryExpression) -> Option<String> + Send + Sync>;

/// Registry of expression renderers, keyed by the expression's type.
///
/// `QueryAdapters::default()` knows how to render `StructuredQuery`.
#[derive(Clone)]
pub struct QueryAdapters {
    renderers: HashMap<TypeId, Render>,
}

impl QueryAdapters {
    /// A registry with no adapters at all.
    pub fn empty() -> Self {
        Self {
            renderers: HashMap::new(),
        }
    }

    /// Register `render` for expressions of type `T`, replacing any
    /// previous adapter for that type.
    pub fn register<T, F>(&mut self, render: F) -> &mut Self
    where
        T: Any + Send + Sync,
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        let render: Render = Arc::new(move |expr: &QueryExpression| expr.downcast_ref::<T>().map(&render));
        self.renderers.insert(TypeId::of::<T>(), render);
        self
    }

    pub fn supports(&self, query: &QueryLike) -> bool {
        match query {
            QueryLike::Text(_) => true,
            QueryLike::Expression(e) => self.renderers.contains_key(&e.type_id),
        }
    }

    /// Resolve a query-like value to its wire string and forced parser mode.
    pub fn parse(&self, query: Option<&QueryLike>) -> Result<(Option<String>, Option<ParserMode>)> {
        match query {
            None => Ok((None, None)),
            Some(QueryLike::Text(s)) => Ok((Some(s.clone()), None)),
            Some(QueryLike::Expression(expr)) => {
                let rendered = self
                    .renderers
                    .get(&expr.type_id)
                    .and_then(|render| render(expr))
                    .ok_or_else(|| CloudSearchError::UnsupportedQueryType(expr.type_name().to_string()))?;
                Ok((Some(rendered), Some(ParserMode::Structured)))
            }
        }
    }
}

impl Default for QueryAdapters {
    fn default() -> Self {
        let mut adapters = Self::empty();
        adapters.register::<StructuredQuery, _>(StructuredQuery::to_query_string);
        adapters
    }
}

impl fmt::Debug for QueryAdapters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryAdapters")
            .field("registered", &self.renderers.len())
            .finish()
    }
}
