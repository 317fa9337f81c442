//! Flat wire parameter mapping shared by every request kind.
//!
//! # Design
//! Keys are dotted strings (`facet.rating`, `q.options`, `Action`). Values
//! stay typed until the dispatcher encodes the payload: JSON-tagged values
//! are serialized there, once, and query-like values are resolved through
//! the query adapters just before that. Re-inserting a key replaces its
//! value, so the last write wins.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{CloudSearchError, Result};
use crate::query::QueryLike;

/// One wire parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Int(i64),
    Bool(bool),
    /// Rendered as JSON text at encode time.
    Json(Value),
    /// Resolved to a query string by the dispatcher (search requests only).
    Query(QueryLike),
}

impl ParamValue {
    /// Nil and empty-string values are never transmitted.
    pub fn is_blank(&self) -> bool {
        match self {
            ParamValue::Text(s) => s.is_empty(),
            ParamValue::Json(Value::Null) => true,
            ParamValue::Json(Value::String(s)) => s.is_empty(),
            ParamValue::Query(QueryLike::Text(s)) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render the value as it appears on the wire.
    pub fn render(&self, key: &str) -> Result<String> {
        match self {
            ParamValue::Text(s) => Ok(s.clone()),
            ParamValue::Int(i) => Ok(i.to_string()),
            ParamValue::Bool(b) => Ok(b.to_string()),
            ParamValue::Json(v) => serde_json::to_string(v)
                .map_err(|e| CloudSearchError::Serialization(format!("{key}: {e}"))),
            ParamValue::Query(q) => Err(CloudSearchError::UnsupportedQueryType(format!(
                "{} left unresolved in `{key}`",
                q.type_name()
            ))),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Text(s)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        ParamValue::Int(i)
    }
}

impl From<i32> for ParamValue {
    fn from(i: i32) -> Self {
        ParamValue::Int(i64::from(i))
    }
}

impl From<u32> for ParamValue {
    fn from(i: u32) -> Self {
        ParamValue::Int(i64::from(i))
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

impl From<Value> for ParamValue {
    fn from(v: Value) -> Self {
        ParamValue::Json(v)
    }
}

impl From<QueryLike> for ParamValue {
    fn from(q: QueryLike) -> Self {
        ParamValue::Query(q)
    }
}

/// String-keyed parameter mapping. Iteration order is by key, which keeps
/// encoded payloads deterministic; the wire format itself is unordered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(BTreeMap<String, ParamValue>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(ParamValue::as_int)
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut ParamValue)> {
        self.0.iter_mut()
    }

    /// Overlay `other` on top of `self`; keys in `other` win.
    pub fn merge(&mut self, other: Params) {
        self.0.extend(other.0);
    }

    /// Drop nil and empty-string entries.
    pub fn elide_blank(&mut self) {
        self.0.retain(|_, v| !v.is_blank());
    }

    /// Render every entry to its wire string, skipping blanks.
    pub fn encode(&self) -> Result<Vec<(String, String)>> {
        self.0
            .iter()
            .filter(|(_, v)| !v.is_blank())
            .map(|(k, v)| Ok((k.clone(), v.render(k)?)))
            .collect()
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn later_insert_wins() {
        let mut params = Params::new();
        params.insert("size", 10);
        params.insert("size", 25);
        assert_eq!(params.get_int("size"), Some(25));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn blank_values_are_elided() {
        let mut params = Params::new()
            .with("q", "star")
            .with("cursor", "")
            .with("facet.year", Value::Null)
            .with("fq", QueryLike::from(""));
        params.elide_blank();
        assert_eq!(params.len(), 1);
        assert!(params.contains_key("q"));
    }

    #[test]
    fn json_values_render_at_encode_time() {
        let params = Params::new()
            .with("facet.rating", json!({}))
            .with("highlight.title", json!({"format": "html"}))
            .with("partial", true)
            .with("start", 20);
        let encoded = params.encode().unwrap();
        assert_eq!(
            encoded,
            vec![
                ("facet.rating".to_string(), "{}".to_string()),
                ("highlight.title".to_string(), r#"{"format":"html"}"#.to_string()),
                ("partial".to_string(), "true".to_string()),
                ("start".to_string(), "20".to_string()),
            ]
        );
    }

    #[test]
    fn unresolved_query_fails_to_encode() {
        let params = Params::new().with("q", QueryLike::from("star"));
        let err = params.encode().unwrap_err();
        assert!(matches!(err, CloudSearchError::UnsupportedQueryType(_)));
    }

    #[test]
    fn merge_overlays_keys() {
        let mut base = Params::new().with("Action", "CreateDomain").with("Version", "old");
        base.merge(Params::new().with("Version", "2013-01-01"));
        assert_eq!(base.get("Version").and_then(ParamValue::as_text), Some("2013-01-01"));
        assert_eq!(base.get("Action").and_then(ParamValue::as_text), Some("CreateDomain"));
    }
}
