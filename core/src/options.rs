//! Search options and their wire parameters.
//!
//! # Design
//! Callers describe a search with a bag of options drawn from a fixed
//! vocabulary (`facet`, `sort`, `return`, `size`, ...). The bag may arrive as
//! loosely shaped JSON; `SearchOption::parse` turns one key/value pair into a
//! typed variant, coercing values and rejecting malformed ones. Keys outside
//! the vocabulary are ignored so newer callers keep working against this
//! version. `SearchOption::normalize` then writes the variant's wire
//! parameters into a `Params` accumulator.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::{CloudSearchError, Result};
use crate::params::{ParamValue, Params};
use crate::query::{ParserMode, QueryLike};

/// Only the first ten sort entries are sent; the rest are discarded.
pub const MAX_SORT_FIELDS: usize = 10;

/// The document id is always returned and must not be requested.
pub const ID_FIELD: &str = "id";

/// Per-field configuration for facets, highlights and `q.options`.
#[derive(Debug, Clone, PartialEq)]
pub enum SubConfig {
    /// Renders as `{}`.
    Empty,
    /// Already-encoded JSON text, sent verbatim.
    Literal(String),
    /// Rendered as JSON at encode time.
    Json(Value),
}

impl SubConfig {
    /// Shapes other than nil, string, object or list fall back to `Empty`.
    pub fn from_json(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => SubConfig::Empty,
            Some(Value::String(s)) => SubConfig::Literal(s.clone()),
            Some(Value::Object(map)) => SubConfig::Json(Value::Object(map.clone())),
            Some(Value::Array(items)) => match pairs_to_object(items) {
                Some(obj) => SubConfig::Json(Value::Object(obj)),
                None => SubConfig::Json(Value::Array(items.clone())),
            },
            Some(_) => SubConfig::Empty,
        }
    }

    fn into_param(self) -> ParamValue {
        match self {
            SubConfig::Empty => ParamValue::Json(Value::Object(Map::new())),
            SubConfig::Literal(s) => ParamValue::Text(s),
            SubConfig::Json(v) => ParamValue::Json(v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }
}

impl FromStr for SortDirection {
    type Err = CloudSearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            other => Err(CloudSearchError::InvalidSortDirection(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    pub field: String,
    pub direction: SortDirection,
}

impl SortField {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }

    /// `-field` sorts descending, a bare name ascending.
    pub fn parse_name(name: &str) -> Self {
        match name.strip_prefix('-') {
            Some(field) => Self::desc(field),
            None => Self::asc(name),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.direction.as_str())
    }
}

/// One recognized search option.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOption {
    Cursor(String),
    /// Named expressions: `expr.<name>`.
    Expr(Vec<(String, String)>),
    /// `facet.<field>`.
    Facet(Vec<(String, SubConfig)>),
    /// `fq`.
    Filter(QueryLike),
    /// `highlight.<field>`.
    Highlight(Vec<(String, SubConfig)>),
    Partial(bool),
    /// `q.options`; `options` and `qoptions` both land here.
    QueryOptions(SubConfig),
    /// `q.parser`; `parser` and `qparser` both land here.
    Parser(ParserMode),
    Return(Vec<String>),
    Size(i64),
    Start(i64),
    Page(i64),
    Sort(Vec<SortField>),
}

impl SearchOption {
    /// Parse one caller-supplied option. Returns `Ok(None)` for keys outside
    /// the vocabulary.
    pub fn parse(key: &str, value: &Value) -> Result<Option<SearchOption>> {
        let option = match key {
            "cursor" => SearchOption::Cursor(scalar_string(key, value)?),
            "expr" => SearchOption::Expr(expressions(key, value)?),
            "facet" => SearchOption::Facet(sub_configs(key, value)?),
            "highlight" => SearchOption::Highlight(sub_configs(key, value)?),
            "fq" => SearchOption::Filter(QueryLike::Text(scalar_string(key, value)?)),
            "options" | "qoptions" => SearchOption::QueryOptions(SubConfig::from_json(Some(value))),
            "parser" | "qparser" => SearchOption::Parser(scalar_string(key, value)?.parse()?),
            "partial" => SearchOption::Partial(strict_bool(value)),
            "return" => SearchOption::Return(string_list(key, value)?),
            "size" => SearchOption::Size(coerce_integer(key, value)?),
            "start" => SearchOption::Start(coerce_integer(key, value)?),
            "page" => SearchOption::Page(coerce_integer(key, value)?),
            "sort" => SearchOption::Sort(sort_fields(value)?),
            _ => return Ok(None),
        };
        Ok(Some(option))
    }

    /// Write this option's wire parameters into `params`.
    pub fn normalize(self, params: &mut Params) {
        match self {
            SearchOption::Cursor(cursor) => params.insert("cursor", cursor),
            SearchOption::Expr(exprs) => {
                for (name, expr) in exprs {
                    params.insert(format!("expr.{name}"), expr);
                }
            }
            SearchOption::Facet(facets) => {
                for (field, config) in facets {
                    params.insert(format!("facet.{field}"), config.into_param());
                }
            }
            SearchOption::Highlight(highlights) => {
                for (field, config) in highlights {
                    params.insert(format!("highlight.{field}"), config.into_param());
                }
            }
            SearchOption::Filter(fq) => params.insert("fq", fq),
            SearchOption::QueryOptions(SubConfig::Empty) => params.insert("q.options", "{}"),
            SearchOption::QueryOptions(config) => params.insert("q.options", config.into_param()),
            SearchOption::Parser(mode) => params.insert("q.parser", mode.as_str()),
            SearchOption::Partial(partial) => params.insert("partial", partial),
            SearchOption::Return(fields) => {
                let fields: Vec<String> = fields.into_iter().filter(|f| f != ID_FIELD).collect();
                params.insert("return", fields.join(","));
            }
            SearchOption::Size(size) => params.insert("size", size),
            SearchOption::Start(start) => params.insert("start", start),
            SearchOption::Page(page) => params.insert("page", page),
            SearchOption::Sort(fields) => {
                let rendered: Vec<String> = fields
                    .iter()
                    .take(MAX_SORT_FIELDS)
                    .map(ToString::to_string)
                    .collect();
                params.insert("sort", rendered.join(","));
            }
        }
    }
}

/// An ordered bag of search options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOptions(Vec<SearchOption>);

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, option: SearchOption) -> Self {
        self.0.push(option);
        self
    }

    pub fn push(&mut self, option: SearchOption) {
        self.0.push(option);
    }

    pub fn iter(&self) -> impl Iterator<Item = &SearchOption> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse an option bag from JSON.
    ///
    /// Accepts an object or a list of `[key, value]` pairs. Entries are
    /// applied in the order given, so later duplicates win.
    pub fn from_json(value: &Value) -> Result<Self> {
        let entries: Vec<(&str, &Value)> = match value {
            Value::Null => Vec::new(),
            Value::Object(map) => map.iter().map(|(k, v)| (k.as_str(), v)).collect(),
            Value::Array(items) => items
                .iter()
                .map(|item| match item.as_array().map(Vec::as_slice) {
                    Some([Value::String(k), v]) => Ok((k.as_str(), v)),
                    _ => Err(invalid("options", "expected a list of [key, value] pairs")),
                })
                .collect::<Result<_>>()?,
            _ => return Err(invalid("options", "expected an object or a list of pairs")),
        };

        let mut options = Self::new();
        for (key, value) in entries {
            if let Some(option) = SearchOption::parse(key, value)? {
                options.push(option);
            }
        }
        Ok(options)
    }
}

impl From<Vec<SearchOption>> for SearchOptions {
    fn from(options: Vec<SearchOption>) -> Self {
        Self(options)
    }
}

impl IntoIterator for SearchOptions {
    type Item = SearchOption;
    type IntoIter = std::vec::IntoIter<SearchOption>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

fn invalid(option: &str, reason: impl Into<String>) -> CloudSearchError {
    CloudSearchError::InvalidOption {
        option: option.to_string(),
        reason: reason.into(),
    }
}

fn scalar_string(option: &str, value: &Value) -> Result<String> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(invalid(option, format!("expected a scalar, got {value}"))),
    }
}

/// Numbers are rounded, strings parsed as base-10, anything else is
/// stringified and then parsed.
fn coerce_integer(option: &str, value: &Value) -> Result<i64> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(i),
            None => n
                .as_f64()
                .map(|f| f.round() as i64)
                .ok_or_else(|| invalid(option, format!("`{n}` is out of range"))),
        },
        Value::String(s) => parse_base10(option, s),
        other => parse_base10(option, &other.to_string()),
    }
}

fn parse_base10(option: &str, s: &str) -> Result<i64> {
    s.trim()
        .parse::<i64>()
        .map_err(|_| invalid(option, format!("`{s}` is not an integer")))
}

/// Only JSON `true` is true.
fn strict_bool(value: &Value) -> bool {
    matches!(value, Value::Bool(true))
}

fn string_list(option: &str, value: &Value) -> Result<Vec<String>> {
    match value {
        Value::Array(items) => items.iter().map(|v| scalar_string(option, v)).collect(),
        other => Ok(vec![scalar_string(option, other)?]),
    }
}

/// `[["a", "b"], ["c", "d"]]` becomes `{"a": "b", "c": "d"}`.
fn pairs_to_object(items: &[Value]) -> Option<Map<String, Value>> {
    if items.is_empty() {
        return None;
    }
    items
        .iter()
        .map(|item| match item.as_array().map(Vec::as_slice) {
            Some([Value::String(k), v]) => Some((k.clone(), v.clone())),
            _ => None,
        })
        .collect()
}

/// Named entries for `facet`, `highlight` and `expr`: a bare name, a list
/// of names and/or `[name, config]` pairs, or an object of name to config.
fn named_entries<'a>(option: &str, value: &'a Value) -> Result<Vec<(String, Option<&'a Value>)>> {
    match value {
        Value::String(name) => Ok(vec![(name.clone(), None)]),
        Value::Object(map) => Ok(map.iter().map(|(k, v)| (k.clone(), Some(v))).collect()),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(name) => Ok((name.clone(), None)),
                Value::Array(pair) => match pair.as_slice() {
                    [Value::String(name)] => Ok((name.clone(), None)),
                    [Value::String(name), config] => Ok((name.clone(), Some(config))),
                    _ => Err(invalid(option, format!("malformed entry {item}"))),
                },
                Value::Object(map) if map.len() == 1 => match map.iter().next() {
                    Some((name, config)) => Ok((name.clone(), Some(config))),
                    None => Err(invalid(option, "empty entry")),
                },
                _ => Err(invalid(option, format!("malformed entry {item}"))),
            })
            .collect(),
        Value::Null => Ok(Vec::new()),
        _ => Err(invalid(option, format!("expected names, got {value}"))),
    }
}

fn expressions(option: &str, value: &Value) -> Result<Vec<(String, String)>> {
    let mut out = Vec::new();
    for (name, expr) in named_entries(option, value)? {
        let expr = match expr {
            Some(v) => scalar_string(option, v)?,
            None => String::new(),
        };
        out.push((name, expr));
    }
    Ok(out)
}

fn sub_configs(option: &str, value: &Value) -> Result<Vec<(String, SubConfig)>> {
    Ok(named_entries(option, value)?
        .into_iter()
        .map(|(name, config)| (name, SubConfig::from_json(config)))
        .collect())
}

/// Entries past `MAX_SORT_FIELDS` are dropped before they are validated.
fn sort_fields(value: &Value) -> Result<Vec<SortField>> {
    let single;
    let items: &[Value] = match value {
        Value::Array(items) => items,
        Value::Object(map) => {
            return map
                .iter()
                .take(MAX_SORT_FIELDS)
                .map(|(field, dir)| sort_pair(field, dir))
                .collect()
        }
        Value::Null => return Ok(Vec::new()),
        other => {
            single = [other.clone()];
            &single
        }
    };
    items
        .iter()
        .take(MAX_SORT_FIELDS)
        .map(|item| match item {
            Value::String(name) => Ok(SortField::parse_name(name)),
            Value::Array(pair) => match pair.as_slice() {
                [Value::String(field), dir] => sort_pair(field, dir),
                _ => Err(invalid("sort", format!("malformed entry {item}"))),
            },
            _ => Err(invalid("sort", format!("malformed entry {item}"))),
        })
        .collect()
}

fn sort_pair(field: &str, direction: &Value) -> Result<SortField> {
    let direction = match direction {
        Value::String(s) => s.parse()?,
        other => return Err(CloudSearchError::InvalidSortDirection(other.to_string())),
    };
    Ok(SortField {
        field: field.to_string(),
        direction,
    })
}
