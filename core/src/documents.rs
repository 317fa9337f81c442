//! Document batches: adds and deletes sent in one JSON request.
//!
//! # Design
//! Callers hand over documents in whichever shape they have: a record type
//! implementing [`HasDocumentId`], a field mapping carrying an `id`, an
//! `(id, fields)` pair, a mapping of id to fields, a bare id (deletes only),
//! or a list of any of these. Every shape is flattened to `(id, fields)`
//! first; field values are then normalized: dates become ISO-8601
//! timestamps, blanks are stripped, and a time of day on its own is
//! rejected because the service has no type for it.
//!
//! Batch size limits are the caller's responsibility.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc};
use serde::Serialize;
use serde_json::{Number, Value};

use crate::error::{CloudSearchError, Result};
use crate::operation::Operation;
use crate::options::ID_FIELD;

/// A field value as supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldInput {
    Null,
    Text(String),
    Number(Number),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    /// Interpreted as UTC.
    NaiveDateTime(NaiveDateTime),
    Time(NaiveTime),
    List(Vec<FieldInput>),
    /// Anything else; sent unchanged.
    Json(Value),
}

pub type Fields = BTreeMap<String, FieldInput>;

impl From<&str> for FieldInput {
    fn from(s: &str) -> Self {
        FieldInput::Text(s.to_string())
    }
}

impl From<String> for FieldInput {
    fn from(s: String) -> Self {
        FieldInput::Text(s)
    }
}

impl From<i64> for FieldInput {
    fn from(i: i64) -> Self {
        FieldInput::Number(i.into())
    }
}

impl From<i32> for FieldInput {
    fn from(i: i32) -> Self {
        FieldInput::Number(i.into())
    }
}

impl From<f64> for FieldInput {
    fn from(f: f64) -> Self {
        Number::from_f64(f).map_or(FieldInput::Null, FieldInput::Number)
    }
}

impl From<NaiveDate> for FieldInput {
    fn from(d: NaiveDate) -> Self {
        FieldInput::Date(d)
    }
}

impl From<DateTime<Utc>> for FieldInput {
    fn from(dt: DateTime<Utc>) -> Self {
        FieldInput::DateTime(dt)
    }
}

impl From<NaiveDateTime> for FieldInput {
    fn from(dt: NaiveDateTime) -> Self {
        FieldInput::NaiveDateTime(dt)
    }
}

impl From<NaiveTime> for FieldInput {
    fn from(t: NaiveTime) -> Self {
        FieldInput::Time(t)
    }
}

impl<T: Into<FieldInput>> From<Vec<T>> for FieldInput {
    fn from(items: Vec<T>) -> Self {
        FieldInput::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FieldInput>> From<Option<T>> for FieldInput {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldInput::Null, Into::into)
    }
}

impl From<Value> for FieldInput {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldInput::Null,
            Value::String(s) => FieldInput::Text(s),
            Value::Number(n) => FieldInput::Number(n),
            Value::Array(items) => FieldInput::List(items.into_iter().map(FieldInput::from).collect()),
            other => FieldInput::Json(other),
        }
    }
}

/// A field value as sent to the service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(Number),
    TextList(Vec<String>),
    NumberList(Vec<Number>),
    Other(Value),
}

/// One entry of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BatchEntry {
    Add {
        id: String,
        fields: BTreeMap<String, FieldValue>,
    },
    Delete {
        id: String,
    },
}

impl BatchEntry {
    pub fn id(&self) -> &str {
        match self {
            BatchEntry::Add { id, .. } | BatchEntry::Delete { id } => id,
        }
    }
}

/// An ordered list of batch entries, serialized as a JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Batch(Vec<BatchEntry>);

impl Batch {
    pub fn entries(&self) -> &[BatchEntry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append another batch, e.g. to send adds and deletes together.
    pub fn extend(&mut self, other: Batch) {
        self.0.extend(other.0);
    }

    pub fn into_operation(self) -> Operation {
        Operation::document(self)
    }
}

/// A caller type that can be uploaded as a document.
pub trait HasDocumentId {
    /// `None` when this value has no usable id.
    fn document_id(&self) -> Option<String>;

    /// Every field except the id.
    fn document_fields(&self) -> Fields;
}

/// The shapes accepted by [`compile_add`] and [`compile_remove`].
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentInput {
    Record {
        type_name: &'static str,
        id: Option<String>,
        fields: Fields,
    },
    /// Fields including an `id` entry.
    Map(Fields),
    Pair(String, Fields),
    /// Id to fields.
    Keyed(BTreeMap<String, Fields>),
    Id(String),
    List(Vec<DocumentInput>),
}

impl DocumentInput {
    pub fn record<T: HasDocumentId>(record: &T) -> Self {
        DocumentInput::Record {
            type_name: std::any::type_name::<T>(),
            id: record.document_id(),
            fields: record.document_fields(),
        }
    }

    pub fn records<'a, T: HasDocumentId + 'a>(records: impl IntoIterator<Item = &'a T>) -> Self {
        DocumentInput::List(records.into_iter().map(Self::record).collect())
    }

    pub fn pair(id: impl ToString, fields: Fields) -> Self {
        DocumentInput::Pair(id.to_string(), fields)
    }

    pub fn id(id: impl ToString) -> Self {
        DocumentInput::Id(id.to_string())
    }

    pub fn ids<I: ToString>(ids: impl IntoIterator<Item = I>) -> Self {
        DocumentInput::List(ids.into_iter().map(Self::id).collect())
    }

    /// Interpret loosely shaped JSON: an object is a field mapping, a
    /// scalar is a bare id, and an array is a list. The one exception is
    /// `[id, {fields}]` where the object has no `id` of its own, which is a
    /// pair; with an `id` it is a bare id followed by a mapping.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => DocumentInput::Map(
                map.into_iter().map(|(k, v)| (k, FieldInput::from(v))).collect(),
            ),
            Value::String(id) => DocumentInput::Id(id),
            Value::Number(n) => DocumentInput::Id(n.to_string()),
            Value::Array(items) => match <[Value; 2]>::try_from(items) {
                Ok([id @ (Value::String(_) | Value::Number(_)), Value::Object(fields)])
                    if !fields.contains_key(ID_FIELD) =>
                {
                    let id = match id {
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    DocumentInput::Pair(id, fields.into_iter().map(|(k, v)| (k, FieldInput::from(v))).collect())
                }
                Ok(pair) => DocumentInput::List(pair.into_iter().map(Self::from_json).collect()),
                Err(items) => DocumentInput::List(items.into_iter().map(Self::from_json).collect()),
            },
            Value::Null => DocumentInput::List(Vec::new()),
            Value::Bool(_) => DocumentInput::Map(Fields::new()),
        }
    }
}

impl From<Fields> for DocumentInput {
    fn from(fields: Fields) -> Self {
        DocumentInput::Map(fields)
    }
}

impl From<Vec<DocumentInput>> for DocumentInput {
    fn from(items: Vec<DocumentInput>) -> Self {
        DocumentInput::List(items)
    }
}

/// Normalize `input` into a batch of add entries.
pub fn compile_add(input: DocumentInput) -> Result<Batch> {
    let mut entries = Vec::new();
    for (id, fields) in flatten(input)? {
        let mut normalized = BTreeMap::new();
        for (name, value) in fields {
            if let Some(value) = normalize_value(&name, value)? {
                normalized.insert(name, value);
            }
        }
        if normalized.is_empty() {
            return Err(CloudSearchError::EmptyFields { id });
        }
        entries.push(BatchEntry::Add { id, fields: normalized });
    }
    Ok(Batch(entries))
}

/// Normalize `input` into a batch of delete entries.
pub fn compile_remove(input: DocumentInput) -> Result<Batch> {
    let entries = flatten(input)?
        .into_iter()
        .map(|(id, _)| BatchEntry::Delete { id })
        .collect();
    Ok(Batch(entries))
}

/// A document operation adding `input`.
pub fn add(input: impl Into<DocumentInput>) -> Result<Operation> {
    Ok(compile_add(input.into())?.into_operation())
}

/// A document operation deleting `input`.
pub fn remove(input: impl Into<DocumentInput>) -> Result<Operation> {
    Ok(compile_remove(input.into())?.into_operation())
}

fn flatten(input: DocumentInput) -> Result<Vec<(String, Fields)>> {
    let mut out = Vec::new();
    flatten_into(input, &mut out)?;
    if out.is_empty() {
        return Err(CloudSearchError::EmptyBatch);
    }
    Ok(out)
}

fn flatten_into(input: DocumentInput, out: &mut Vec<(String, Fields)>) -> Result<()> {
    match input {
        DocumentInput::Record { type_name, id, fields } => {
            let id = id
                .filter(|id| !id.is_empty())
                .ok_or_else(|| CloudSearchError::MissingDocumentId(format!("record of type `{type_name}`")))?;
            out.push((id, fields));
        }
        DocumentInput::Map(mut fields) => {
            let id = fields.remove(ID_FIELD).as_ref().and_then(input_id).ok_or_else(|| {
                CloudSearchError::MissingDocumentId(format!(
                    "mapping with fields [{}]",
                    fields.keys().cloned().collect::<Vec<_>>().join(", ")
                ))
            })?;
            out.push((id, fields));
        }
        DocumentInput::Pair(id, fields) => out.push((id, fields)),
        DocumentInput::Keyed(map) => out.extend(map),
        DocumentInput::Id(id) => out.push((id, Fields::new())),
        DocumentInput::List(items) => {
            for item in items {
                flatten_into(item, out)?;
            }
        }
    }
    Ok(())
}

fn input_id(value: &FieldInput) -> Option<String> {
    match value {
        FieldInput::Text(s) if !s.is_empty() => Some(s.clone()),
        FieldInput::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Dates become midnight-UTC timestamps, timestamps become ISO-8601 text,
/// blanks become `None`.
pub fn normalize_value(field: &str, value: FieldInput) -> Result<Option<FieldValue>> {
    let value = match value {
        FieldInput::Null => return Ok(None),
        FieldInput::Text(s) if s.is_empty() => return Ok(None),
        FieldInput::Text(s) => FieldValue::Text(s),
        FieldInput::Number(n) => FieldValue::Number(n),
        FieldInput::Date(d) => FieldValue::Text(format!("{}T00:00:00Z", d.format("%Y-%m-%d"))),
        FieldInput::DateTime(dt) => FieldValue::Text(iso8601(dt)),
        FieldInput::NaiveDateTime(dt) => FieldValue::Text(iso8601(Utc.from_utc_datetime(&dt))),
        FieldInput::Time(t) => {
            return Err(CloudSearchError::UnsupportedFieldValue {
                field: field.to_string(),
                reason: format!("time of day `{t}` has no date"),
            })
        }
        FieldInput::List(items) => return normalize_list(field, items),
        FieldInput::Json(Value::String(s)) if s.is_empty() => return Ok(None),
        FieldInput::Json(v) => FieldValue::Other(v),
    };
    Ok(Some(value))
}

fn normalize_list(field: &str, items: Vec<FieldInput>) -> Result<Option<FieldValue>> {
    let mut values = Vec::with_capacity(items.len());
    for item in items {
        if let Some(v) = normalize_value(field, item)? {
            values.push(v);
        }
    }
    if values.is_empty() {
        return Ok(None);
    }
    if values.iter().all(|v| matches!(v, FieldValue::Text(_))) {
        let texts = values
            .into_iter()
            .filter_map(|v| match v {
                FieldValue::Text(s) => Some(s),
                _ => None,
            })
            .collect();
        return Ok(Some(FieldValue::TextList(texts)));
    }
    if values.iter().all(|v| matches!(v, FieldValue::Number(_))) {
        let numbers = values
            .into_iter()
            .filter_map(|v| match v {
                FieldValue::Number(n) => Some(n),
                _ => None,
            })
            .collect();
        return Ok(Some(FieldValue::NumberList(numbers)));
    }
    let mixed = values
        .into_iter()
        .map(|v| {
            serde_json::to_value(v).map_err(|e| CloudSearchError::Serialization(format!("{field}: {e}")))
        })
        .collect::<Result<_>>()?;
    Ok(Some(FieldValue::Other(Value::Array(mixed))))
}

fn iso8601(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
