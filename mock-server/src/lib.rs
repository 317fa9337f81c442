//! In-memory stand-in for the search service.
//!
//! # Design
//! Search and document endpoints are addressed by path only, so every
//! domain shares one document index. The config endpoint keeps the set of
//! created domains and answers the handful of actions the integration tests
//! drive; every other action gets an empty `<Action>Response` envelope.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
    time::Instant,
};

use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const API_VERSION: &str = "2013-01-01";

/// One entry of an uploaded document batch.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BatchOp {
    Add {
        id: String,
        fields: Map<String, Value>,
    },
    Delete {
        id: String,
    },
}

#[derive(Debug, Default)]
pub struct Store {
    pub domains: BTreeSet<String>,
    pub documents: BTreeMap<String, Map<String, Value>>,
}

pub type Db = Arc<RwLock<Store>>;

/// Error reply in the service's JSON shape.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "ValidationError",
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            code: "ResourceNotFound",
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        debug!(status = %self.status, code = self.code, message = %self.message, "rejecting request");
        let body = json!({"error": {"code": self.code, "message": self.message}});
        (self.status, Json(body)).into_response()
    }
}

type Pairs = Form<Vec<(String, String)>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/", get(config).post(config))
        .route("/2013-01-01/search", get(search).post(search))
        .route("/2013-01-01/suggest", get(suggest))
        .route("/2013-01-01/documents/batch", post(upload))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn status(started: Instant) -> Value {
    json!({
        "rid": Uuid::new_v4().to_string(),
        "time-ms": started.elapsed().as_millis() as u64,
    })
}

fn to_map(pairs: Vec<(String, String)>) -> BTreeMap<String, String> {
    pairs.into_iter().collect()
}

fn number(params: &BTreeMap<String, String>, key: &str, default: usize) -> Result<usize, ApiError> {
    match params.get(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| ApiError::bad_request(format!("{key} must be a non-negative integer"))),
    }
}

/// What a `q` value selects from the index.
#[derive(Debug, PartialEq)]
enum Matcher {
    All,
    Contains(String),
}

impl Matcher {
    /// Structured queries are reduced to `matchall` or their first quoted
    /// literal. Other parsers match the raw text.
    fn parse(q: &str, parser: &str) -> Self {
        let q = q.trim();
        if parser == "structured" {
            if q == "matchall" {
                return Matcher::All;
            }
            let literal = q
                .split('\'')
                .nth(1)
                .filter(|s| !s.is_empty())
                .unwrap_or(q);
            return Matcher::Contains(literal.to_lowercase());
        }
        Matcher::Contains(q.to_lowercase())
    }

    fn matches(&self, doc: &Map<String, Value>) -> bool {
        match self {
            Matcher::All => true,
            Matcher::Contains(needle) => doc
                .values()
                .flat_map(texts)
                .any(|text| text.to_lowercase().contains(needle.as_str())),
        }
    }
}

/// String forms of a field value; lists contribute each element.
fn texts(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().flat_map(texts).collect(),
        Value::String(s) => vec![s.clone()],
        Value::Null => Vec::new(),
        other => vec![other.to_string()],
    }
}

async fn search(State(db): State<Db>, Form(pairs): Pairs) -> Result<Json<Value>, ApiError> {
    let started = Instant::now();
    let params = to_map(pairs);
    let q = params
        .get("q")
        .ok_or_else(|| ApiError::bad_request("q is required"))?;
    let parser = params.get("q.parser").map(String::as_str).unwrap_or("simple");
    let matcher = Matcher::parse(q, parser);
    let size = number(&params, "size", 10)?;
    let start = number(&params, "start", 0)?;
    let returned: Option<Vec<&str>> = params
        .get("return")
        .map(|r| r.split(',').filter(|f| !f.is_empty()).collect());

    let store = db.read().await;
    let matched: Vec<_> = store
        .documents
        .iter()
        .filter(|(_, doc)| matcher.matches(doc))
        .collect();

    let hit: Vec<Value> = matched
        .iter()
        .skip(start)
        .take(size)
        .map(|(id, doc)| {
            let fields: Map<String, Value> = doc
                .iter()
                .filter(|(name, _)| returned.as_ref().map_or(true, |r| r.contains(&name.as_str())))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect();
            json!({"id": id, "fields": fields})
        })
        .collect();

    let mut facets = Map::new();
    for field in params.keys().filter_map(|k| k.strip_prefix("facet.")) {
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for (_, doc) in &matched {
            for value in doc.get(field).map(texts).unwrap_or_default() {
                *counts.entry(value).or_default() += 1;
            }
        }
        let buckets: Vec<Value> = counts
            .into_iter()
            .map(|(value, count)| json!({"value": value, "count": count}))
            .collect();
        facets.insert(field.to_string(), json!({"buckets": buckets}));
    }

    info!(?matcher, found = matched.len(), start, size, "search");
    Ok(Json(json!({
        "status": status(started),
        "hits": {"found": matched.len(), "start": start, "hit": hit},
        "facets": facets,
    })))
}

async fn suggest(State(db): State<Db>, Form(pairs): Pairs) -> Result<Json<Value>, ApiError> {
    let started = Instant::now();
    let params = to_map(pairs);
    let q = params
        .get("q")
        .ok_or_else(|| ApiError::bad_request("q is required"))?;
    if !params.contains_key("suggester") {
        return Err(ApiError::bad_request("suggester is required"));
    }
    let size = number(&params, "size", 10)?;
    let prefix = q.to_lowercase();

    let store = db.read().await;
    let matched: Vec<Value> = store
        .documents
        .iter()
        .filter_map(|(id, doc)| {
            doc.values()
                .flat_map(texts)
                .find(|text| text.to_lowercase().starts_with(&prefix))
                .map(|text| json!({"suggestion": text, "score": 0, "id": id}))
        })
        .collect();
    let found = matched.len();
    let suggestions: Vec<Value> = matched.into_iter().take(size).collect();

    Ok(Json(json!({
        "status": status(started),
        "suggest": {"query": q, "found": found, "suggestions": suggestions},
    })))
}

async fn upload(State(db): State<Db>, Json(body): Json<Value>) -> Result<Json<Value>, ApiError> {
    let ops: Vec<BatchOp> =
        serde_json::from_value(body).map_err(|e| ApiError::bad_request(e.to_string()))?;
    if ops.is_empty() {
        return Err(ApiError::bad_request("batch must contain at least one operation"));
    }

    let mut store = db.write().await;
    let (mut adds, mut deletes) = (0u64, 0u64);
    for op in ops {
        match op {
            BatchOp::Add { id, fields } => {
                store.documents.insert(id, fields);
                adds += 1;
            }
            BatchOp::Delete { id } => {
                store.documents.remove(&id);
                deletes += 1;
            }
        }
    }
    info!(adds, deletes, total = store.documents.len(), "applied batch");
    Ok(Json(json!({"status": "success", "adds": adds, "deletes": deletes})))
}

fn domain_status(name: &str, deleted: bool) -> Value {
    json!({
        "DomainId": format!("{}/{name}", Uuid::new_v4().simple()),
        "DomainName": name,
        "Created": true,
        "Deleted": deleted,
        "Processing": false,
    })
}

fn envelope(action: &str, result: Value) -> Value {
    let mut inner = Map::new();
    inner.insert(format!("{action}Result"), result);
    let mut outer = Map::new();
    outer.insert(format!("{action}Response"), Value::Object(inner));
    Value::Object(outer)
}

/// Values of `<prefix>.member.N` in member order.
fn members(params: &BTreeMap<String, String>, prefix: &str) -> Vec<String> {
    let mut indexed: Vec<(usize, String)> = params
        .iter()
        .filter_map(|(key, value)| {
            let n = key.strip_prefix(prefix)?.strip_prefix(".member.")?;
            Some((n.parse().ok()?, value.clone()))
        })
        .collect();
    indexed.sort();
    indexed.into_iter().map(|(_, v)| v).collect()
}

async fn config(State(db): State<Db>, Form(pairs): Pairs) -> Result<Json<Value>, ApiError> {
    let params = to_map(pairs);
    let action = params
        .get("Action")
        .ok_or_else(|| ApiError::bad_request("Action is required"))?
        .as_str();
    match params.get("Version").map(String::as_str) {
        Some(API_VERSION) => {}
        other => {
            return Err(ApiError::bad_request(format!("unsupported Version {other:?}")));
        }
    }
    let domain = params.get("DomainName").cloned();
    info!(action, ?domain, "config action");

    let result = match action {
        "CreateDomain" => {
            let name = domain.ok_or_else(|| ApiError::bad_request("DomainName is required"))?;
            db.write().await.domains.insert(name.clone());
            json!({"DomainStatus": domain_status(&name, false)})
        }
        "DeleteDomain" => {
            let name = domain.ok_or_else(|| ApiError::bad_request("DomainName is required"))?;
            if !db.write().await.domains.remove(&name) {
                return Err(ApiError::not_found(format!("domain {name} does not exist")));
            }
            json!({"DomainStatus": domain_status(&name, true)})
        }
        "ListDomainNames" => {
            let store = db.read().await;
            let names: Map<String, Value> = store
                .domains
                .iter()
                .map(|name| (name.clone(), json!(API_VERSION)))
                .collect();
            json!({"DomainNames": names})
        }
        "DescribeDomains" => {
            let wanted = members(&params, "DomainNames");
            let store = db.read().await;
            let list: Vec<Value> = store
                .domains
                .iter()
                .filter(|name| wanted.is_empty() || wanted.contains(name))
                .map(|name| domain_status(name, false))
                .collect();
            json!({"DomainStatusList": list})
        }
        _ => json!({}),
    };
    Ok(Json(envelope(action, result)))
}
