//! Dispatcher: turns an `Operation` into an `HttpRequest` and decodes the
//! response.
//!
//! # Design
//! `CloudSearchClient` holds only configuration and the query adapters; it
//! keeps no state between calls. `build` runs the pre-dispatch hook,
//! resolves host and path, finalizes `q`/`fq` for search requests and
//! encodes the payload. `parse` decodes a response. `execute` runs both
//! around a single call to the host's `Transport`, so a host that prefers to
//! do its own IO can call `build` and `parse` directly.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, trace};
use url::{form_urlencoded, Url};

use crate::config::CloudSearchConfig;
use crate::error::{CloudSearchError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::operation::{Operation, RequestKind, API_VERSION};
use crate::params::{ParamValue, Params};
use crate::query::QueryAdapters;
use crate::types::{BatchResponse, SearchResponse, SuggestResponse};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone)]
pub struct CloudSearchClient {
    config: CloudSearchConfig,
    adapters: QueryAdapters,
}

impl CloudSearchClient {
    pub fn new(config: CloudSearchConfig) -> Self {
        Self {
            config,
            adapters: QueryAdapters::default(),
        }
    }

    pub fn with_adapters(mut self, adapters: QueryAdapters) -> Self {
        self.adapters = adapters;
        self
    }

    pub fn config(&self) -> &CloudSearchConfig {
        &self.config
    }

    pub fn adapters_mut(&mut self) -> &mut QueryAdapters {
        &mut self.adapters
    }

    /// Build the HTTP request for `op`. Fails before producing anything if
    /// the hook, host resolution, query finalization or encoding fails.
    #[instrument(skip_all, fields(kind = %op.kind, path = %op.path))]
    pub fn build(&self, op: Operation) -> Result<HttpRequest> {
        let mut op = match op.hook.clone() {
            Some(hook) => hook(op, &self.config)?,
            None => op,
        };
        let (host, path) = self.resolve(&op)?;
        debug!(%host, %path, method = %op.method, "resolved endpoint");

        if op.kind == RequestKind::Search {
            self.finalize_query(&mut op.params)?;
        }
        trace!(params = ?op.params, "encoding parameters");

        let raw_url = format!("{}{path}", self.config.base_url(&host));
        let mut url = Url::parse(&raw_url).map_err(|e| CloudSearchError::InvalidEndpoint {
            url: raw_url.clone(),
            reason: e.to_string(),
        })?;

        let mut headers = Vec::new();
        let body = match (op.kind, op.method) {
            (RequestKind::Document, _) => {
                let batch = op.data.as_ref().ok_or(CloudSearchError::EmptyBatch)?;
                headers.push(("content-type".to_string(), JSON_CONTENT_TYPE.to_string()));
                let body = serde_json::to_string(batch).map_err(|e| CloudSearchError::Serialization(e.to_string()))?;
                op.method = HttpMethod::Post;
                Some(body)
            }
            (_, HttpMethod::Post) => {
                headers.push(("content-type".to_string(), FORM_CONTENT_TYPE.to_string()));
                let pairs = op.params.encode()?;
                Some(form_urlencoded::Serializer::new(String::new()).extend_pairs(pairs).finish())
            }
            (_, HttpMethod::Get) => {
                let pairs = op.params.encode()?;
                if !pairs.is_empty() {
                    url.query_pairs_mut().extend_pairs(pairs);
                }
                None
            }
        };
        headers.extend(op.headers);
        debug!(method = %op.method, has_body = body.is_some(), "built request");

        Ok(HttpRequest {
            method: op.method,
            url: url.into(),
            headers,
            body,
        })
    }

    /// Decode a response envelope. An empty body decodes to `Value::Null`.
    pub fn parse(&self, response: HttpResponse) -> Result<Value> {
        check_status(&response)?;
        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&response.body).map_err(|e| CloudSearchError::Deserialization(e.to_string()))
    }

    pub fn parse_search(&self, response: HttpResponse) -> Result<SearchResponse> {
        self.parse_as(response)
    }

    pub fn parse_suggest(&self, response: HttpResponse) -> Result<SuggestResponse> {
        self.parse_as(response)
    }

    pub fn parse_batch(&self, response: HttpResponse) -> Result<BatchResponse> {
        self.parse_as(response)
    }

    fn parse_as<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T> {
        let value = self.parse(response)?;
        serde_json::from_value(value).map_err(|e| CloudSearchError::Deserialization(e.to_string()))
    }

    /// Build, send through `transport` once, and decode.
    #[instrument(skip_all, fields(kind = %op.kind))]
    pub fn execute<T: Transport + ?Sized>(&self, op: Operation, transport: &T) -> Result<Value> {
        let request = self.build(op)?;
        let response = transport.send(&request, &self.config)?;
        debug!(status = response.status, bytes = response.body.len(), "received response");
        self.parse(response)
    }

    /// Host and full path for `op`. The API version is checked first.
    fn resolve(&self, op: &Operation) -> Result<(String, String)> {
        if op.api_version != API_VERSION {
            return Err(CloudSearchError::UnsupportedApiVersion(op.api_version.clone()));
        }
        match op.kind {
            RequestKind::Config => Ok((self.config.config_host(), "/".to_string())),
            RequestKind::Search => {
                let host = self.config.domain_host("search", "search")?;
                Ok((host, versioned_path(&op.api_version, &op.path)))
            }
            RequestKind::Document => {
                let host = self.config.domain_host("doc", "document")?;
                Ok((host, versioned_path(&op.api_version, &op.path)))
            }
        }
    }

    /// Resolve query-like `q` and `fq` values. A mode forced by `q`'s
    /// adapter overwrites `q.parser`.
    fn finalize_query(&self, params: &mut Params) -> Result<()> {
        let mut forced = None;
        for (key, value) in params.iter_mut() {
            let ParamValue::Query(query) = value else {
                continue;
            };
            let (rendered, mode) = self.adapters.parse(Some(&*query))?;
            if key == "q" {
                forced = mode;
            }
            *value = ParamValue::Text(rendered.unwrap_or_default());
        }
        if let Some(mode) = forced {
            params.insert("q.parser", mode.as_str());
        }
        Ok(())
    }
}

fn versioned_path(version: &str, path: &str) -> String {
    format!("/{version}/{}", path.trim_start_matches('/'))
}

fn check_status(response: &HttpResponse) -> Result<()> {
    if (200..300).contains(&response.status) {
        return Ok(());
    }
    Err(CloudSearchError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}
