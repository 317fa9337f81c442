//! The operation descriptor: one pending API call, before dispatch.
//!
//! # Design
//! An `Operation` is produced by one of the compilers (search, documents,
//! admin) and consumed once by `CloudSearchClient`. Its `kind` picks the API
//! surface and never changes. The optional pre-dispatch hook is the only
//! thing allowed to rewrite it between construction and dispatch.

use std::fmt;
use std::sync::Arc;

use crate::config::CloudSearchConfig;
use crate::documents::Batch;
use crate::error::Result;
use crate::http::HttpMethod;
use crate::params::Params;

/// The only API version the host templates understand.
pub const API_VERSION: &str = "2013-01-01";

/// Which API surface an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Search,
    Document,
    Config,
}

impl RequestKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestKind::Search => "search",
            RequestKind::Document => "document",
            RequestKind::Config => "config",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Called with the operation and the client configuration right before
/// host resolution; returns the operation to dispatch.
pub type PreDispatchHook = Arc<dyn Fn(Operation, &CloudSearchConfig) -> Result<Operation> + Send + Sync>;

#[derive(Clone)]
pub struct Operation {
    pub kind: RequestKind,
    pub method: HttpMethod,
    /// Relative to the versioned prefix for search/document, `/` for config.
    pub path: String,
    pub params: Params,
    /// Document batch sent as the JSON body.
    pub data: Option<Batch>,
    pub headers: Vec<(String, String)>,
    pub hook: Option<PreDispatchHook>,
    pub api_version: String,
}

impl Operation {
    fn new(kind: RequestKind, method: HttpMethod, path: &str, params: Params) -> Self {
        Self {
            kind,
            method,
            path: path.to_string(),
            params,
            data: None,
            headers: Vec::new(),
            hook: None,
            api_version: API_VERSION.to_string(),
        }
    }

    pub fn search(path: &str, params: Params) -> Self {
        Self::new(RequestKind::Search, HttpMethod::Get, path, params)
    }

    pub fn document(batch: Batch) -> Self {
        let mut op = Self::new(RequestKind::Document, HttpMethod::Post, "/documents/batch", Params::new());
        op.data = Some(batch);
        op
    }

    pub fn config(params: Params) -> Self {
        Self::new(RequestKind::Config, HttpMethod::Get, "/", params)
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Send parameters as a form body instead of a query string.
    pub fn force_post(self) -> Self {
        self.with_method(HttpMethod::Post)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(Operation, &CloudSearchConfig) -> Result<Operation> + Send + Sync + 'static,
    {
        self.hook = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("kind", &self.kind)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("params", &self.params)
            .field("data", &self.data)
            .field("headers", &self.headers)
            .field("hook", &self.hook.is_some())
            .field("api_version", &self.api_version)
            .finish()
    }
}
