//! Request builder and response router for a hosted search service.
//!
//! # Overview
//! Turns semantic requests (searches, document uploads, administrative
//! actions) into `HttpRequest` values and decodes the responses. The host
//! application supplies the `Transport` that performs the round-trip and
//! signs requests.
//!
//! # Design
//! - Three compilers produce an [`Operation`]: [`search`] (options to flat
//!   wire parameters), [`documents`] (heterogeneous inputs to an add/delete
//!   batch) and [`admin`] (table-driven config actions).
//! - [`CloudSearchClient`] is stateless apart from configuration. It routes
//!   each operation to the search, document or config host, resolves query
//!   expressions, encodes the payload and parses the reply.
//! - Errors are raised where they are detected; no partially built request
//!   is ever sent.

pub mod admin;
pub mod client;
pub mod config;
pub mod documents;
pub mod error;
pub mod http;
pub mod operation;
pub mod options;
pub mod params;
pub mod query;
pub mod search;
pub mod structured;
pub mod types;

pub use admin::{ConfigAction, ConfigOptions};
pub use client::CloudSearchClient;
pub use config::CloudSearchConfig;
pub use documents::{Batch, BatchEntry, DocumentInput, FieldInput, FieldValue, Fields, HasDocumentId};
pub use error::{CloudSearchError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use operation::{Operation, RequestKind, API_VERSION};
pub use options::{SearchOption, SearchOptions, SortDirection, SortField, SubConfig};
pub use params::{ParamValue, Params};
pub use query::{ParserMode, QueryAdapters, QueryLike};
pub use structured::StructuredQuery;
pub use types::{BatchResponse, Hit, SearchResponse, SuggestResponse};
