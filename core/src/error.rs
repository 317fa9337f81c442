//! Error types for the search-service client core.
//!
//! # Design
//! Every error is raised at the point it is detected and aborts the
//! operation being built; nothing here is downgraded to a default. Input
//! shape problems (bad options, malformed documents, unknown query types)
//! are reported before any request exists. Configuration problems are
//! reported before host resolution finishes. Transport failures come back
//! from the host's `Transport` untouched.

use thiserror::Error;

/// Errors returned while compiling, dispatching or decoding an operation.
#[derive(Debug, Error)]
pub enum CloudSearchError {
    /// An option value could not be coerced to the shape its key requires.
    #[error("invalid value for option `{option}`: {reason}")]
    InvalidOption { option: String, reason: String },

    /// A sort entry named a direction other than ascending/descending.
    #[error("invalid sort direction `{0}` (expected `asc` or `desc`)")]
    InvalidSortDirection(String),

    /// A record or mapping had no identifiable `id`.
    #[error("document has no id: {0}")]
    MissingDocumentId(String),

    /// An add entry had no fields left after blank values were stripped.
    #[error("document `{id}` has no fields to add")]
    EmptyFields { id: String },

    /// Add/remove was called with an empty collection.
    #[error("at least one document is required")]
    EmptyBatch,

    /// A field value that the service cannot store.
    #[error("unsupported value for field `{field}`: {reason}")]
    UnsupportedFieldValue { field: String, reason: String },

    /// A query-like value whose type has no registered adapter.
    #[error("unsupported query type: {0}")]
    UnsupportedQueryType(String),

    /// A search or document request was built without a search domain.
    #[error("no search domain configured for {0} requests")]
    MissingSearchDomain(&'static str),

    /// Only one API version is understood by the host templates.
    #[error("unsupported API version `{0}` (only 2013-01-01 is supported)")]
    UnsupportedApiVersion(String),

    /// The configured endpoint or the resolved URL did not parse.
    #[error("invalid endpoint `{url}`: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    /// The transport collaborator failed before a response was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// A JSON-tagged parameter or a batch could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body was not valid JSON for the expected shape.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

pub type Result<T, E = CloudSearchError> = std::result::Result<T, E>;
