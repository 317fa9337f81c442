//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. The dispatcher builds an
//! `HttpRequest`, hands it to a `Transport` supplied by the host, and parses
//! the `HttpResponse` it gets back. Signing, retries and timeouts belong to
//! the transport; the core performs exactly one `send` per operation.

use std::fmt;

use crate::config::CloudSearchConfig;
use crate::error::CloudSearchError;

/// HTTP method for a request. The service only speaks GET and POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// `url` is absolute and already carries the query string for GET requests.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: body.into(),
        }
    }
}

/// Executes one request against the network on behalf of the core.
///
/// Errors are passed through to the caller unchanged. Implementations
/// should return non-2xx responses as data so the core can report them as
/// `HttpError`.
pub trait Transport {
    fn send(
        &self,
        request: &HttpRequest,
        config: &CloudSearchConfig,
    ) -> Result<HttpResponse, CloudSearchError>;
}

impl<F> Transport for F
where
    F: Fn(&HttpRequest, &CloudSearchConfig) -> Result<HttpResponse, CloudSearchError>,
{
    fn send(
        &self,
        request: &HttpRequest,
        config: &CloudSearchConfig,
    ) -> Result<HttpResponse, CloudSearchError> {
        self(request, config)
    }
}
