//! Region and domain configuration consumed by the dispatcher.
//!
//! # Example
//!
//! ```
//! use cloudsearch_core::CloudSearchConfig;
//!
//! let config = CloudSearchConfig::new("eu-west-1").with_search_domain("movies-abc123");
//! assert_eq!(config.service_domain, "amazonaws.com");
//! ```

use serde::Deserialize;

use crate::error::{CloudSearchError, Result};

/// Configuration for host resolution.
///
/// Credentials are not part of this struct; signing is the transport's job.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CloudSearchConfig {
    /// Region segment of every host (default: `us-east-1`)
    #[serde(default = "default_region")]
    pub region: String,

    /// Search domain as `<name>-<id>`, required for search and document requests
    #[serde(default)]
    pub search_domain: Option<String>,

    /// Trailing DNS suffix (default: `amazonaws.com`)
    #[serde(default = "default_service_domain")]
    pub service_domain: String,

    /// URL scheme (default: `https`)
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Base URL that replaces scheme and host, e.g. a local mock service
    #[serde(default)]
    pub endpoint: Option<String>,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_service_domain() -> String {
    "amazonaws.com".to_string()
}

fn default_scheme() -> String {
    "https".to_string()
}

impl Default for CloudSearchConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            search_domain: None,
            service_domain: default_service_domain(),
            scheme: default_scheme(),
            endpoint: None,
        }
    }
}

impl CloudSearchConfig {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            ..Default::default()
        }
    }

    pub fn with_search_domain(mut self, domain: impl Into<String>) -> Self {
        self.search_domain = Some(domain.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Build a config from `CLOUDSEARCH_*` environment variables.
    ///
    /// The region falls back to `AWS_REGION`, then to the default.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        let defaults = Self::default();
        Self {
            region: var("CLOUDSEARCH_REGION")
                .or_else(|| var("AWS_REGION"))
                .unwrap_or(defaults.region),
            search_domain: var("CLOUDSEARCH_DOMAIN"),
            service_domain: var("CLOUDSEARCH_SERVICE_DOMAIN").unwrap_or(defaults.service_domain),
            scheme: defaults.scheme,
            endpoint: var("CLOUDSEARCH_ENDPOINT"),
        }
    }

    /// Host for administrative (config) requests.
    pub fn config_host(&self) -> String {
        format!("cloudsearch.{}.{}", self.region, self.service_domain)
    }

    /// Host for search (`search`) or document (`doc`) requests.
    pub fn domain_host(&self, prefix: &str, kind: &'static str) -> Result<String> {
        let domain = self
            .search_domain
            .as_deref()
            .filter(|d| !d.is_empty())
            .ok_or(CloudSearchError::MissingSearchDomain(kind))?;
        Ok(format!(
            "{prefix}-{domain}.{}.cloudsearch.{}",
            self.region, self.service_domain
        ))
    }

    /// Base URL for `host`, honouring an endpoint override.
    pub(crate) fn base_url(&self, host: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("{}://{host}", self.scheme),
        }
    }
}
