//! Response envelopes returned by the search, suggest and document
//! endpoints.
//!
//! # Design
//! Only the parts of each envelope that callers read are typed; unknown
//! members are ignored so service additions do not break decoding. Config
//! responses vary per action and are returned as `serde_json::Value`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseStatus {
    #[serde(default)]
    pub rid: Option<String>,
    #[serde(rename = "time-ms", default)]
    pub time_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub status: ResponseStatus,
    pub hits: Hits,
    #[serde(default)]
    pub facets: BTreeMap<String, FacetResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hits {
    pub found: u64,
    pub start: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    #[serde(default)]
    pub hit: Vec<Hit>,
}

/// One matching document. Field values are arrays of strings for
/// multi-valued fields and plain strings otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub id: String,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    #[serde(default)]
    pub exprs: BTreeMap<String, String>,
    #[serde(default)]
    pub highlights: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetResult {
    #[serde(default)]
    pub buckets: Vec<Bucket>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub value: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestResponse {
    #[serde(default)]
    pub status: ResponseStatus,
    pub suggest: SuggestResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestResult {
    pub query: String,
    pub found: u64,
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub suggestion: String,
    #[serde(default)]
    pub score: i64,
    pub id: String,
}

/// Result of a document batch upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub status: String,
    #[serde(default)]
    pub adds: u64,
    #[serde(default)]
    pub deletes: u64,
    #[serde(default)]
    pub warnings: Vec<BatchMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchMessage {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_response_tolerates_missing_sections() {
        let resp: SearchResponse =
            serde_json::from_str(r#"{"hits":{"found":0,"start":0}}"#).unwrap();
        assert!(resp.hits.hit.is_empty());
        assert!(resp.facets.is_empty());
        assert_eq!(resp.status, ResponseStatus::default());
    }

    #[test]
    fn search_response_reads_hits_and_facets() {
        let body = r#"{
            "status": {"rid": "abc", "time-ms": 3},
            "hits": {"found": 1, "start": 0, "hit": [
                {"id": "tt0076759", "fields": {"title": "Star Wars", "genres": ["Sci-Fi"]}}
            ]},
            "facets": {"year": {"buckets": [{"value": "1977", "count": 1}]}}
        }"#;
        let resp: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.status.time_ms, 3);
        assert_eq!(resp.hits.hit[0].id, "tt0076759");
        assert_eq!(resp.hits.hit[0].fields["title"], "Star Wars");
        assert_eq!(resp.facets["year"].buckets[0].count, 1);
    }

    #[test]
    fn batch_response_defaults_warnings() {
        let resp: BatchResponse =
            serde_json::from_str(r#"{"status":"success","adds":2,"deletes":0}"#).unwrap();
        assert_eq!(resp.adds, 2);
        assert!(resp.warnings.is_empty());
    }
}
