//! Compiles a search term and its options into wire parameters, and builds
//! search and suggest operations from them.

use serde_json::Value;

use crate::error::Result;
use crate::operation::Operation;
use crate::options::{SearchOption, SearchOptions};
use crate::params::Params;
use crate::query::QueryLike;

/// Page size used to derive `start` from `page` when `size` is absent.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Compile `term` and `options` into a flat parameter mapping.
///
/// Options are applied in order; a later option writing the same wire key
/// replaces the earlier value. Blank values are dropped. `start` beats
/// `page`; a lone `page` becomes `start = (page - 1) * size`.
pub fn compile(term: impl Into<QueryLike>, options: impl IntoIterator<Item = SearchOption>) -> Params {
    let mut params = Params::new().with("q", term.into());
    for option in options {
        option.normalize(&mut params);
    }
    params.elide_blank();
    resolve_pagination(&mut params);
    params
}

/// Like [`compile`], with the options given as JSON.
pub fn compile_json(term: impl Into<QueryLike>, options: &Value) -> Result<Params> {
    Ok(compile(term, SearchOptions::from_json(options)?))
}

fn resolve_pagination(params: &mut Params) {
    if params.contains_key("start") {
        params.remove("page");
    } else if let Some(page) = params.remove("page").and_then(|p| p.as_int()) {
        let size = params.get_int("size").unwrap_or(DEFAULT_PAGE_SIZE);
        params.insert("start", page.saturating_sub(1).saturating_mul(size));
    }
}

/// A `GET /search` operation.
pub fn search(term: impl Into<QueryLike>, options: impl IntoIterator<Item = SearchOption>) -> Operation {
    Operation::search("/search", compile(term, options))
}

/// A `GET /suggest` operation against the named suggester.
pub fn suggest(suggester: &str, query: &str, size: Option<u32>) -> Operation {
    let mut params = Params::new().with("q", query).with("suggester", suggester);
    if let Some(size) = size {
        params.insert("size", i64::from(size));
    }
    params.elide_blank();
    Operation::search("/suggest", params)
}
