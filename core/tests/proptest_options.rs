//! Property-based tests for option compilation and document normalization.
//!
//! Run with: `cargo test --test proptest_options`

use proptest::prelude::*;
use serde_json::Value;

use cloudsearch_core::documents::compile_add;
use cloudsearch_core::search::{compile, DEFAULT_PAGE_SIZE};
use cloudsearch_core::{DocumentInput, ParamValue, SearchOption, SearchOptions, SortField, StructuredQuery};

// =============================================================================
// Strategies
// =============================================================================

fn sort_field_strategy() -> impl Strategy<Value = SortField> {
    ("[a-z_]{1,12}", any::<bool>()).prop_map(|(field, descending)| {
        if descending {
            SortField::desc(field)
        } else {
            SortField::asc(field)
        }
    })
}

/// Arbitrary JSON, including shapes no option accepts.
fn arbitrary_json_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        any::<f64>().prop_map(|f| serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number)),
        ".*".prop_map(Value::String),
    ];

    leaf.prop_recursive(4, 64, 10, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..10).prop_map(Value::Array),
            prop::collection::hash_map(
                prop_oneof![
                    Just("size".to_string()),
                    Just("sort".to_string()),
                    Just("facet".to_string()),
                    Just("return".to_string()),
                    Just("page".to_string()),
                    Just("id".to_string()),
                    ".*".prop_map(|s: String| s),
                ],
                inner,
                0..10
            )
            .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

fn text(params: &cloudsearch_core::Params, key: &str) -> Option<String> {
    params.get(key).and_then(ParamValue::as_text).map(str::to_string)
}

// =============================================================================
// Sort
// =============================================================================

proptest! {
    /// Only the first ten sort fields are sent, in caller order.
    #[test]
    fn prop_sort_keeps_first_ten(fields in prop::collection::vec(sort_field_strategy(), 1..30)) {
        let expected: Vec<String> = fields.iter().take(10).map(ToString::to_string).collect();
        let params = compile("star", vec![SearchOption::Sort(fields)]);
        prop_assert_eq!(text(&params, "sort"), Some(expected.join(",")));
    }

    /// Entries past the tenth are never validated.
    #[test]
    fn prop_sort_ignores_invalid_tail(
        names in prop::collection::vec("[a-z]{1,8}", 10..15),
        bad in "[A-Z]{3,8}",
    ) {
        let mut items: Vec<Value> = names.iter().cloned().map(Value::String).collect();
        items.insert(10, serde_json::json!(["broken", bad]));
        let options = SearchOptions::from_json(&serde_json::json!({"sort": items}));
        prop_assert!(options.is_ok());
    }
}

// =============================================================================
// Pagination
// =============================================================================

proptest! {
    /// A lone page becomes start = (page - 1) * size.
    #[test]
    fn prop_page_derives_start(page in 1i64..10_000, size in prop::option::of(1i64..500)) {
        let mut options = vec![SearchOption::Page(page)];
        if let Some(size) = size {
            options.push(SearchOption::Size(size));
        }
        let params = compile("star", options);
        let size = size.unwrap_or(DEFAULT_PAGE_SIZE);
        prop_assert_eq!(params.get_int("start"), Some((page - 1) * size));
        prop_assert!(!params.contains_key("page"));
    }

    /// An explicit start always wins over page, whatever the order.
    #[test]
    fn prop_start_beats_page(start in 0i64..100_000, page in 1i64..1_000, start_first in any::<bool>()) {
        let options = if start_first {
            vec![SearchOption::Start(start), SearchOption::Page(page)]
        } else {
            vec![SearchOption::Page(page), SearchOption::Start(start)]
        };
        let params = compile("star", options);
        prop_assert_eq!(params.get_int("start"), Some(start));
        prop_assert!(!params.contains_key("page"));
    }

    /// The last option writing a key decides its value.
    #[test]
    fn prop_last_size_wins(sizes in prop::collection::vec(1i64..1_000, 1..10)) {
        let last = *sizes.last().unwrap();
        let params = compile("star", sizes.into_iter().map(SearchOption::Size));
        prop_assert_eq!(params.get_int("size"), Some(last));
    }
}

// =============================================================================
// Robustness
// =============================================================================

proptest! {
    /// Arbitrary option bags either parse or fail cleanly.
    #[test]
    fn fuzz_options_from_arbitrary_json(json in arbitrary_json_strategy()) {
        if let Ok(options) = SearchOptions::from_json(&json) {
            let params = compile("star", options);
            prop_assert!(params.contains_key("q"));
        }
    }

    /// Arbitrary document input either compiles or fails cleanly, and every
    /// compiled entry carries at least one field.
    #[test]
    fn fuzz_documents_from_arbitrary_json(json in arbitrary_json_strategy()) {
        if let Ok(batch) = compile_add(DocumentInput::from_json(json)) {
            prop_assert!(!batch.is_empty());
            let body = serde_json::to_value(&batch).unwrap();
            for entry in body.as_array().unwrap() {
                prop_assert_eq!(&entry["type"], "add");
                prop_assert!(entry["fields"].as_object().is_some_and(|f| !f.is_empty()));
            }
        }
    }

    /// Term literals are always quoted, whatever they contain.
    #[test]
    fn prop_term_literal_is_quoted(value in ".*") {
        let rendered = StructuredQuery::term("title", value.as_str()).to_query_string();
        prop_assert!(rendered.starts_with("(term field=title '"), "{}", rendered);
        prop_assert!(rendered.ends_with("')"), "{}", rendered);
    }
}
