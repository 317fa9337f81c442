use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::app;
use serde_json::Value;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn form_request(uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(body.to_string())
        .unwrap()
}

fn batch_request(body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri("/2013-01-01/documents/batch")
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

const MOVIES: &str = r#"[
    {"type":"add","id":"tt0076759","fields":{"title":"Star Wars","year":1977,"genres":["Action","Sci-Fi"]}},
    {"type":"add","id":"tt0080684","fields":{"title":"The Empire Strikes Back","year":1980,"genres":["Action","Sci-Fi"]}},
    {"type":"add","id":"tt0083658","fields":{"title":"Blade Runner","year":1982,"genres":["Sci-Fi","Thriller"]}}
]"#;

// --- search ---

#[tokio::test]
async fn search_empty_index() {
    let resp = app()
        .oneshot(get("/2013-01-01/search?q=star"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["hits"]["found"], 0);
    assert!(body["status"]["rid"].is_string());
}

#[tokio::test]
async fn search_without_q_returns_400() {
    let resp = app().oneshot(get("/2013-01-01/search?size=5")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], "ValidationError");
}

#[tokio::test]
async fn search_bad_size_returns_400() {
    let resp = app()
        .oneshot(get("/2013-01-01/search?q=x&size=ten"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- documents ---

#[tokio::test]
async fn upload_counts_adds_and_deletes() {
    let resp = app().oneshot(batch_request(MOVIES)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["adds"], 3);
    assert_eq!(body["deletes"], 0);
}

#[tokio::test]
async fn upload_rejects_malformed_entries() {
    let resp = app()
        .oneshot(batch_request(r#"[{"type":"add","fields":{}}]"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_rejects_empty_batch() {
    let resp = app().oneshot(batch_request("[]")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- config ---

#[tokio::test]
async fn config_without_action_returns_400() {
    let resp = app().oneshot(get("/?Version=2013-01-01")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn config_rejects_other_versions() {
    let resp = app()
        .oneshot(get("/?Action=ListDomainNames&Version=2011-02-01"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_domain_delete_returns_404() {
    let resp = app()
        .oneshot(form_request(
            "/",
            "Action=DeleteDomain&DomainName=ghost&Version=2013-01-01",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["code"], "ResourceNotFound");
}

#[tokio::test]
async fn other_actions_get_empty_envelope() {
    let resp = app()
        .oneshot(form_request(
            "/",
            "Action=IndexDocuments&DomainName=movies&Version=2013-01-01",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert!(body["IndexDocumentsResponse"]["IndexDocumentsResult"].is_object());
}

// --- full lifecycle ---

#[tokio::test]
async fn domain_and_document_lifecycle() {
    use tower::Service;

    let mut app = app().into_service();

    // create domain
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(form_request(
            "/",
            "Action=CreateDomain&DomainName=movies&Version=2013-01-01",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let status = &body["CreateDomainResponse"]["CreateDomainResult"]["DomainStatus"];
    assert_eq!(status["DomainName"], "movies");
    assert_eq!(status["Created"], true);

    // list
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/?Action=ListDomainNames&Version=2013-01-01"))
        .await
        .unwrap();
    let body = body_json(resp).await;
    let names = &body["ListDomainNamesResponse"]["ListDomainNamesResult"]["DomainNames"];
    assert_eq!(names["movies"], "2013-01-01");

    // describe by name
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(form_request(
            "/",
            "Action=DescribeDomains&DomainNames.member.1=movies&Version=2013-01-01",
        ))
        .await
        .unwrap();
    let body = body_json(resp).await;
    let list = body["DescribeDomainsResponse"]["DescribeDomainsResult"]["DomainStatusList"]
        .as_array()
        .unwrap()
        .clone();
    assert_eq!(list.len(), 1);

    // upload
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(batch_request(MOVIES))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // simple search with projection and facet
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/2013-01-01/search?q=star&return=title&facet.genres=%7B%7D"))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["hits"]["found"], 1);
    let first = &body["hits"]["hit"][0];
    assert_eq!(first["id"], "tt0076759");
    assert_eq!(first["fields"]["title"], "Star Wars");
    assert!(first["fields"].get("year").is_none());
    let buckets = body["facets"]["genres"]["buckets"].as_array().unwrap().clone();
    assert!(buckets.iter().any(|b| b["value"] == "Action" && b["count"] == 1));

    // structured matchall with paging, form-encoded
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(form_request(
            "/2013-01-01/search",
            "q=matchall&q.parser=structured&size=1&start=2",
        ))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["hits"]["found"], 3);
    assert_eq!(body["hits"]["start"], 2);
    assert_eq!(body["hits"]["hit"].as_array().unwrap().len(), 1);
    assert_eq!(body["hits"]["hit"][0]["id"], "tt0083658");

    // suggest
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/2013-01-01/suggest?q=bla&suggester=title_suggester"))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["suggest"]["found"], 1);
    assert_eq!(body["suggest"]["suggestions"][0]["suggestion"], "Blade Runner");

    // delete a document
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(batch_request(r#"[{"type":"delete","id":"tt0076759"}]"#))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["deletes"], 1);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/2013-01-01/search?q=star"))
        .await
        .unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["hits"]["found"], 0);

    // delete domain
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(form_request(
            "/",
            "Action=DeleteDomain&DomainName=movies&Version=2013-01-01",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(!body_bytes(resp).await.is_empty());
}
