//! Domain, document and search lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, points the endpoint override at
//! it and drives every kind of operation over real HTTP using ureq. The
//! transport is a plain function, which is all the core asks of a host.

use cloudsearch_core::{
    admin, documents, search, CloudSearchClient, CloudSearchConfig, CloudSearchError, ConfigOptions,
    DocumentInput, FieldInput, Fields, HttpMethod, HttpRequest, HttpResponse, SearchOption,
    StructuredQuery, SubConfig,
};

/// Send `req` with ureq. Non-2xx responses come back as data so the core
/// can report them.
fn ureq_transport(req: &HttpRequest, _: &CloudSearchConfig) -> Result<HttpResponse, CloudSearchError> {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let result = match req.method {
        HttpMethod::Get => {
            let mut builder = agent.get(&req.url);
            for (name, value) in &req.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            builder.call()
        }
        HttpMethod::Post => {
            let mut builder = agent.post(&req.url);
            for (name, value) in &req.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            builder.send(req.body.as_deref().unwrap_or_default().as_bytes())
        }
    };
    let mut response = result.map_err(|e| CloudSearchError::Transport(e.to_string()))?;

    let status = response.status().as_u16();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| CloudSearchError::Transport(e.to_string()))?;
    Ok(HttpResponse {
        status,
        headers: Vec::new(),
        body,
    })
}

fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn movie(title: &str, year: i64, genres: Vec<&str>) -> Fields {
    Fields::from([
        ("title".to_string(), FieldInput::from(title)),
        ("year".to_string(), FieldInput::from(year)),
        ("genres".to_string(), FieldInput::from(genres)),
    ])
}

#[test]
fn domain_and_search_lifecycle() {
    // Step 1: start mock server and point the client at it.
    let endpoint = start_server();
    let client = CloudSearchClient::new(
        CloudSearchConfig::new("us-east-1")
            .with_search_domain("movies")
            .with_endpoint(endpoint),
    );
    let none = ConfigOptions::default();

    // Step 2: create the domain.
    let created = client
        .execute(admin::create_domain("movies", &none).unwrap(), &ureq_transport)
        .unwrap();
    let status = &created["CreateDomainResponse"]["CreateDomainResult"]["DomainStatus"];
    assert_eq!(status["DomainName"], "movies");

    // Step 3: list and describe.
    let listed = client
        .execute(admin::list_domain_names(&none).unwrap(), &ureq_transport)
        .unwrap();
    assert_eq!(
        listed["ListDomainNamesResponse"]["ListDomainNamesResult"]["DomainNames"]["movies"],
        "2013-01-01"
    );
    let described = client
        .execute(
            admin::describe_domains(&ConfigOptions::names(["movies"])).unwrap(),
            &ureq_transport,
        )
        .unwrap();
    let list = &described["DescribeDomainsResponse"]["DescribeDomainsResult"]["DomainStatusList"];
    assert_eq!(list.as_array().map(Vec::len), Some(1));

    // Step 4: upload three documents.
    let batch = DocumentInput::List(vec![
        DocumentInput::pair("tt0076759", movie("Star Wars", 1977, vec!["Action", "Sci-Fi"])),
        DocumentInput::pair(
            "tt0080684",
            movie("The Empire Strikes Back", 1980, vec!["Action", "Sci-Fi"]),
        ),
        DocumentInput::pair("tt0083658", movie("Blade Runner", 1982, vec!["Sci-Fi", "Thriller"])),
    ]);
    let req = client.build(documents::add(batch).unwrap()).unwrap();
    let uploaded = client
        .parse_batch(ureq_transport(&req, client.config()).unwrap())
        .unwrap();
    assert_eq!(uploaded.status, "success");
    assert_eq!(uploaded.adds, 3);

    // Step 5: simple search with projection and a facet.
    let op = search::search(
        "star",
        vec![
            SearchOption::Return(vec!["id".to_string(), "title".to_string()]),
            SearchOption::Facet(vec![("genres".to_string(), SubConfig::Empty)]),
        ],
    );
    let req = client.build(op).unwrap();
    let found = client
        .parse_search(ureq_transport(&req, client.config()).unwrap())
        .unwrap();
    assert_eq!(found.hits.found, 1);
    assert_eq!(found.hits.hit[0].id, "tt0076759");
    assert_eq!(found.hits.hit[0].fields["title"], "Star Wars");
    assert!(!found.hits.hit[0].fields.contains_key("year"));
    let genres = &found.facets["genres"].buckets;
    assert!(genres.iter().any(|b| b.value == "Action" && b.count == 1));

    // Step 6: structured match-all, paged by page number.
    let op = search::search(
        StructuredQuery::match_all(),
        vec![SearchOption::Size(1), SearchOption::Page(3)],
    );
    let req = client.build(op).unwrap();
    let paged = client
        .parse_search(ureq_transport(&req, client.config()).unwrap())
        .unwrap();
    assert_eq!(paged.hits.found, 3);
    assert_eq!(paged.hits.start, 2);
    assert_eq!(paged.hits.hit.len(), 1);
    assert_eq!(paged.hits.hit[0].id, "tt0083658");

    // Step 7: structured term over POST.
    let op = search::search(StructuredQuery::term("title", "blade"), Vec::new()).force_post();
    let req = client.build(op).unwrap();
    assert_eq!(req.method, HttpMethod::Post);
    let term = client
        .parse_search(ureq_transport(&req, client.config()).unwrap())
        .unwrap();
    assert_eq!(term.hits.found, 1);
    assert_eq!(term.hits.hit[0].id, "tt0083658");

    // Step 8: suggest.
    let req = client
        .build(search::suggest("title_suggester", "bla", Some(5)))
        .unwrap();
    let suggested = client
        .parse_suggest(ureq_transport(&req, client.config()).unwrap())
        .unwrap();
    assert_eq!(suggested.suggest.found, 1);
    assert_eq!(suggested.suggest.suggestions[0].suggestion, "Blade Runner");

    // Step 9: remove one document; it no longer matches.
    let req = client
        .build(documents::remove(DocumentInput::id("tt0076759")).unwrap())
        .unwrap();
    let removed = client
        .parse_batch(ureq_transport(&req, client.config()).unwrap())
        .unwrap();
    assert_eq!(removed.deletes, 1);
    let gone = client
        .execute(search::search("star", Vec::new()), &ureq_transport)
        .unwrap();
    assert_eq!(gone["hits"]["found"], 0);

    // Step 10: delete the domain.
    client
        .execute(admin::delete_domain("movies", &none).unwrap(), &ureq_transport)
        .unwrap();
}

#[test]
fn service_errors_surface_as_http_errors() {
    let endpoint = start_server();
    let client = CloudSearchClient::new(CloudSearchConfig::default().with_endpoint(endpoint));

    let err = client
        .execute(
            admin::delete_domain("ghost", &ConfigOptions::default()).unwrap(),
            &ureq_transport,
        )
        .unwrap_err();
    match err {
        CloudSearchError::HttpError { status, body } => {
            assert_eq!(status, 404);
            assert!(body.contains("ResourceNotFound"), "body: {body}");
        }
        other => panic!("expected HttpError, got {other:?}"),
    }
}

#[test]
fn transport_failures_pass_through() {
    // Nothing listens on port 9 of the loopback interface.
    let client = CloudSearchClient::new(
        CloudSearchConfig::default()
            .with_search_domain("movies")
            .with_endpoint("http://127.0.0.1:9"),
    );
    let err = client
        .execute(search::search("star", Vec::new()), &ureq_transport)
        .unwrap_err();
    assert!(matches!(err, CloudSearchError::Transport(_)), "got {err:?}");
}
