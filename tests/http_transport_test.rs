use mockito::Matcher;
use tesserae_client::api::SearchApi;
use tesserae_client::config::ApiConfig;
use tesserae_client::error::AppError;
use tesserae_client::models::{
    FrequencySource, PaginationState, SearchParameters, SearchStatus, TextReference,
};
use tesserae_client::transport::HttpTransport;

fn api(server: &mockito::ServerGuard) -> SearchApi<HttpTransport> {
    let config = ApiConfig {
        base_url: format!("{}/api/", server.url()),
        timeout_secs: 5,
        ..ApiConfig::default()
    };
    SearchApi::new(HttpTransport::new(&config).unwrap())
}

/// Test stoplist query parameters, with works repeated once per id
#[tokio::test]
async fn test_stoplist_repeats_works() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/stopwords/")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("feature".into(), "lemmata".into()),
            Matcher::UrlEncoded("list_size".into(), "10".into()),
            Matcher::UrlEncoded("works".into(), "src".into()),
            Matcher::UrlEncoded("works".into(), "tgt".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"stopwords": ["et", "in", "qui"]}"#)
        .create_async()
        .await;

    let stopwords = api(&server)
        .fetch_stoplist(
            "lemmata",
            10,
            &FrequencySource::Works(vec!["src".to_string(), "tgt".to_string()]),
        )
        .await
        .unwrap()
        .value;

    assert_eq!(stopwords, vec!["et", "in", "qui"]);
    mock.assert_async().await;
}

/// Test the search id is read from the Location header
#[tokio::test]
async fn test_submission_reads_location_header() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/parallels/")
        .match_header("x-requested-with", "XMLHttpRequest")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "method": { "name": "original", "stopwords": ["et"] },
            "source": { "object_id": "src" },
        })))
        .with_status(201)
        .with_header("location", "/api/parallels/f00dcafe/")
        .create_async()
        .await;

    let submission = api(&server)
        .initiate_search(
            &TextReference::new("src"),
            &TextReference::new("tgt"),
            &SearchParameters::default(),
            &["et".to_string()],
        )
        .await
        .unwrap()
        .value;

    assert_eq!(submission.search_id, "f00dcafe");
    assert!(submission.results.is_none());
    mock.assert_async().await;
}

/// Test the search id is read from the redirected URL when there is no Location
#[tokio::test]
async fn test_submission_follows_redirect() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/parallels/")
        .with_status(303)
        .with_header("location", "/api/parallels/r42/")
        .create_async()
        .await;
    server
        .mock("GET", "/api/parallels/r42/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("{}")
        .create_async()
        .await;

    let submission = api(&server)
        .initiate_search(
            &TextReference::new("src"),
            &TextReference::new("tgt"),
            &SearchParameters::default(),
            &[],
        )
        .await
        .unwrap()
        .value;

    assert_eq!(submission.search_id, "r42");
}

/// Test status checks bypass caches
#[tokio::test]
async fn test_status_sends_no_store() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/parallels/abc/status/")
        .match_header("cache-control", "no-store")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status": "Running", "progress": [{"stage": "matching", "value": 0.4}]}"#)
        .create_async()
        .await;

    let report = api(&server).search_status("abc").await.unwrap();

    assert_eq!(report.value.status, Some(SearchStatus::Running));
    assert!(report.value.progress.is_some());
    assert_eq!(report.updates.len(), 1);
    mock.assert_async().await;
}

/// Test results pages carry the pagination query and come back normalized
#[tokio::test]
async fn test_results_page_query() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/parallels/abc")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("page_number".into(), "3".into()),
            Matcher::UrlEncoded("per_page".into(), "25".into()),
            Matcher::UrlEncoded("sort_by".into(), "target_tag".into()),
            Matcher::UrlEncoded("sort_order".into(), "descending".into()),
        ]))
        .match_header("cache-control", "no-store")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"parallels": [{"source_tag": "aeneid 1.1", "target_tag": "pharsalia 1.1", "score": 25.0, "rank": 1}], "max_score": 50.0, "total_count": 120}"#,
        )
        .create_async()
        .await;

    let mut pagination = PaginationState::new(0, 25).with_sort("target_tag");
    pagination.current_page = 3;
    let page = api(&server)
        .fetch_results("abc", &pagination)
        .await
        .unwrap()
        .value;

    assert_eq!(page.total_count, 120);
    assert_eq!(page.parallels.len(), 1);
    assert_eq!(page.parallels[0].score, 5.0);
    assert_eq!(page.parallels[0].extra["rank"], 1);
    mock.assert_async().await;
}

/// Test error statuses surface as server errors with the body text
#[tokio::test]
async fn test_error_status_is_server_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/parallels/missing/status/")
        .with_status(404)
        .with_body("Not Found")
        .create_async()
        .await;

    let err = api(&server).search_status("missing").await.unwrap_err();

    match err {
        AppError::Server { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "Not Found");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

/// Test an unreachable server is a transient transport failure
#[tokio::test]
async fn test_unreachable_server() {
    let config = ApiConfig {
        base_url: "http://127.0.0.1:1/api".to_string(),
        timeout_secs: 2,
        ..ApiConfig::default()
    };
    let api = SearchApi::new(HttpTransport::new(&config).unwrap());

    let err = api.search_status("abc").await.unwrap_err();
    assert!(err.is_transient(), "unexpected error: {:?}", err);
}
