//! Integration tests for DataLabClient using wiremock

use blogmate::error::FetchError;
use blogmate::fetcher::{DataLabClient, TrendFetcher};
use blogmate::models::TrendDirection;
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEARCH_PATH: &str = "/v1/datalab/search";

fn keywords(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Fourteen days: a week at `previous`, then a week at `recent`
fn series_json(title: &str, previous: f64, recent: f64) -> Value {
    let data: Vec<Value> = (1..=14)
        .map(|day| {
            let ratio = if day <= 7 { previous } else { recent };
            json!({"period": format!("2024-12-{day:02}"), "ratio": ratio})
        })
        .collect();
    json!({"title": title, "keywords": [title], "data": data})
}

fn client(server: &MockServer) -> DataLabClient {
    DataLabClient::with_base_url(&server.uri(), "test-id", "test-secret")
        .unwrap()
        .with_retry_delay(Duration::from_millis(10))
}

/// Test successful fetch with per-keyword outcomes
#[tokio::test]
async fn test_fetch_success() {
    let mock_server = MockServer::start().await;
    let body = json!({
        "startDate": "2024-12-01",
        "endDate": "2024-12-14",
        "timeUnit": "date",
        "results": [
            series_json("롱패딩 추천", 40.0, 80.0),
            {"title": "롱패딩 세탁", "keywords": ["롱패딩 세탁"], "data": []}
        ]
    });

    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let outcome = client(&mock_server)
        .fetch(&keywords(&["롱패딩 추천", "롱패딩 세탁", "롱패딩 가격"]))
        .await
        .unwrap();

    assert_eq!(outcome.len(), 3);

    let series = outcome["롱패딩 추천"].as_ref().unwrap();
    assert_eq!(series.points().len(), 14);
    assert!((series.momentum() - 100.0).abs() < 1e-9);
    assert_eq!(series.direction(), TrendDirection::Rising);

    assert!(matches!(outcome["롱패딩 세탁"], Err(FetchError::NoData(_))));
    assert!(matches!(outcome["롱패딩 가격"], Err(FetchError::NoData(_))));
}

/// Test credentials and request body shape
#[tokio::test]
async fn test_request_headers_and_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .and(header("X-Naver-Client-Id", "test-id"))
        .and(header("X-Naver-Client-Secret", "test-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    client(&mock_server)
        .fetch(&keywords(&["a", "b"]))
        .await
        .unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();

    assert_eq!(body["timeUnit"], "date");
    assert!(body["startDate"].is_string());
    assert!(body["endDate"].is_string());
    let groups = body["keywordGroups"].as_array().unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[1]["groupName"], "b");
    assert_eq!(groups[1]["keywords"], json!(["b"]));
}

/// Test that server errors trigger retries
#[tokio::test]
async fn test_server_error_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"results": [series_json("캠핑", 50.0, 50.0)]})),
        )
        .mount(&mock_server)
        .await;

    let outcome = client(&mock_server).fetch(&keywords(&["캠핑"])).await.unwrap();

    let series = outcome["캠핑"].as_ref().unwrap();
    assert_eq!(series.direction(), TrendDirection::Stable);
}

/// Test rate limiting responses are retried
#[tokio::test]
async fn test_rate_limit_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .mount(&mock_server)
        .await;

    let outcome = client(&mock_server).fetch(&keywords(&["캠핑"])).await.unwrap();
    assert!(matches!(outcome["캠핑"], Err(FetchError::NoData(_))));
}

/// Test rejected credentials do not retry
#[tokio::test]
async fn test_unauthorized_no_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = client(&mock_server).fetch(&keywords(&["캠핑"])).await;
    assert!(matches!(result, Err(FetchError::ClientError(401))));
}

/// Test max retries exceeded
#[tokio::test]
async fn test_max_retries_exceeded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let result = client(&mock_server)
        .with_max_retries(2)
        .fetch(&keywords(&["캠핑"]))
        .await;

    assert!(matches!(result, Err(FetchError::MaxRetriesExceeded)));
}

/// Test malformed JSON is reported, not retried
#[tokio::test]
async fn test_invalid_response_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = client(&mock_server).fetch(&keywords(&["캠핑"])).await;
    assert!(matches!(result, Err(FetchError::InvalidResponse(_))));
}

/// Test oversized requests never reach the server
#[tokio::test]
async fn test_more_than_five_keywords_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let result = client(&mock_server)
        .fetch(&keywords(&["a", "b", "c", "d", "e", "f"]))
        .await;

    assert!(matches!(result, Err(FetchError::TooManyKeywords(6))));
}
