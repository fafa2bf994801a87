use std::time::Duration;

use ilhealth_api::{Client, Error, Fetch, RequestSpec};
use serde_json::json;
use wiremock::matchers::{headers, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn get_records_success() {
    let mock_server = MockServer::start().await;
    let body = json!([
        {"hospital": "A", "score": 8.2},
        {"hospital": "B", "score": 7.9}
    ]);

    Mock::given(method("GET"))
        .and(path("/serviceQuality/hospitalScores"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&mock_server)
        .await;

    let client = Client::with_base_url(&mock_server.uri()).unwrap();
    let result = client
        .get_json(&RequestSpec::from_path("serviceQuality/hospitalScores"))
        .await;
    assert_eq!(result.unwrap(), body);
}

#[tokio::test]
async fn base_path_is_preserved() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/content/dashboard/beaches"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"cards": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Client::with_base_url(&format!("{}/api", mock_server.uri())).unwrap();
    let result = client
        .fetch(&RequestSpec::from_path("content/dashboard/beaches"))
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn query_pairs_and_accept_header_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/beaches/waterQuality"))
        .and(query_param("year", "2024"))
        .and(headers("accept", vec!["application/json", "text/plain", "*/*"]))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Client::with_base_url(&mock_server.uri()).unwrap();
    let request = RequestSpec::from_path("beaches/waterQuality").with_query_pair("year", "2024");
    let result = client.get_json(&request).await;
    assert_eq!(result.unwrap(), json!([]));
}

#[tokio::test]
async fn server_error_reports_status_and_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/beaches/waterQuality"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&mock_server)
        .await;

    let client = Client::with_base_url(&mock_server.uri()).unwrap();
    let err = client
        .get_json(&RequestSpec::from_path("beaches/waterQuality"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        Error::HttpStatus {
            status: 503,
            body: "Service Unavailable".to_string()
        }
    );
    assert!(err.is_retryable());
}

#[tokio::test]
async fn not_found_is_not_retryable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&mock_server)
        .await;

    let client = Client::with_base_url(&mock_server.uri()).unwrap();
    let err = client
        .get_json(&RequestSpec::from_path("nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn malformed_json_is_decode_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/childCheckup/checkupRates"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not valid json}"))
        .mount(&mock_server)
        .await;

    let client = Client::with_base_url(&mock_server.uri()).unwrap();
    let err = client
        .get_json(&RequestSpec::from_path("childCheckup/checkupRates"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let client =
        Client::with_timeout(&mock_server.uri(), Duration::from_millis(100)).unwrap();
    let err = client
        .get_json(&RequestSpec::from_path("beaches/waterQuality"))
        .await
        .unwrap_err();
    assert_eq!(err, Error::Timeout);
}

#[tokio::test]
async fn refused_connection_is_connection_error() {
    // Nothing listens on port 1.
    let client = Client::with_base_url("http://127.0.0.1:1").unwrap();
    let err = client
        .get_json(&RequestSpec::from_path("beaches"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Connection(_)));
    assert!(err.is_retryable());
}
