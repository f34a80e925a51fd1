//! Dashboard fetch and refresh behaviour against a mocked backend.

use sauna_dashboard::dashboard::{Area, DashboardFetcher, RefreshTrigger};
use sauna_dashboard::retry::RetryPolicy;
use sauna_dashboard::{DashboardConfig, FetchError};
use serde_json::json;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn make_config(base_url: &str) -> DashboardConfig {
    let mut config = DashboardConfig::with_base_url(base_url).unwrap();
    config.retry = RetryPolicy::new(3, Duration::from_millis(10));
    config.refresh_delay = Duration::from_millis(50);
    config
}

fn dashboard_body() -> serde_json::Value {
    json!({
        "labels": {"months": ["2024-04", "2024-05"], "roomNames": ["Room1", "Room2"]},
        "metrics": {"total_members": 420, "churn_rate": 2.5},
        "utilization": {"occupancy_by_room": {"Room1": 0.82, "Room2": 0.64}}
    })
}

#[tokio::test]
async fn fetch_parses_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard-data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(dashboard_body()))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = DashboardFetcher::new(make_config(&server.uri()));
    let snapshot = fetcher.fetch().await.unwrap();

    assert_eq!(snapshot.labels.room_names, vec!["Room1", "Room2"]);
    assert_eq!(snapshot.number(Area::Metrics, "total_members"), Some(420.0));
    assert!(snapshot.area(Area::Finance).is_empty());
    assert!(!snapshot.has_no_data());
}

#[tokio::test]
async fn manual_refresh_makes_a_single_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard-data"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = DashboardFetcher::new(make_config(&server.uri()));
    let err = fetcher.refresh(RefreshTrigger::Manual).await.unwrap_err();

    assert_eq!(err, FetchError::Status(500));
}

#[tokio::test]
async fn refresh_after_upload_waits_then_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard-data"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard-data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(dashboard_body()))
        .mount(&server)
        .await;

    let config = make_config(&server.uri());
    let delay = config.refresh_delay;
    let fetcher = DashboardFetcher::new(config);

    let started = Instant::now();
    let snapshot = fetcher.refresh_after_upload().await.unwrap();

    assert!(started.elapsed() >= delay);
    assert_eq!(snapshot.labels.months.len(), 2);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard-data"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("not json", "application/json"))
        .mount(&server)
        .await;

    let fetcher = DashboardFetcher::new(make_config(&server.uri()));
    let err = fetcher.refresh(RefreshTrigger::Mount).await.unwrap_err();

    assert!(matches!(err, FetchError::Decode(_)));
}

#[tokio::test]
async fn client_errors_are_not_retried_after_upload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard-data"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = DashboardFetcher::new(make_config(&server.uri()));
    let err = fetcher.refresh(RefreshTrigger::AfterUpload).await.unwrap_err();

    assert_eq!(err, FetchError::Status(404));
}
