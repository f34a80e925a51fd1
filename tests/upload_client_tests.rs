//! Upload client behaviour against a mocked ingestion backend.

use sauna_dashboard::retry::RetryPolicy;
use sauna_dashboard::upload::{
    upload_with_fallback, DataType, UploadBatch, UploadClient, UploadFile, UploadMode,
    UploadOutcome, UploadPath,
};
use sauna_dashboard::{DashboardConfig, UploadError};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn make_config(base_url: &str) -> DashboardConfig {
    let mut config = DashboardConfig::with_base_url(base_url).unwrap();
    config.retry = RetryPolicy::new(3, Duration::from_millis(10));
    config.request_timeout = Duration::from_secs(5);
    config
}

fn csv(name: &str) -> UploadFile {
    UploadFile::new(name, b"date,room,occupancy_rate\n2024-01-01,Room1,0.8\n".to_vec())
}

fn batch(names: &[&str], data_type: DataType) -> UploadBatch {
    UploadBatch::new(names.iter().map(|n| csv(n)).collect(), data_type).unwrap()
}

async fn bodies(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| String::from_utf8_lossy(&r.body).to_string())
        .collect()
}

// ─── Primary path ───────────────────────────────────────────────────────

#[tokio::test]
async fn single_upload_reports_file_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload-csv"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"filename": "utilization_2024.csv", "rows": 120})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = UploadClient::new(make_config(&server.uri()));
    let outcome = client
        .submit(&batch(&["utilization_2024.csv"], DataType::Utilization), UploadMode::Auto)
        .await
        .unwrap();

    match &outcome {
        UploadOutcome::Single { file_name, response } => {
            assert_eq!(file_name, "utilization_2024.csv");
            assert_eq!(response["rows"], json!(120));
        }
        other => panic!("expected single outcome, got {:?}", other),
    }
    assert!(outcome.summary_message().contains("utilization_2024.csv"));

    let sent = bodies(&server).await;
    assert!(sent[0].contains("name=\"file\"; filename=\"utilization_2024.csv\""));
    assert!(sent[0].contains("name=\"data_type\""));
    assert!(sent[0].contains("utilization"));
}

#[tokio::test]
async fn multiple_upload_aggregates_counts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload-multiple-csv"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 3,
            "success": 2,
            "errors": 1,
            "error_details": [{"filename": "finance_q2.csv", "detail": "missing column: costs"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = UploadClient::new(make_config(&server.uri()));
    let files = batch(
        &["finance_q1.csv", "finance_q2.csv", "finance_q3.csv"],
        DataType::Finance,
    );
    let outcome = client.submit(&files, UploadMode::Auto).await.unwrap();

    let UploadOutcome::Batch(summary) = &outcome else {
        panic!("expected batch outcome");
    };
    assert_eq!(summary.total, 3);
    assert_eq!(summary.success, 2);
    assert_eq!(summary.success + summary.errors, summary.total);
    assert_eq!(
        outcome.summary_message(),
        "2 of 3 files uploaded successfully\n1 files failed"
    );
    assert!(outcome
        .error_message()
        .unwrap()
        .contains("finance_q2.csv: missing column: costs"));

    let sent = bodies(&server).await;
    assert_eq!(sent[0].matches("name=\"files\"").count(), 3);
}

#[tokio::test]
async fn single_mode_sends_one_request_per_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload-csv"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "empty file"})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/upload-csv"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"filename": "b.csv"})))
        .mount(&server)
        .await;

    let client = UploadClient::new(make_config(&server.uri()));
    let outcome = client
        .submit(&batch(&["a.csv", "b.csv"], DataType::Members), UploadMode::Single)
        .await
        .unwrap();

    let UploadOutcome::Batch(summary) = outcome else {
        panic!("expected batch outcome");
    };
    assert_eq!((summary.total, summary.success, summary.errors), (2, 1, 1));
    assert_eq!(summary.error_details[0].filename, "a.csv");
    assert_eq!(bodies(&server).await.len(), 2);
}

// ─── Error taxonomy ─────────────────────────────────────────────────────

#[tokio::test]
async fn client_error_detail_is_surfaced_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload-csv"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"detail": "Unknown data type: weather"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = UploadClient::new(make_config(&server.uri()));
    let err = client
        .submit(&batch(&["a.csv"], DataType::Auto), UploadMode::Auto)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        UploadError::Http {
            status: 400,
            detail: "Unknown data type: weather".to_string()
        }
    );
}

#[tokio::test]
async fn non_json_success_is_a_protocol_violation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload-csv"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html>ok</html>", "text/html"))
        .expect(3)
        .mount(&server)
        .await;

    let client = UploadClient::new(make_config(&server.uri()));
    let err = client
        .submit(&batch(&["a.csv"], DataType::Sales), UploadMode::Auto)
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Protocol(ref ct) if ct.starts_with("text/html")));
}

#[tokio::test]
async fn raw_server_error_text_becomes_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload-csv"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let client = UploadClient::new(make_config(&server.uri()));
    let err = client
        .submit(&batch(&["a.csv"], DataType::Sales), UploadMode::Auto)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        UploadError::Http {
            status: 502,
            detail: "Bad Gateway".to_string()
        }
    );
    assert_eq!(bodies(&server).await.len(), 3);
}

#[tokio::test]
async fn connection_failure_is_a_transport_error() {
    let client = UploadClient::new(make_config("http://127.0.0.1:9"));
    let err = client
        .submit(&batch(&["a.csv"], DataType::Auto), UploadMode::Auto)
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Transport(_)));
    assert!(err.offers_fallback());
}

// ─── Retry policy ───────────────────────────────────────────────────────

#[tokio::test]
async fn succeeds_on_third_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload-csv"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"detail": "busy"})))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/upload-csv"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"filename": "a.csv"})))
        .mount(&server)
        .await;

    let client = UploadClient::new(make_config(&server.uri()));
    let outcome = client
        .submit(&batch(&["a.csv"], DataType::Occupancy), UploadMode::Auto)
        .await
        .unwrap();

    assert_eq!(outcome.total(), 1);
    let sent = bodies(&server).await;
    assert_eq!(sent.len(), 3);
    // Every attempt carries the same payload.
    assert!(sent.iter().all(|b| b.contains("occupancy") && b.contains("filename=\"a.csv\"")));
}

// ─── Validation ─────────────────────────────────────────────────────────

#[tokio::test]
async fn non_csv_never_reaches_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = UploadBatch::new(
        vec![csv("a.csv"), UploadFile::new("photo.png", vec![0u8; 4])],
        DataType::Auto,
    );
    assert_eq!(result.unwrap_err(), UploadError::NotCsv("photo.png".to_string()));
    assert!(bodies(&server).await.is_empty());
}

// ─── Fallback ───────────────────────────────────────────────────────────

#[tokio::test]
async fn exhausted_retries_offer_fallback_without_forcing_it() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload-csv"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/simple-upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(0)
        .mount(&server)
        .await;

    let client = UploadClient::new(make_config(&server.uri()));
    let mut offered = Vec::new();
    let mut decline = |e: &UploadError| {
        offered.push(e.clone());
        false
    };

    let err = upload_with_fallback(
        &client,
        &batch(&["a.csv"], DataType::Members),
        UploadMode::Auto,
        &mut decline,
    )
    .await
    .unwrap_err();

    let expected = UploadError::Http {
        status: 500,
        detail: "Internal Server Error".to_string(),
    };
    assert_eq!(err, expected);
    assert_eq!(offered, vec![expected]);
}

#[tokio::test]
async fn accepted_fallback_uses_simple_endpoint_without_data_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload-multiple-csv"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/simple-upload-multiple"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 2})))
        .expect(1)
        .mount(&server)
        .await;

    let client = UploadClient::new(make_config(&server.uri()));
    let mut accept = |_: &UploadError| true;
    let report = upload_with_fallback(
        &client,
        &batch(&["a.csv", "b.csv"], DataType::Finance),
        UploadMode::Auto,
        &mut accept,
    )
    .await
    .unwrap();

    assert_eq!(report.path, UploadPath::Simple);
    assert!(report.summary_message().starts_with("Simple mode: 2 of 2 files"));

    let requests = server.received_requests().await.unwrap();
    let simple = requests
        .iter()
        .find(|r| r.url.path() == "/api/simple-upload-multiple")
        .unwrap();
    let body = String::from_utf8_lossy(&simple.body);
    assert!(!body.contains("data_type"));
    assert_eq!(body.matches("name=\"files\"").count(), 2);
}

#[tokio::test]
async fn server_rejections_still_ask_for_consent() {
    assert!(!UploadError::NotCsv("x.txt".to_string()).offers_fallback());

    // Only client-side validation skips the prompt.
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload-csv"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({"detail": "bad"})))
        .mount(&server)
        .await;
    let client_4xx = UploadClient::new(make_config(&server.uri()));
    let mut asked = 0;
    let mut count = |_: &UploadError| {
        asked += 1;
        false
    };
    let _ = upload_with_fallback(
        &client_4xx,
        &batch(&["a.csv"], DataType::Auto),
        UploadMode::Auto,
        &mut count,
    )
    .await;
    assert_eq!(asked, 1);
}

// ─── Probe ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn probe_failure_does_not_block_upload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/test-upload"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/upload-csv"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"filename": "a.csv"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = make_config(&server.uri());
    config.probe_before_upload = true;
    let client = UploadClient::new(config);

    assert!(client
        .submit(&batch(&["a.csv"], DataType::Auto), UploadMode::Auto)
        .await
        .is_ok());
}
