//! Structured logging and coverage recording tests

use anyhow::Result;
use apiprobe_http::{ApiClient, ClientConfig, CoverageRecord, CoverageRecorder, RequestOptions};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Captures formatted tracing output for assertions
#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for Capture {
    type Writer = Capture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn capture_subscriber(capture: &Capture) -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_ansi(false)
        .finish()
}

/// Coverage records land on a background task; poll for them
async fn wait_for_records(dir: &Path) -> Vec<PathBuf> {
    for _ in 0..50 {
        let records = collect_records(dir);
        if !records.is_empty() {
            return records;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    Vec::new()
}

fn collect_records(dir: &Path) -> Vec<PathBuf> {
    let mut records = Vec::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return records;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            records.extend(collect_records(&path));
        } else {
            records.push(path);
        }
    }
    records
}

async fn mock_users_endpoint(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path("/users/42"))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({"id": 42})))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_logged_call_emits_one_request_and_one_response_event() -> Result<()> {
    let server = MockServer::start().await;
    mock_users_endpoint(&server, 200).await;

    let capture = Capture::default();
    let _guard = tracing::subscriber::set_default(capture_subscriber(&capture));

    let client = ApiClient::new(ClientConfig::new(server.uri()))?;
    let response = client.get("/users/42", RequestOptions::new()).await?;
    assert_eq!(response.status, 200);
    assert_eq!(response.json()?, json!({"id": 42}));

    let logs = capture.contents();
    assert_eq!(logs.matches("event=\"Request\"").count(), 1);
    assert_eq!(logs.matches("event=\"Response\"").count(), 1);
    assert!(logs.contains("method=GET"));
    assert!(logs.contains("/users/42"));
    assert!(logs.contains("status_code=200"));
    Ok(())
}

#[tokio::test]
async fn test_logged_call_records_coverage() -> Result<()> {
    let server = MockServer::start().await;
    mock_users_endpoint(&server, 200).await;

    let dir = tempfile::tempdir()?;
    let client = ApiClient::new(ClientConfig::new(server.uri()))?
        .with_coverage(CoverageRecorder::new(dir.path()));

    client.get("/users/42", RequestOptions::new()).await?;

    let records = wait_for_records(dir.path()).await;
    assert_eq!(records.len(), 1);

    let record: CoverageRecord = serde_json::from_str(&std::fs::read_to_string(&records[0])?)?;
    assert_eq!(record.host, server.uri());
    assert_eq!(record.base_path, "");
    assert_eq!(record.path, "/users/42");
    assert_eq!(record.method, "get");
    assert_eq!(record.status_code, 200);
    assert_eq!(record.response, json!({"id": 42}));
    Ok(())
}

#[tokio::test]
async fn test_failed_call_still_logs_and_records_coverage() -> Result<()> {
    let server = MockServer::start().await;
    mock_users_endpoint(&server, 404).await;

    let capture = Capture::default();
    let _guard = tracing::subscriber::set_default(capture_subscriber(&capture));

    let dir = tempfile::tempdir()?;
    let client = ApiClient::new(ClientConfig::new(server.uri()))?
        .with_coverage(CoverageRecorder::new(dir.path()));

    let err = client.get("/users/42", RequestOptions::new()).await.unwrap_err();
    assert_eq!(err.status(), Some(404));

    // Side effects run before the status check turns into an error
    let logs = capture.contents();
    assert_eq!(logs.matches("event=\"Request\"").count(), 1);
    assert_eq!(logs.matches("event=\"Response\"").count(), 1);
    assert!(logs.contains("status_code=404"));

    let records = wait_for_records(dir.path()).await;
    assert_eq!(records.len(), 1);
    let record: CoverageRecord = serde_json::from_str(&std::fs::read_to_string(&records[0])?)?;
    assert_eq!(record.status_code, 404);
    Ok(())
}

#[tokio::test]
async fn test_disable_log_suppresses_events_and_coverage() -> Result<()> {
    let server = MockServer::start().await;
    mock_users_endpoint(&server, 200).await;

    let capture = Capture::default();
    let _guard = tracing::subscriber::set_default(capture_subscriber(&capture));

    let dir = tempfile::tempdir()?;
    let config = ClientConfig {
        disable_log: true,
        ..ClientConfig::new(server.uri())
    };
    let client = ApiClient::new(config)?.with_coverage(CoverageRecorder::new(dir.path()));

    client.get("/users/42", RequestOptions::new()).await?;

    let logs = capture.contents();
    assert!(!logs.contains("event=\"Request\""));
    assert!(!logs.contains("event=\"Response\""));

    // Give any stray background write a chance to land before asserting
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(collect_records(dir.path()).is_empty());
    Ok(())
}

#[tokio::test]
async fn test_disable_log_suppresses_side_effects_on_failure_too() -> Result<()> {
    let server = MockServer::start().await;
    mock_users_endpoint(&server, 500).await;

    let capture = Capture::default();
    let _guard = tracing::subscriber::set_default(capture_subscriber(&capture));

    let dir = tempfile::tempdir()?;
    let config = ClientConfig {
        disable_log: true,
        ..ClientConfig::new(server.uri())
    };
    let client = ApiClient::new(config)?.with_coverage(CoverageRecorder::new(dir.path()));

    let err = client.get("/users/42", RequestOptions::new()).await.unwrap_err();
    assert_eq!(err.status(), Some(500));

    assert!(!capture.contents().contains("event=\"Request\""));
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(collect_records(dir.path()).is_empty());
    Ok(())
}

#[tokio::test]
async fn test_non_json_response_logs_empty_object() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&server)
        .await;

    let capture = Capture::default();
    let _guard = tracing::subscriber::set_default(capture_subscriber(&capture));

    let client = ApiClient::new(ClientConfig::new(server.uri()))?;
    let response = client.get("/health", RequestOptions::new()).await?;
    assert_eq!(response.body, "OK");

    let logs = capture.contents();
    assert_eq!(logs.matches("event=\"Response\"").count(), 1);
    assert!(logs.contains("json={}"));
    Ok(())
}
