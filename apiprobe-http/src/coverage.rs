//! API coverage recording
//!
//! Each logged request is written out as a JSON record so an external
//! coverage tool can mark the endpoint/method combination as exercised
//! against the service contract. Records are written off the request path
//! and are best-effort: a failed write logs a warning and is dropped.

use crate::errors::HttpError;
use crate::types::{ApiResponse, HttpMethod, RequestOptions};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Default output directory for coverage records
pub const DEFAULT_COVERAGE_DIR: &str = "api-coverage-output";

/// One exercised endpoint/method combination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageRecord {
    pub host: String,
    /// Base path prefix; empty, paths are recorded as passed to the client
    pub base_path: String,
    /// Unformatted path template as passed to the verb method
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<Vec<(String, String)>>,
    /// Lowercased HTTP method
    pub method: String,
    pub status_code: u16,
    /// Best-effort decoded response body
    pub response: JsonValue,
    /// Snapshot of the original call options
    pub options: RequestOptions,
    pub recorded_at: DateTime<Utc>,
}

impl CoverageRecord {
    pub fn from_call(
        host: &str,
        path: &str,
        method: HttpMethod,
        options: &RequestOptions,
        response: &ApiResponse,
    ) -> Self {
        Self {
            host: host.to_string(),
            base_path: String::new(),
            path: path.to_string(),
            query: options.params.clone(),
            method: method.as_str().to_lowercase(),
            status_code: response.status,
            response: response.json_or_empty(),
            options: options.clone(),
            recorded_at: Utc::now(),
        }
    }
}

/// Writes coverage records into a per-host directory
#[derive(Debug, Clone)]
pub struct CoverageRecorder {
    output_dir: PathBuf,
}

impl Default for CoverageRecorder {
    fn default() -> Self {
        Self::new(DEFAULT_COVERAGE_DIR)
    }
}

impl CoverageRecorder {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write one record, returning the path of the file created
    pub async fn record(&self, record: &CoverageRecord) -> Result<PathBuf, HttpError> {
        let dir = self.output_dir.join(sanitize(&record.host));
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| HttpError::Recording(format!("{}: {}", dir.display(), e)))?;

        let file = dir.join(format!(
            "{}_{}_{}.json",
            record.method,
            sanitize(&record.path),
            Uuid::new_v4()
        ));
        let contents = serde_json::to_vec_pretty(record)
            .map_err(|e| HttpError::Recording(e.to_string()))?;
        tokio::fs::write(&file, contents)
            .await
            .map_err(|e| HttpError::Recording(format!("{}: {}", file.display(), e)))?;

        debug!(file = %file.display(), "Wrote coverage record");
        Ok(file)
    }
}

/// Record on a background task so the request path never blocks on
/// bookkeeping I/O. Failures are logged and dropped.
pub fn spawn_record(recorder: CoverageRecorder, record: CoverageRecord) {
    tokio::spawn(async move {
        if let Err(e) = recorder.record(&record).await {
            warn!(error = %e, "Failed to write coverage record");
        }
    });
}

fn sanitize(component: &str) -> String {
    let cleaned: String = component
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect();
    cleaned.trim_matches('_').to_string()
}
