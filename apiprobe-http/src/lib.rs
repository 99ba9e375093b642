//! Instrumented HTTP client for API test suites
//!
//! This crate provides a thin wrapper around an async HTTP client that
//! issues verb-level requests against a configured host, logs structured
//! request/response events, records API coverage against a service
//! contract, and leaves an evidence trail (cURL command, bodies, status)
//! in a test report.

pub mod client;
pub mod config;
pub mod curl;
pub mod errors;
pub mod report;
pub mod types;

#[cfg(feature = "coverage")]
pub mod coverage;

// Re-export main types for convenience
pub use client::ApiClient;
pub use config::ClientConfig;
pub use curl::to_curl;
pub use errors::HttpError;
pub use report::{with_evidence, Attachment, AttachmentKind, ReportError, ReportSink};
pub use types::{ApiResponse, HttpMethod, HttpMethodError, RequestOptions, SentRequest};

#[cfg(feature = "coverage")]
pub use coverage::{CoverageRecord, CoverageRecorder, DEFAULT_COVERAGE_DIR};
