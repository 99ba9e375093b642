//! Report evidence seam
//!
//! Every dispatched request leaves an evidence trail in a test report:
//! the outgoing JSON body, a cURL reconstruction, the status code and the
//! response body. The trail is produced by [`with_evidence`], a middleware
//! that wraps the low-level send, and consumed through the [`ReportSink`]
//! trait so report backends stay out of this crate.

use crate::curl::to_curl;
use crate::errors::HttpError;
use crate::types::ApiResponse;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::future::Future;
use tracing::warn;

/// Kind of an attachment body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Json,
    Text,
}

/// A named piece of evidence bound to the current report entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub kind: AttachmentKind,
    pub body: String,
}

impl Attachment {
    /// JSON attachment, pretty-printed
    pub fn json(name: impl Into<String>, value: &JsonValue) -> Self {
        Self {
            name: name.into(),
            kind: AttachmentKind::Json,
            // Value serialization cannot fail
            body: serde_json::to_string_pretty(value).unwrap_or_default(),
        }
    }

    /// Plain-text attachment
    pub fn text(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttachmentKind::Text,
            body: body.into(),
        }
    }
}

/// Destination for report attachments
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn attach(&self, attachment: Attachment) -> Result<(), ReportError>;
}

/// Error type for report sinks
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Wrap a send operation with report evidence.
///
/// Before the call, a present JSON body is attached as `request_body`.
/// After a successful call, the cURL reconstruction (`curl`), the status
/// code (`status code`) and the response body (`response body` when it
/// decodes as JSON, `response text` otherwise) are attached. When the call
/// fails the post-call attachments are skipped and the error propagates
/// unmodified. Sink failures are logged and never fail the request.
pub async fn with_evidence<F, Fut>(
    sink: &dyn ReportSink,
    json_body: Option<&JsonValue>,
    send: F,
) -> Result<ApiResponse, HttpError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<ApiResponse, HttpError>>,
{
    if let Some(body) = json_body {
        attach_or_warn(sink, Attachment::json("request_body", body)).await;
    }

    let response = send().await?;

    attach_or_warn(sink, Attachment::text("curl", to_curl(&response.request))).await;
    attach_or_warn(sink, Attachment::text("status code", response.status.to_string())).await;
    match response.json() {
        Ok(value) => attach_or_warn(sink, Attachment::json("response body", &value)).await,
        Err(_) => attach_or_warn(sink, Attachment::text("response text", response.body.clone())).await,
    }

    Ok(response)
}

async fn attach_or_warn(sink: &dyn ReportSink, attachment: Attachment) {
    let name = attachment.name.clone();
    if let Err(e) = sink.attach(attachment).await {
        warn!(attachment = %name, error = %e, "Failed to attach report evidence");
    }
}
