//! Filesystem report sink

use apiprobe_http::{Attachment, AttachmentKind, ReportError, ReportSink};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

/// Writes each attachment as its own file into a results directory.
///
/// File names are `<uuid>-<sanitized name>.json` or `.txt` depending on the
/// attachment kind; the directory is created on first write.
#[derive(Debug, Clone)]
pub struct FilesystemReport {
    results_dir: PathBuf,
}

impl FilesystemReport {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
        }
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    fn file_name(attachment: &Attachment) -> String {
        let extension = match attachment.kind {
            AttachmentKind::Json => "json",
            AttachmentKind::Text => "txt",
        };
        format!("{}-{}.{}", Uuid::new_v4(), sanitize(&attachment.name), extension)
    }
}

#[async_trait]
impl ReportSink for FilesystemReport {
    async fn attach(&self, attachment: Attachment) -> Result<(), ReportError> {
        fs::create_dir_all(&self.results_dir).await?;
        let path = self.results_dir.join(Self::file_name(&attachment));
        fs::write(&path, attachment.body.as_bytes()).await?;
        debug!(name = %attachment.name, file = %path.display(), "Wrote report attachment");
        Ok(())
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_attach_writes_one_file_per_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FilesystemReport::new(dir.path());

        sink.attach(Attachment::text("status code", "200")).await.unwrap();
        sink.attach(Attachment::json("response body", &serde_json::json!({"id": 42})))
            .await
            .unwrap();

        let mut names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        assert_eq!(names.len(), 2);
        assert!(names.iter().any(|n| n.ends_with("-status_code.txt")));
        assert!(names.iter().any(|n| n.ends_with("-response_body.json")));
    }

    #[tokio::test]
    async fn test_attach_creates_results_dir_on_demand() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("report").join("results");
        let sink = FilesystemReport::new(&nested);

        sink.attach(Attachment::text("curl", "curl -X GET \"http://x\"")).await.unwrap();
        assert!(nested.is_dir());
    }

    #[tokio::test]
    async fn test_attach_surfaces_io_errors() {
        let sink = FilesystemReport::new("/proc/apiprobe-denied");
        let err = sink.attach(Attachment::text("curl", "x")).await.unwrap_err();
        assert!(matches!(err, ReportError::Io(_)));
    }

    #[tokio::test]
    async fn test_json_attachment_body_is_pretty_printed() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FilesystemReport::new(dir.path());

        sink.attach(Attachment::json("request_body", &serde_json::json!({"a": 1})))
            .await
            .unwrap();

        let entry = std::fs::read_dir(dir.path()).unwrap().next().unwrap().unwrap();
        let contents = std::fs::read_to_string(entry.path()).unwrap();
        assert_eq!(contents, "{\n  \"a\": 1\n}");
    }
}
