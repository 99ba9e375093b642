//! In-memory report sink for tests

use apiprobe_http::{Attachment, ReportError, ReportSink};
use async_trait::async_trait;
use std::sync::Mutex;

/// Accumulates attachments in memory so tests can assert on the evidence
/// trail a call produced.
#[derive(Debug, Default)]
pub struct MemoryReport {
    attachments: Mutex<Vec<Attachment>>,
}

impl MemoryReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all attachments in arrival order
    pub fn attachments(&self) -> Vec<Attachment> {
        self.attachments.lock().unwrap().clone()
    }

    /// All attachments with the given name, in arrival order
    pub fn named(&self, name: &str) -> Vec<Attachment> {
        self.attachments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.name == name)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.attachments.lock().unwrap().clear();
    }
}

#[async_trait]
impl ReportSink for MemoryReport {
    async fn attach(&self, attachment: Attachment) -> Result<(), ReportError> {
        self.attachments.lock().unwrap().push(attachment);
        Ok(())
    }
}
