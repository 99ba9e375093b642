//! Report sinks for request/response evidence
//!
//! Implementations of the `ReportSink` seam from `apiprobe-http`:
//! - [`FilesystemReport`] writes one file per attachment into a results
//!   directory for a report tool to pick up.
//! - [`MemoryReport`] accumulates attachments in memory for assertions in
//!   tests.

pub mod filesystem;
pub mod memory;

pub use filesystem::FilesystemReport;
pub use memory::MemoryReport;
