//! Job identity and terminal results.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque unique identifier for one dispatched job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Terminal state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// The engine reported success (exit code 0 or HTTP 2xx).
    Succeeded,
    /// The engine reported failure, the launch was rejected, or the
    /// transport broke before a verdict arrived.
    Failed,
    /// The job was cancelled before the engine finished.
    Cancelled,
}

/// The single terminal outcome of a job.
///
/// `status` follows the transport's completion signal alone: the engine
/// has the final word through its exit code or HTTP status. `error`
/// events observed mid-stream land in `diagnostics` and never override
/// a successful exit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    pub status: JobStatus,
    /// Exit code or HTTP status, when the engine got far enough to
    /// produce one.
    pub code: Option<i32>,
    /// Warnings reported by the engine's final summary event.
    pub warnings: Vec<String>,
    /// Error text collected from engine error events, launch failures,
    /// and transport breakdowns.
    pub diagnostics: Vec<String>,
}

impl JobResult {
    /// Result for a job that failed before the engine produced a verdict.
    pub fn failed_with(diagnostic: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Failed,
            code: None,
            warnings: Vec::new(),
            diagnostics: vec![diagnostic.into()],
        }
    }

    /// Result for a job cancelled before any terminal signal.
    pub fn cancelled() -> Self {
        Self {
            status: JobStatus::Cancelled,
            code: None,
            warnings: Vec::new(),
            diagnostics: Vec::new(),
        }
    }
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */
