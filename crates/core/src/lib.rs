//! Domain model for marcbench jobs.
//!
//! Shared vocabulary for the rest of the workspace: the operation and
//! format enums, [`JobRequest`] and its validation rules, and the
//! terminal [`JobResult`] every finished job resolves to.

pub mod error;
pub mod job;
pub mod result;

pub use error::ValidationError;
pub use job::{JobRequest, OperationKind, RecordFormat};
pub use result::{JobId, JobResult, JobStatus};
