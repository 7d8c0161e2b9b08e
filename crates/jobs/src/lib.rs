//! Job dispatch and lifecycle management.
//!
//! [`JobDispatcher`] turns validated requests into running jobs on any
//! transport: it fans decoded events out to subscribers, accumulates
//! warnings and diagnostics along the way, and resolves exactly one
//! terminal [`JobResult`] per job from the transport's completion
//! signal.
//!
//! [`JobResult`]: marcbench_core::JobResult

pub mod dispatcher;
pub mod handle;

pub use dispatcher::JobDispatcher;
pub use handle::JobHandle;
