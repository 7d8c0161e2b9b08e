//! Transport abstraction: launching jobs and streaming their output.
//!
//! A transport knows how to start one engine run and hand back its raw
//! output: byte channels cut at arbitrary boundaries plus exactly one
//! [`Completion`] signal. Frame reassembly, event decoding, and status
//! policy all live above this layer.

use std::io;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use marcbench_core::{JobRequest, ValidationError};

/// Per-channel chunk buffer between a transport's readers and the
/// consumer.
pub(crate) const CHUNK_CHANNEL_CAPACITY: usize = 64;

/// How the engine signalled the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    /// Process exit code.
    Exit(i32),
    /// HTTP response status.
    Http(u16),
}

impl EngineStatus {
    /// Whether this status denotes success (exit 0 / HTTP 2xx).
    pub fn is_success(&self) -> bool {
        match *self {
            EngineStatus::Exit(code) => code == 0,
            EngineStatus::Http(status) => (200..300).contains(&status),
        }
    }

    /// Raw numeric value, for surfacing in job results.
    pub fn code(&self) -> i32 {
        match *self {
            EngineStatus::Exit(code) => code,
            EngineStatus::Http(status) => i32::from(status),
        }
    }
}

/// Terminal signal a transport sends exactly once per launched job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The engine ran to the end of its output and reported this
    /// status.
    Finished(EngineStatus),
    /// The stream broke before the engine could report. Output already
    /// delivered remains valid.
    TransportFailed { message: String },
}

/// A successfully launched job: its output streams plus the completion
/// signal.
///
/// `primary` carries the structured event bytes (stdout, or the HTTP
/// response body). `diagnostic`, when the transport has one, carries
/// free-form text (the CLI engine's stderr). Chunks arrive exactly as
/// the pipe or network delivered them.
#[derive(Debug)]
pub struct LaunchedJob {
    pub primary: mpsc::Receiver<Vec<u8>>,
    pub diagnostic: Option<mpsc::Receiver<Vec<u8>>>,
    pub completion: oneshot::Receiver<Completion>,
}

/// Errors that prevent a job from launching at all.
///
/// Nothing here is an engine verdict. Once a run is launched, failures
/// arrive through [`Completion`] instead, with whatever output was
/// produced first.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    /// The request failed validation before any engine contact.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// The engine could not be started or its input read.
    #[error("failed to set up engine run: {0}")]
    Setup(#[from] io::Error),

    /// The engine service could not be reached.
    #[error("engine request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The engine service refused the job outright.
    #[error("engine rejected the job ({status}): {body}")]
    Rejected { status: u16, body: String },
}

impl LaunchError {
    /// HTTP status of a rejected launch, when there is one.
    pub fn status_code(&self) -> Option<i32> {
        match self {
            LaunchError::Rejected { status, .. } => Some(i32::from(*status)),
            _ => None,
        }
    }
}

/// A strategy for running engine jobs and streaming their output.
///
/// Launching validates the request through the invocation builder, so
/// a malformed request fails fast with [`LaunchError::Invalid`]. Every
/// launched job delivers exactly one [`Completion`], including when
/// `cancel` fires mid-run.
pub trait EngineTransport: Send + Sync {
    /// Start a job for `request`.
    ///
    /// * `cancel` - observed for the whole run; a cancelled token stops
    ///   the engine and ends the streams promptly.
    fn launch(
        &self,
        request: &JobRequest,
        cancel: CancellationToken,
    ) -> impl std::future::Future<Output = Result<LaunchedJob, LaunchError>> + Send;
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */
