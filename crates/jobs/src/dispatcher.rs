//! Job dispatch and terminal-status resolution.
//!
//! One pump task per job: launch the transport, decode both output
//! channels concurrently, fan the events out to subscribers, and
//! resolve the result when the completion signal arrives. The
//! transport's signal alone decides success or failure; engine `error`
//! events are recorded as diagnostics and never override it.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

use marcbench_core::{JobId, JobRequest, JobResult, JobStatus, ValidationError};
use marcbench_engine::{
    decode_channel, Completion, EngineEvent, EngineTransport, LaunchedJob, OutputChannel,
};

use crate::handle::JobHandle;

/// Broadcast capacity for per-job event fan-out.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Capacity of the merged decoded-event channel inside the pump.
const MERGED_EVENT_CAPACITY: usize = 64;

/// Launches jobs on a transport and resolves their terminal results.
///
/// The dispatcher keeps no state between jobs: each dispatch spawns an
/// independent pump task, and the returned [`JobHandle`] is the only
/// link to it.
pub struct JobDispatcher<T> {
    transport: Arc<T>,
}

impl<T> Clone for JobDispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: EngineTransport + 'static> JobDispatcher<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    /// Start a job for `request`.
    ///
    /// Validation happens here, synchronously; an invalid request never
    /// touches the transport. The job itself runs on a spawned task and
    /// the handle returns immediately, so a subscriber attached right
    /// away observes the stream from its first event.
    pub fn dispatch(&self, request: JobRequest) -> Result<JobHandle, ValidationError> {
        request.validate()?;

        let id = JobId::new();
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();

        tracing::info!(job_id = %id, operation = %request.operation, "Job dispatched");

        let outcome = tokio::spawn(run_job(
            id,
            Arc::clone(&self.transport),
            request,
            event_tx.clone(),
            cancel.clone(),
        ));

        Ok(JobHandle {
            id,
            events: event_tx,
            cancel,
            outcome,
        })
    }
}

// ---- private helpers ----

/// Drive one job from launch to terminal result.
async fn run_job<T: EngineTransport>(
    id: JobId,
    transport: Arc<T>,
    request: JobRequest,
    events: broadcast::Sender<EngineEvent>,
    cancel: CancellationToken,
) -> JobResult {
    let launched = tokio::select! {
        launched = transport.launch(&request, cancel.clone()) => launched,
        _ = cancel.cancelled() => {
            tracing::info!(job_id = %id, "Job cancelled before launch");
            return JobResult::cancelled();
        }
    };

    let result = match launched {
        Ok(job) => pump_events(job, &events, &cancel).await,
        Err(e) => {
            tracing::warn!(job_id = %id, error = %e, "Job launch failed");
            let code = e.status_code();
            let message = e.to_string();
            // Subscribers learn about the failure the same way they
            // would learn about an engine-reported one.
            let _ = events.send(EngineEvent::Error {
                message: Some(message.clone()),
            });
            JobResult {
                status: JobStatus::Failed,
                code,
                warnings: Vec::new(),
                diagnostics: vec![message],
            }
        }
    };

    tracing::info!(job_id = %id, status = ?result.status, code = ?result.code, "Job finished");
    result
}

/// Forward decoded events to subscribers while accumulating summary
/// data, then resolve the result from the completion signal.
///
/// Each output channel gets its own decoder task, so per-channel order
/// is preserved end to end; the two streams interleave only here.
async fn pump_events(
    job: LaunchedJob,
    events: &broadcast::Sender<EngineEvent>,
    cancel: &CancellationToken,
) -> JobResult {
    let (merged_tx, mut merged_rx) = mpsc::channel(MERGED_EVENT_CAPACITY);

    tokio::spawn(decode_channel(
        job.primary,
        OutputChannel::Primary,
        merged_tx.clone(),
    ));
    if let Some(diagnostic) = job.diagnostic {
        tokio::spawn(decode_channel(
            diagnostic,
            OutputChannel::Diagnostic,
            merged_tx.clone(),
        ));
    }
    drop(merged_tx);

    let mut warnings = Vec::new();
    let mut diagnostics = Vec::new();

    while let Some(event) = merged_rx.recv().await {
        match &event {
            EngineEvent::Done { warnings: w, .. } => warnings.extend(w.iter().cloned()),
            EngineEvent::Error { message } => diagnostics.push(
                message
                    .clone()
                    .unwrap_or_else(|| "engine reported an error".to_string()),
            ),
            _ => {}
        }
        // A send error only means there is no subscriber right now.
        let _ = events.send(event);
    }

    // All events are delivered before the run resolves.
    let completion = match job.completion.await {
        Ok(completion) => completion,
        Err(_) => Completion::TransportFailed {
            message: "transport dropped without reporting completion".to_string(),
        },
    };

    resolve(completion, cancel, warnings, diagnostics)
}

/// Resolve the terminal status.
///
/// Cancellation wins over any signal. Otherwise the engine's exit code
/// or HTTP status alone decides between succeeded and failed; `error`
/// events only ever contribute diagnostics.
fn resolve(
    completion: Completion,
    cancel: &CancellationToken,
    warnings: Vec<String>,
    mut diagnostics: Vec<String>,
) -> JobResult {
    if cancel.is_cancelled() {
        return JobResult {
            status: JobStatus::Cancelled,
            code: None,
            warnings,
            diagnostics,
        };
    }
    match completion {
        Completion::Finished(status) => JobResult {
            status: if status.is_success() {
                JobStatus::Succeeded
            } else {
                JobStatus::Failed
            },
            code: Some(status.code()),
            warnings,
            diagnostics,
        },
        Completion::TransportFailed { message } => {
            diagnostics.push(message);
            JobResult {
                status: JobStatus::Failed,
                code: None,
                warnings,
                diagnostics,
            }
        }
    }
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use marcbench_engine::EngineStatus;

    fn fresh_token() -> CancellationToken {
        CancellationToken::new()
    }

    #[test]
    fn successful_exit_resolves_succeeded() {
        let result = resolve(
            Completion::Finished(EngineStatus::Exit(0)),
            &fresh_token(),
            vec!["short leader".to_string()],
            Vec::new(),
        );
        assert_eq!(result.status, JobStatus::Succeeded);
        assert_eq!(result.code, Some(0));
        assert_eq!(result.warnings, vec!["short leader"]);
    }

    #[test]
    fn error_diagnostics_do_not_override_success() {
        let result = resolve(
            Completion::Finished(EngineStatus::Http(200)),
            &fresh_token(),
            Vec::new(),
            vec!["recoverable hiccup".to_string()],
        );
        assert_eq!(result.status, JobStatus::Succeeded);
        assert_eq!(result.diagnostics, vec!["recoverable hiccup"]);
    }

    #[test]
    fn nonzero_exit_resolves_failed() {
        let result = resolve(
            Completion::Finished(EngineStatus::Exit(2)),
            &fresh_token(),
            Vec::new(),
            Vec::new(),
        );
        assert_eq!(result.status, JobStatus::Failed);
        assert_eq!(result.code, Some(2));
    }

    #[test]
    fn transport_failure_appends_its_message() {
        let result = resolve(
            Completion::TransportFailed {
                message: "pipe closed".to_string(),
            },
            &fresh_token(),
            Vec::new(),
            vec!["earlier error".to_string()],
        );
        assert_eq!(result.status, JobStatus::Failed);
        assert_eq!(result.code, None);
        assert_eq!(result.diagnostics, vec!["earlier error", "pipe closed"]);
    }

    #[test]
    fn cancellation_beats_any_signal() {
        let token = fresh_token();
        token.cancel();
        let result = resolve(
            Completion::Finished(EngineStatus::Exit(0)),
            &token,
            Vec::new(),
            Vec::new(),
        );
        assert_eq!(result.status, JobStatus::Cancelled);
        assert_eq!(result.code, None);
    }
}
