//! Live job handles: subscription, cancellation, and the final result.

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use marcbench_core::{JobId, JobResult};
use marcbench_engine::EngineEvent;

/// Handle to a dispatched job.
///
/// Dropping the handle neither cancels nor detaches the job; the pump
/// task runs to its terminal state regardless.
#[derive(Debug)]
pub struct JobHandle {
    pub(crate) id: JobId,
    pub(crate) events: broadcast::Sender<EngineEvent>,
    pub(crate) cancel: CancellationToken,
    pub(crate) outcome: tokio::task::JoinHandle<JobResult>,
}

impl JobHandle {
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Subscribe to the job's event stream.
    ///
    /// Delivery starts with the next event produced; events emitted
    /// before subscribing are not replayed. The terminal outcome is
    /// carried by [`wait`](Self::wait), not the stream.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Request cancellation.
    ///
    /// Idempotent. The engine run is stopped and [`wait`](Self::wait)
    /// resolves with a cancelled status unless the job had already
    /// reached its terminal state.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The token the job observes; cancelling it cancels the job.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the job's single terminal result.
    pub async fn wait(self) -> JobResult {
        match self.outcome.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(job_id = %self.id, error = %e, "Job pump task failed");
                JobResult::failed_with(format!("job task failed: {e}"))
            }
        }
    }
}
