//! Process transport: runs the engine CLI as a child process.
//!
//! Spawns the engine executable with piped output, forwards stdout and
//! stderr chunks as they arrive, and reports the exit status once the
//! child finishes. Cancellation kills the child, which still yields a
//! completion signal.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use marcbench_core::JobRequest;

use crate::invocation::CommandInvocation;
use crate::transport::{
    Completion, EngineStatus, EngineTransport, LaunchError, LaunchedJob, CHUNK_CHANNEL_CAPACITY,
};

/// Read size for each pipe. Chunks are forwarded as they fill, so this
/// bounds read latency, not frame length.
const READ_BUFFER_BYTES: usize = 8 * 1024;

/// Runs jobs by spawning the engine executable.
#[derive(Debug, Clone)]
pub struct ProcessTransport {
    program: PathBuf,
}

impl ProcessTransport {
    /// Transport for the engine found on `PATH` under its default name.
    pub fn new() -> Self {
        Self::with_program("marclite")
    }

    /// Transport for a specific engine executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for ProcessTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineTransport for ProcessTransport {
    async fn launch(
        &self,
        request: &JobRequest,
        cancel: CancellationToken,
    ) -> Result<LaunchedJob, LaunchError> {
        let invocation = CommandInvocation::build(request)?;

        let mut cmd = Command::new(&self.program);
        // `kill_on_drop` covers abnormal teardown; cancellation kills
        // the child explicitly in `wait_for_exit`.
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn()?;

        tracing::debug!(
            program = %self.program.display(),
            args = ?invocation.args,
            "Engine process spawned",
        );

        // Take the pipes and read them in spawned tasks so that
        // `child.wait()` can borrow the child mutably.
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (stdout_tx, stdout_rx) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);
        let (stderr_tx, stderr_rx) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);
        tokio::spawn(pump_pipe(stdout, stdout_tx));
        tokio::spawn(pump_pipe(stderr, stderr_tx));

        let (completion_tx, completion_rx) = oneshot::channel();
        tokio::spawn(async move {
            let completion = wait_for_exit(&mut child, cancel).await;
            let _ = completion_tx.send(completion);
        });

        Ok(LaunchedJob {
            primary: stdout_rx,
            diagnostic: Some(stderr_rx),
            completion: completion_rx,
        })
    }
}

// ---- private helpers ----

/// Forward raw chunks from one pipe into its channel until the pipe
/// closes or the consumer goes away.
async fn pump_pipe<R: AsyncRead + Unpin>(pipe: Option<R>, tx: mpsc::Sender<Vec<u8>>) {
    let Some(mut pipe) = pipe else { return };
    let mut buf = vec![0u8; READ_BUFFER_BYTES];
    loop {
        match pipe.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if tx.send(buf[..n].to_vec()).await.is_err() {
                    break;
                }
            }
        }
    }
}

/// Wait for the child to exit, killing it first if `cancel` fires.
///
/// The child is reaped on both paths so no zombie outlives the job.
async fn wait_for_exit(child: &mut Child, cancel: CancellationToken) -> Completion {
    let waited = tokio::select! {
        status = child.wait() => Some(status),
        _ = cancel.cancelled() => None,
    };

    let status = match waited {
        Some(status) => status,
        None => {
            tracing::debug!("Cancellation requested, killing engine process");
            if let Err(e) = child.start_kill() {
                // Usually means the child exited in the meantime.
                tracing::debug!(error = %e, "Engine process kill failed");
            }
            child.wait().await
        }
    };

    match status {
        Ok(status) => Completion::Finished(EngineStatus::Exit(status.code().unwrap_or(-1))),
        Err(e) => Completion::TransportFailed {
            message: format!("failed to reap engine process: {e}"),
        },
    }
}
