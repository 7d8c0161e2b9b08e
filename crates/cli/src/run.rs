//! Runs one job end to end and maps its outcome to an exit code.
//!
//! Events stream to stdout as NDJSON, one object per line, while
//! logs go to stderr. Ctrl-C cancels the running job instead of
//! killing the process outright.

use tokio::sync::broadcast;

use marcbench_core::{JobRequest, JobResult, JobStatus};
use marcbench_engine::{EngineEvent, EngineTransport, HttpTransport, ProcessTransport};
use marcbench_jobs::JobDispatcher;

use crate::cli::Command;
use crate::config::{EngineConfig, SERVER_ENV};

/// Exit code reported when a job is cancelled from the terminal.
const INTERRUPT_EXIT_CODE: i32 = 130;

/// Executes one subcommand against the configured engine.
pub async fn execute(command: Command, config: EngineConfig) -> anyhow::Result<i32> {
    let request = match command {
        Command::Health => return health(&config).await,
        Command::Count { input } => JobRequest::count(input),
        Command::Convert { input, output, to } => JobRequest::convert(input, output, to.into()),
        Command::Split {
            input,
            every,
            out_dir,
            to,
        } => match to {
            Some(format) => JobRequest::split(input, out_dir, every).with_format(format.into()),
            None => JobRequest::split(input, out_dir, every),
        },
        Command::Merge { inputs, output, to } => JobRequest::merge(inputs, output, to.into()),
    };

    match config.server {
        Some(base_url) => run_job(HttpTransport::new(base_url), request).await,
        None => run_job(ProcessTransport::with_program(config.engine), request).await,
    }
}

async fn health(config: &EngineConfig) -> anyhow::Result<i32> {
    let base_url = match &config.server {
        Some(url) => url,
        None => anyhow::bail!("the health command needs --server or {SERVER_ENV}"),
    };

    let transport = HttpTransport::new(base_url.clone());
    match transport.health().await {
        Ok(()) => {
            tracing::info!(server = %base_url, "Engine service is healthy");
            Ok(0)
        }
        Err(e) => {
            tracing::error!(server = %base_url, error = %e, "Engine service health check failed");
            Ok(1)
        }
    }
}

async fn run_job<T>(transport: T, request: JobRequest) -> anyhow::Result<i32>
where
    T: EngineTransport + 'static,
{
    let dispatcher = JobDispatcher::new(transport);
    let handle = dispatcher.dispatch(request)?;
    let printer = tokio::spawn(print_events(handle.subscribe()));

    let interrupt = handle.cancel_token();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, cancelling the job");
            interrupt.cancel();
        }
    });

    let result = handle.wait().await;
    let _ = printer.await;
    watcher.abort();

    report(&result);
    Ok(exit_code(&result))
}

/// Prints every event as one JSON object per line until the job ends.
async fn print_events(mut events: broadcast::Receiver<EngineEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!(error = %e, "Failed to encode an event"),
            },
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                tracing::warn!(missed, "Event subscriber lagged behind the engine stream");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn report(result: &JobResult) {
    for warning in &result.warnings {
        tracing::warn!(warning = %warning, "Engine warning");
    }
    match result.status {
        JobStatus::Succeeded => tracing::info!(code = ?result.code, "Job succeeded"),
        JobStatus::Cancelled => tracing::info!("Job cancelled"),
        JobStatus::Failed => {
            for diagnostic in &result.diagnostics {
                tracing::error!(diagnostic = %diagnostic, "Engine failure detail");
            }
            tracing::error!(code = ?result.code, "Job failed");
        }
    }
}

fn exit_code(result: &JobResult) -> i32 {
    match result.status {
        JobStatus::Succeeded => 0,
        JobStatus::Failed => 1,
        JobStatus::Cancelled => INTERRUPT_EXIT_CODE,
    }
}
