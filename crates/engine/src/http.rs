//! HTTP transport: drives the engine's web service.
//!
//! Each operation maps onto one multipart POST. The `count` response
//! body is itself the newline-delimited event stream and is forwarded
//! chunk by chunk; `convert`, `split`, and `merge` answer with a single
//! binary payload that is streamed straight to its destination path.
//! A non-2xx response rejects the launch before any streaming starts.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use marcbench_core::{JobRequest, OperationKind};

use crate::invocation::{FormPart, MultipartInvocation};
use crate::transport::{
    Completion, EngineStatus, EngineTransport, LaunchError, LaunchedJob, CHUNK_CHANNEL_CAPACITY,
};

/// Runs jobs by calling the engine web service.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport for the service at `base_url`,
    /// e.g. `http://localhost:8000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a transport reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling and for tests).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Probe the service's health endpoint.
    ///
    /// Returns `Ok(())` when the service answers 2xx on `/health`.
    pub async fn health(&self) -> Result<(), LaunchError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        Self::ensure_accepted(response).await?;
        Ok(())
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`LaunchError::Rejected`]
    /// containing the status and body text on failure.
    async fn ensure_accepted(response: reqwest::Response) -> Result<reqwest::Response, LaunchError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(LaunchError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

impl EngineTransport for HttpTransport {
    async fn launch(
        &self,
        request: &JobRequest,
        cancel: CancellationToken,
    ) -> Result<LaunchedJob, LaunchError> {
        let invocation = MultipartInvocation::build(request)?;

        let mut form = reqwest::multipart::Form::new();
        for part in invocation.parts {
            match part {
                FormPart::Text { name, value } => {
                    form = form.text(name, value);
                }
                FormPart::File { name, path } => {
                    let bytes = tokio::fs::read(&path).await?;
                    let file_name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| "input".to_string());
                    form = form.part(
                        name,
                        reqwest::multipart::Part::bytes(bytes).file_name(file_name),
                    );
                }
            }
        }

        // The CLI engine creates its split output directory itself;
        // mirror that before the archive starts landing there.
        if request.operation == OperationKind::Split {
            if let Some(dir) = &request.output {
                tokio::fs::create_dir_all(dir).await?;
            }
        }

        let response = self
            .client
            .post(format!("{}{}", self.base_url, invocation.route))
            .multipart(form)
            .send()
            .await?;
        let response = Self::ensure_accepted(response).await?;

        tracing::debug!(
            route = invocation.route,
            status = response.status().as_u16(),
            "Engine service accepted job",
        );

        let destination = payload_destination(request);
        let (chunk_tx, chunk_rx) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);
        let (completion_tx, completion_rx) = oneshot::channel();

        tokio::spawn(async move {
            let completion = match destination {
                None => stream_events(response, chunk_tx, cancel).await,
                Some(path) => save_payload(response, &path, cancel).await,
            };
            let _ = completion_tx.send(completion);
        });

        Ok(LaunchedJob {
            primary: chunk_rx,
            diagnostic: None,
            completion: completion_rx,
        })
    }
}

// ---- private helpers ----

/// Where the binary response payload for `request` lands locally.
///
/// `count` streams events instead and has no payload. Split mirrors
/// the service's archive naming inside the requested output directory.
fn payload_destination(request: &JobRequest) -> Option<PathBuf> {
    match request.operation {
        OperationKind::Count => None,
        OperationKind::Convert | OperationKind::Merge => request.output.clone(),
        OperationKind::Split => {
            let dir = request.output.as_ref()?;
            let stem = request
                .inputs
                .first()
                .and_then(|p| p.file_stem())
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "input".to_string());
            Some(dir.join(format!("{stem}_split.zip")))
        }
    }
}

/// Forward the event-stream response body into the primary channel.
///
/// The status was already checked at launch, so a clean end of body
/// finishes with it; only a broken transfer fails the run.
async fn stream_events(
    mut response: reqwest::Response,
    tx: mpsc::Sender<Vec<u8>>,
    cancel: CancellationToken,
) -> Completion {
    let status = response.status().as_u16();
    loop {
        let chunk = tokio::select! {
            chunk = response.chunk() => chunk,
            _ = cancel.cancelled() => {
                // Dropping the response aborts the transfer.
                return Completion::TransportFailed {
                    message: "event stream abandoned after cancellation".to_string(),
                };
            }
        };
        match chunk {
            Ok(Some(bytes)) => {
                if tx.send(bytes.to_vec()).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                return Completion::TransportFailed {
                    message: format!("event stream interrupted: {e}"),
                };
            }
        }
    }
    Completion::Finished(EngineStatus::Http(status))
}

/// Stream the binary response payload to `path`.
///
/// The body is written incrementally, so a large archive never sits
/// fully in memory.
async fn save_payload(
    mut response: reqwest::Response,
    path: &Path,
    cancel: CancellationToken,
) -> Completion {
    let status = response.status().as_u16();
    let mut file = match tokio::fs::File::create(path).await {
        Ok(file) => file,
        Err(e) => {
            return Completion::TransportFailed {
                message: format!("failed to create {}: {e}", path.display()),
            };
        }
    };
    loop {
        let chunk = tokio::select! {
            chunk = response.chunk() => chunk,
            _ = cancel.cancelled() => {
                return Completion::TransportFailed {
                    message: "payload download abandoned after cancellation".to_string(),
                };
            }
        };
        match chunk {
            Ok(Some(bytes)) => {
                if let Err(e) = file.write_all(&bytes).await {
                    return Completion::TransportFailed {
                        message: format!("failed to write {}: {e}", path.display()),
                    };
                }
            }
            Ok(None) => break,
            Err(e) => {
                return Completion::TransportFailed {
                    message: format!("payload download interrupted: {e}"),
                };
            }
        }
    }
    tracing::debug!(path = %path.display(), "Engine payload saved");
    Completion::Finished(EngineStatus::Http(status))
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;
    use marcbench_core::RecordFormat;

    #[test]
    fn count_has_no_payload_destination() {
        assert_eq!(payload_destination(&JobRequest::count("in.mrc")), None);
    }

    #[test]
    fn convert_payload_lands_at_the_requested_output() {
        let request = JobRequest::convert("in.mrc", "out/converted.xml", RecordFormat::Xml);
        assert_eq!(
            payload_destination(&request),
            Some(PathBuf::from("out/converted.xml"))
        );
    }

    #[test]
    fn split_payload_uses_the_input_stem() {
        let request = JobRequest::split("data/catalog.mrc", "downloads", 200);
        assert_eq!(
            payload_destination(&request),
            Some(PathBuf::from("downloads/catalog_split.zip"))
        );
    }
}
