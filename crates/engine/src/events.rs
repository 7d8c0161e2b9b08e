//! Typed engine events and tolerant frame decoding.
//!
//! The engine reports progress as flat JSON objects, one per line,
//! tagged by their `event` field: `{"event":"progress","records_read":5000}`.
//! This module deserializes them into [`EngineEvent`] and guarantees
//! that no frame is ever dropped: anything that fails the structural
//! decode is delivered as a `log` or `stderr` event instead.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::framing::FrameReassembler;

/// Which engine output channel a frame arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputChannel {
    /// The structured event stream: stdout for the CLI engine, the
    /// response body for the HTTP service.
    Primary,
    /// Free-form human text: the CLI engine's stderr.
    Diagnostic,
}

/// One engine event, as it appears on the wire.
///
/// Fields the engine adds in newer versions are ignored rather than
/// rejected, and absent optional fields decode as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum EngineEvent {
    /// The engine acknowledged the operation and began work.
    Start {
        #[serde(skip_serializing_if = "Option::is_none")]
        operation: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// Periodic progress while records stream through.
    Progress {
        #[serde(skip_serializing_if = "Option::is_none")]
        records_read: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// Final summary for a run that reached the end of its input.
    Done {
        #[serde(skip_serializing_if = "Option::is_none")]
        operation: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        records: Option<u64>,
        /// Output format tag exactly as the engine spelled it. Kept as
        /// a raw string so an unrecognized tag cannot poison the frame.
        #[serde(skip_serializing_if = "Option::is_none")]
        format: Option<String>,
        /// Records the engine discarded as unreadable.
        #[serde(skip_serializing_if = "Option::is_none")]
        dropped: Option<u64>,
        /// Per-record warnings, in input order.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        warnings: Vec<String>,
    },

    /// The engine hit a fatal problem with the run.
    Error {
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// Unstructured output that still deserves delivery: an engine
    /// `log` frame, or a primary-channel frame that failed to decode.
    Log {
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// One line of diagnostic-channel text, wrapped verbatim.
    Stderr { message: String },
}

/// Decode one reassembled frame into an event.
///
/// Primary-channel frames are parsed as JSON; anything that fails the
/// structural decode is downgraded to [`EngineEvent::Log`] carrying the
/// raw text. Diagnostic-channel frames are never parsed, even when they
/// happen to look like JSON; each becomes [`EngineEvent::Stderr`]
/// verbatim.
pub fn decode_frame(frame: &str, channel: OutputChannel) -> EngineEvent {
    match channel {
        OutputChannel::Diagnostic => EngineEvent::Stderr {
            message: frame.to_string(),
        },
        OutputChannel::Primary => match serde_json::from_str(frame) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(
                    error = %e,
                    frame = %frame,
                    "Frame failed structured decode, delivering as log",
                );
                EngineEvent::Log {
                    message: Some(frame.to_string()),
                }
            }
        },
    }
}

/// Drive one output channel end to end: reassemble frames from byte
/// chunks, decode each one, and forward the events in arrival order.
///
/// Runs until the byte channel closes, then flushes the final
/// unterminated frame, if any. Every frame yields exactly one event.
pub async fn decode_channel(
    mut bytes: mpsc::Receiver<Vec<u8>>,
    channel: OutputChannel,
    events: mpsc::Sender<EngineEvent>,
) {
    let mut reassembler = FrameReassembler::new();
    while let Some(chunk) = bytes.recv().await {
        for frame in reassembler.push(&chunk) {
            if events.send(decode_frame(&frame, channel)).await.is_err() {
                return;
            }
        }
    }
    if let Some(frame) = reassembler.finish() {
        let _ = events.send(decode_frame(&frame, channel)).await;
    }
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_start_event() {
        let event = decode_frame(
            r#"{"event":"start","operation":"count","input":"a.mrc"}"#,
            OutputChannel::Primary,
        );
        match event {
            EngineEvent::Start { operation, .. } => {
                assert_eq!(operation.as_deref(), Some("count"));
            }
            other => panic!("Expected Start, got {other:?}"),
        }
    }

    #[test]
    fn decode_progress_event() {
        let event = decode_frame(
            r#"{"event":"progress","records_read":5000}"#,
            OutputChannel::Primary,
        );
        match event {
            EngineEvent::Progress { records_read, .. } => {
                assert_eq!(records_read, Some(5000));
            }
            other => panic!("Expected Progress, got {other:?}"),
        }
    }

    #[test]
    fn decode_done_event_with_warnings() {
        let json = r#"{"event":"done","operation":"count","records":120,"format":"mrc","dropped":2,"warnings":["record 7: bad leader"]}"#;
        let event = decode_frame(json, OutputChannel::Primary);
        match event {
            EngineEvent::Done {
                records,
                format,
                dropped,
                warnings,
                ..
            } => {
                assert_eq!(records, Some(120));
                assert_eq!(format.as_deref(), Some("mrc"));
                assert_eq!(dropped, Some(2));
                assert_eq!(warnings, vec!["record 7: bad leader"]);
            }
            other => panic!("Expected Done, got {other:?}"),
        }
    }

    #[test]
    fn done_without_warnings_decodes_empty() {
        let event = decode_frame(r#"{"event":"done","records":0}"#, OutputChannel::Primary);
        match event {
            EngineEvent::Done { warnings, .. } => assert!(warnings.is_empty()),
            other => panic!("Expected Done, got {other:?}"),
        }
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let json = r#"{"event":"done","records":9,"files":["out/part001.mrc"],"out_dir":"out"}"#;
        let event = decode_frame(json, OutputChannel::Primary);
        match event {
            EngineEvent::Done { records, .. } => assert_eq!(records, Some(9)),
            other => panic!("Expected Done, got {other:?}"),
        }
    }

    #[test]
    fn malformed_frame_downgrades_to_log() {
        let event = decode_frame("Traceback (most recent call last):", OutputChannel::Primary);
        assert_eq!(
            event,
            EngineEvent::Log {
                message: Some("Traceback (most recent call last):".to_string()),
            }
        );
    }

    #[test]
    fn unknown_event_tag_downgrades_to_log() {
        let frame = r#"{"event":"telemetry","cpu":97}"#;
        let event = decode_frame(frame, OutputChannel::Primary);
        assert_eq!(
            event,
            EngineEvent::Log {
                message: Some(frame.to_string()),
            }
        );
    }

    #[test]
    fn diagnostic_frames_are_never_parsed() {
        let event = decode_frame(r#"{"event":"done","records":3}"#, OutputChannel::Diagnostic);
        assert_eq!(
            event,
            EngineEvent::Stderr {
                message: r#"{"event":"done","records":3}"#.to_string(),
            }
        );
    }

    #[test]
    fn stderr_event_serializes_with_tag() {
        let event = EngineEvent::Stderr {
            message: "warning: slow disk".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"event":"stderr","message":"warning: slow disk"}"#
        );
    }

    #[tokio::test]
    async fn decode_channel_reassembles_split_frames() {
        let (bytes_tx, bytes_rx) = mpsc::channel(8);
        let (events_tx, mut events_rx) = mpsc::channel(8);
        let decoder = tokio::spawn(decode_channel(
            bytes_rx,
            OutputChannel::Primary,
            events_tx,
        ));

        bytes_tx
            .send(b"{\"event\":\"sta".to_vec())
            .await
            .unwrap();
        bytes_tx
            .send(b"rt\"}\n{\"event\":\"done\",\"re".to_vec())
            .await
            .unwrap();
        bytes_tx.send(b"cords\":3}\n".to_vec()).await.unwrap();
        drop(bytes_tx);
        decoder.await.unwrap();

        let first = events_rx.recv().await.unwrap();
        assert_eq!(
            first,
            EngineEvent::Start {
                operation: None,
                message: None,
            }
        );
        let second = events_rx.recv().await.unwrap();
        match second {
            EngineEvent::Done { records, .. } => assert_eq!(records, Some(3)),
            other => panic!("Expected Done, got {other:?}"),
        }
        assert!(events_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn decode_channel_flushes_unterminated_tail() {
        let (bytes_tx, bytes_rx) = mpsc::channel(8);
        let (events_tx, mut events_rx) = mpsc::channel(8);
        let decoder = tokio::spawn(decode_channel(
            bytes_rx,
            OutputChannel::Diagnostic,
            events_tx,
        ));

        bytes_tx.send(b"half a line".to_vec()).await.unwrap();
        drop(bytes_tx);
        decoder.await.unwrap();

        assert_eq!(
            events_rx.recv().await.unwrap(),
            EngineEvent::Stderr {
                message: "half a line".to_string(),
            }
        );
        assert!(events_rx.recv().await.is_none());
    }
}
