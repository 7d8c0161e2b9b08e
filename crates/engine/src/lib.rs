//! Bridge to the external record-processing engine.
//!
//! Maps validated job requests onto the engine, either by spawning its
//! CLI or by calling its HTTP service, and turns the raw byte output
//! into an ordered stream of typed [`EngineEvent`]s plus exactly one
//! completion signal per job.
//!
//! [`EngineEvent`]: events::EngineEvent

pub mod events;
pub mod framing;
pub mod http;
pub mod invocation;
pub mod process;
pub mod transport;

pub use events::{decode_channel, decode_frame, EngineEvent, OutputChannel};
pub use framing::FrameReassembler;
pub use http::HttpTransport;
pub use invocation::{CommandInvocation, FormPart, MultipartInvocation};
pub use process::ProcessTransport;
pub use transport::{Completion, EngineStatus, EngineTransport, LaunchError, LaunchedJob};
