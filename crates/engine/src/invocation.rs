//! Deterministic mapping from a validated request to engine arguments.
//!
//! The same [`JobRequest`] always produces the same invocation: a
//! [`CommandInvocation`] (argv) for the process transport, or a
//! [`MultipartInvocation`] (route + form fields) for the HTTP service.
//! Both builders are pure and perform no I/O.

use std::path::{Path, PathBuf};

use marcbench_core::{JobRequest, OperationKind, RecordFormat, ValidationError};

/// Argument vector for the engine CLI, ready for `Command::args`.
///
/// The subcommand is the first element; the engine program itself is
/// the transport's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    pub args: Vec<String>,
}

impl CommandInvocation {
    /// Build the exact argv for `request`, validating it first.
    pub fn build(request: &JobRequest) -> Result<Self, ValidationError> {
        request.validate()?;

        let mut args = vec![request.operation.as_str().to_string()];
        match request.operation {
            OperationKind::Count => {
                args.push(single_input(request)?);
            }
            OperationKind::Convert => {
                args.push(single_input(request)?);
                args.push("-o".to_string());
                args.push(required_output(request)?);
                args.push("--to".to_string());
                args.push(required_format(request)?.as_tag().to_string());
            }
            OperationKind::Split => {
                args.push("--every".to_string());
                args.push(required_chunk_size(request)?.to_string());
                args.push(single_input(request)?);
                args.push("--out-dir".to_string());
                args.push(required_output(request)?);
                if let Some(format) = request.format {
                    args.push("--to".to_string());
                    args.push(format.as_tag().to_string());
                }
            }
            OperationKind::Merge => {
                for input in &request.inputs {
                    args.push(path_arg(input));
                }
                args.push("-o".to_string());
                args.push(required_output(request)?);
                args.push("--to".to_string());
                args.push(required_format(request)?.as_tag().to_string());
            }
        }
        Ok(Self { args })
    }
}

/// One field of an engine service form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    /// Plain text field.
    Text { name: &'static str, value: String },
    /// File field, uploaded from a local path.
    File { name: &'static str, path: PathBuf },
}

/// Route and form fields for one engine service call.
///
/// The output destination never appears in the form; the service
/// returns the result and the caller decides where it lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartInvocation {
    /// Service route for the operation, e.g. `/split`.
    pub route: &'static str,
    /// Form fields in submission order.
    pub parts: Vec<FormPart>,
}

impl MultipartInvocation {
    /// Build the service call for `request`, validating it first.
    pub fn build(request: &JobRequest) -> Result<Self, ValidationError> {
        request.validate()?;

        let route = match request.operation {
            OperationKind::Count => "/count",
            OperationKind::Convert => "/convert",
            OperationKind::Split => "/split",
            OperationKind::Merge => "/merge",
        };

        let mut parts = Vec::new();
        match request.operation {
            OperationKind::Count => {
                parts.push(FormPart::File {
                    name: "input_file",
                    path: single_input_path(request)?,
                });
            }
            OperationKind::Convert => {
                parts.push(FormPart::File {
                    name: "input_file",
                    path: single_input_path(request)?,
                });
                parts.push(FormPart::Text {
                    name: "to",
                    value: required_format(request)?.as_tag().to_string(),
                });
            }
            OperationKind::Split => {
                parts.push(FormPart::File {
                    name: "input_file",
                    path: single_input_path(request)?,
                });
                parts.push(FormPart::Text {
                    name: "every",
                    value: required_chunk_size(request)?.to_string(),
                });
                if let Some(format) = request.format {
                    parts.push(FormPart::Text {
                        name: "to",
                        value: format.as_tag().to_string(),
                    });
                }
            }
            OperationKind::Merge => {
                for input in &request.inputs {
                    parts.push(FormPart::File {
                        name: "files",
                        path: input.clone(),
                    });
                }
                parts.push(FormPart::Text {
                    name: "to",
                    value: required_format(request)?.as_tag().to_string(),
                });
            }
        }
        Ok(Self { route, parts })
    }
}

// ---- private helpers ----

// Validation has already established these fields; the accessors keep
// the builders total without reaching for unwrap.

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn single_input(request: &JobRequest) -> Result<String, ValidationError> {
    single_input_path(request).map(|p| path_arg(&p))
}

fn single_input_path(request: &JobRequest) -> Result<PathBuf, ValidationError> {
    match request.inputs.as_slice() {
        [input] => Ok(input.clone()),
        [] => Err(ValidationError::NoInputs {
            operation: request.operation,
        }),
        inputs => Err(ValidationError::ExtraInputs {
            operation: request.operation,
            count: inputs.len(),
        }),
    }
}

fn required_output(request: &JobRequest) -> Result<String, ValidationError> {
    request
        .output
        .as_deref()
        .map(path_arg)
        .ok_or(ValidationError::MissingOutput {
            operation: request.operation,
        })
}

fn required_format(request: &JobRequest) -> Result<RecordFormat, ValidationError> {
    request.format.ok_or(ValidationError::MissingFormat {
        operation: request.operation,
    })
}

fn required_chunk_size(request: &JobRequest) -> Result<u64, ValidationError> {
    match request.chunk_size {
        Some(n) if n > 0 => Ok(n),
        _ => Err(ValidationError::InvalidChunkSize),
    }
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */
