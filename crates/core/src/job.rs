//! Job request model for the four batch operations.
//!
//! A [`JobRequest`] captures everything needed to run one engine job:
//! the operation, its input files, and the operation-specific knobs
//! (output destination, record format, chunk size). Build requests
//! through the per-operation constructors and check them with
//! [`JobRequest::validate`] before anything touches a transport.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The four batch operations the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Count,
    Convert,
    Split,
    Merge,
}

impl OperationKind {
    /// Engine subcommand name for this operation.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Count => "count",
            OperationKind::Convert => "convert",
            OperationKind::Split => "split",
            OperationKind::Merge => "merge",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record serialization formats the engine can read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordFormat {
    /// ISO 2709 binary records (`.mrc`).
    #[serde(rename = "mrc")]
    Binary,
    /// Line-oriented mnemonic text (`.mrk`).
    #[serde(rename = "mrk")]
    Mnemonic,
    /// MARCXML collections (`.xml`).
    #[serde(rename = "marcxml")]
    Xml,
}

impl RecordFormat {
    /// Wire tag used on the engine command line and in multipart forms.
    pub fn as_tag(&self) -> &'static str {
        match self {
            RecordFormat::Binary => "mrc",
            RecordFormat::Mnemonic => "mrk",
            RecordFormat::Xml => "marcxml",
        }
    }
}

impl fmt::Display for RecordFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// A fully described request for one engine job.
///
/// Fields are public for inspection but requests are meant to be built
/// with [`count`](Self::count), [`convert`](Self::convert),
/// [`split`](Self::split), and [`merge`](Self::merge). The same request
/// maps deterministically onto either transport flavor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    /// Which batch operation to run.
    pub operation: OperationKind,
    /// Input record files, in order. Count, convert, and split take
    /// exactly one; merge takes one or more.
    pub inputs: Vec<PathBuf>,
    /// Output file (convert, merge) or output directory (split).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    /// Target record format. Required for convert and merge; optional
    /// for split, where the engine keeps the input format when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<RecordFormat>,
    /// Records per output chunk (split only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<u64>,
}

impl JobRequest {
    /// Count the records in `input`.
    pub fn count(input: impl Into<PathBuf>) -> Self {
        Self {
            operation: OperationKind::Count,
            inputs: vec![input.into()],
            output: None,
            format: None,
            chunk_size: None,
        }
    }

    /// Convert `input` to `format`, writing the result to `output`.
    pub fn convert(
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        format: RecordFormat,
    ) -> Self {
        Self {
            operation: OperationKind::Convert,
            inputs: vec![input.into()],
            output: Some(output.into()),
            format: Some(format),
            chunk_size: None,
        }
    }

    /// Split `input` into chunks of `chunk_size` records under `out_dir`.
    pub fn split(
        input: impl Into<PathBuf>,
        out_dir: impl Into<PathBuf>,
        chunk_size: u64,
    ) -> Self {
        Self {
            operation: OperationKind::Split,
            inputs: vec![input.into()],
            output: Some(out_dir.into()),
            format: None,
            chunk_size: Some(chunk_size),
        }
    }

    /// Merge `inputs` into a single `output` in `format`.
    pub fn merge<I, P>(inputs: I, output: impl Into<PathBuf>, format: RecordFormat) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            operation: OperationKind::Merge,
            inputs: inputs.into_iter().map(Into::into).collect(),
            output: Some(output.into()),
            format: Some(format),
            chunk_size: None,
        }
    }

    /// Re-encode split chunks as `format` instead of the input format.
    pub fn with_format(mut self, format: RecordFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Check that the request is structurally complete for its operation.
    ///
    /// Runs before any transport work; a request that fails here never
    /// spawns a process or opens a connection.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.inputs.is_empty() {
            return Err(ValidationError::NoInputs {
                operation: self.operation,
            });
        }
        if self.operation != OperationKind::Merge && self.inputs.len() != 1 {
            return Err(ValidationError::ExtraInputs {
                operation: self.operation,
                count: self.inputs.len(),
            });
        }
        match self.operation {
            OperationKind::Count => {}
            OperationKind::Convert | OperationKind::Merge => {
                if self.output.is_none() {
                    return Err(ValidationError::MissingOutput {
                        operation: self.operation,
                    });
                }
                if self.format.is_none() {
                    return Err(ValidationError::MissingFormat {
                        operation: self.operation,
                    });
                }
            }
            OperationKind::Split => {
                if self.output.is_none() {
                    return Err(ValidationError::MissingOutput {
                        operation: self.operation,
                    });
                }
                if !self.chunk_size.is_some_and(|n| n > 0) {
                    return Err(ValidationError::InvalidChunkSize);
                }
            }
        }
        Ok(())
    }
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    // -- wire tags --

    #[test]
    fn operation_names_match_engine_subcommands() {
        assert_eq!(OperationKind::Count.to_string(), "count");
        assert_eq!(OperationKind::Convert.to_string(), "convert");
        assert_eq!(OperationKind::Split.to_string(), "split");
        assert_eq!(OperationKind::Merge.to_string(), "merge");
    }

    #[test]
    fn format_tags_match_engine_vocabulary() {
        assert_eq!(RecordFormat::Binary.as_tag(), "mrc");
        assert_eq!(RecordFormat::Mnemonic.as_tag(), "mrk");
        assert_eq!(RecordFormat::Xml.as_tag(), "marcxml");
    }

    #[test]
    fn format_serializes_to_wire_tag() {
        assert_eq!(
            serde_json::to_string(&RecordFormat::Xml).unwrap(),
            "\"marcxml\""
        );
        let parsed: RecordFormat = serde_json::from_str("\"mrk\"").unwrap();
        assert_eq!(parsed, RecordFormat::Mnemonic);
    }

    // -- constructors --

    #[test]
    fn constructors_build_valid_requests() {
        assert!(JobRequest::count("a.mrc").validate().is_ok());
        assert!(JobRequest::convert("a.mrc", "a.xml", RecordFormat::Xml)
            .validate()
            .is_ok());
        assert!(JobRequest::split("a.mrc", "out", 100).validate().is_ok());
        assert!(
            JobRequest::merge(["a.mrc", "b.mrc"], "all.mrc", RecordFormat::Binary)
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn split_format_override_survives() {
        let request = JobRequest::split("a.mrc", "out", 50).with_format(RecordFormat::Mnemonic);
        assert_eq!(request.format, Some(RecordFormat::Mnemonic));
        assert!(request.validate().is_ok());
    }

    // -- validation --

    #[test]
    fn merge_with_no_inputs_rejected() {
        let request = JobRequest::merge(
            Vec::<std::path::PathBuf>::new(),
            "all.mrc",
            RecordFormat::Binary,
        );
        assert_eq!(
            request.validate(),
            Err(ValidationError::NoInputs {
                operation: OperationKind::Merge
            })
        );
    }

    #[test]
    fn merge_with_single_input_accepted() {
        let request = JobRequest::merge(["only.mrc"], "all.mrc", RecordFormat::Binary);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn count_with_extra_inputs_rejected() {
        let mut request = JobRequest::count("a.mrc");
        request.inputs.push("b.mrc".into());
        assert_eq!(
            request.validate(),
            Err(ValidationError::ExtraInputs {
                operation: OperationKind::Count,
                count: 2
            })
        );
    }

    #[test]
    fn zero_chunk_size_rejected() {
        let request = JobRequest::split("a.mrc", "out", 0);
        assert_eq!(request.validate(), Err(ValidationError::InvalidChunkSize));
    }

    #[test]
    fn absent_chunk_size_rejected() {
        let mut request = JobRequest::split("a.mrc", "out", 10);
        request.chunk_size = None;
        assert_eq!(request.validate(), Err(ValidationError::InvalidChunkSize));
    }

    #[test]
    fn convert_without_format_rejected() {
        let mut request = JobRequest::convert("a.mrc", "a.xml", RecordFormat::Xml);
        request.format = None;
        assert_eq!(
            request.validate(),
            Err(ValidationError::MissingFormat {
                operation: OperationKind::Convert
            })
        );
    }

    #[test]
    fn merge_without_output_rejected() {
        let mut request = JobRequest::merge(["a.mrc"], "all.mrc", RecordFormat::Binary);
        request.output = None;
        assert_eq!(
            request.validate(),
            Err(ValidationError::MissingOutput {
                operation: OperationKind::Merge
            })
        );
    }
}
