//! Request validation errors.

use thiserror::Error;

use crate::job::OperationKind;

/// A structurally incomplete or inconsistent [`JobRequest`].
///
/// Raised before any engine contact, so a request that fails validation
/// never spawns a process or opens a connection.
///
/// [`JobRequest`]: crate::job::JobRequest
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The request names no input files at all.
    #[error("{operation} requires at least one input file")]
    NoInputs { operation: OperationKind },

    /// A single-input operation was given several inputs.
    #[error("{operation} takes exactly one input file (got {count})")]
    ExtraInputs {
        operation: OperationKind,
        count: usize,
    },

    /// Convert and merge write to a file, split to a directory.
    #[error("{operation} requires an output path")]
    MissingOutput { operation: OperationKind },

    /// Convert and merge must name the target record format.
    #[error("{operation} requires a target format")]
    MissingFormat { operation: OperationKind },

    /// Split needs a positive records-per-chunk count.
    #[error("split chunk size must be a positive record count")]
    InvalidChunkSize,
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_operation() {
        let err = ValidationError::MissingOutput {
            operation: OperationKind::Merge,
        };
        assert_eq!(err.to_string(), "merge requires an output path");

        let err = ValidationError::ExtraInputs {
            operation: OperationKind::Count,
            count: 3,
        };
        assert_eq!(err.to_string(), "count takes exactly one input file (got 3)");
    }
}
