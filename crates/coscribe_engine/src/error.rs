//! Error types for the sequencing engine.

use coscribe_core::CoreError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while sequencing an operation.
///
/// Staleness is not an error: a dropped stale operation is the
/// `Submission::Stale` outcome. Errors here are client protocol
/// violations; none of them mutate the document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The position was invalid even after transformation.
    #[error("position out of bounds after transform: {0}")]
    OutOfBounds(#[from] CoreError),

    /// The client's base version predates the retained history, so the
    /// backlog needed for transformation is gone.
    #[error("base version {base} is no longer available (oldest retained {oldest})")]
    VersionUnavailable {
        /// Base version the submit was made against.
        base: u64,
        /// Oldest version still covered by the history.
        oldest: u64,
    },

    /// The client claimed a base version the document has not reached.
    #[error("base version {base} is ahead of document version {current}")]
    FutureBaseVersion {
        /// Base version the submit was made against.
        base: u64,
        /// Current document version.
        current: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = EngineError::VersionUnavailable { base: 3, oldest: 10 };
        let msg = err.to_string();
        assert!(msg.contains("3"));
        assert!(msg.contains("10"));
    }

    #[test]
    fn core_error_converts() {
        let core = CoreError::LineOutOfBounds {
            line_idx: 5,
            line_count: 1,
        };
        let err: EngineError = core.into();
        assert!(matches!(err, EngineError::OutOfBounds(_)));
    }
}
