//! Error types for the document model.

use thiserror::Error;

/// Result type for document operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur when applying an operation to a document.
///
/// Every variant is an out-of-bounds position: the document is left
/// untouched and positions are never silently clamped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The line index does not address an existing line.
    #[error("line {line_idx} out of bounds for document with {line_count} lines")]
    LineOutOfBounds {
        /// Requested line.
        line_idx: usize,
        /// Number of lines in the document.
        line_count: usize,
    },

    /// The column index does not address a valid position on the line.
    #[error("column {column_idx} out of bounds on line {line_idx} of length {line_len}")]
    ColumnOutOfBounds {
        /// Target line.
        line_idx: usize,
        /// Requested column.
        column_idx: usize,
        /// Character length of the line.
        line_len: usize,
    },

    /// Line-break deletion addressed the last line, which has no
    /// following line to merge.
    #[error("cannot delete line break at line {line_idx}: it is the last line")]
    NoFollowingLine {
        /// Requested line.
        line_idx: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CoreError::ColumnOutOfBounds {
            line_idx: 2,
            column_idx: 9,
            line_len: 4,
        };
        let msg = err.to_string();
        assert!(msg.contains("column 9"));
        assert!(msg.contains("line 2"));
        assert!(msg.contains("length 4"));
    }
}
