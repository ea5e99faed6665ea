//! Edit operations.

use crate::id::UserId;
use serde::{Deserialize, Serialize};

/// A single atomic edit intent.
///
/// `Operation` is the unit of transformation and broadcast. Values are
/// immutable once constructed; position transformation produces a new
/// operation rather than mutating in place.
///
/// Positions are line/column addressed: `line_idx` indexes the document's
/// lines, `column_idx` counts characters (Unicode scalar values) within
/// the line. The wire encoding is a JSON object tagged by `type`, matching
/// the inbound client vocabulary byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Operation {
    /// Insert one character, shifting later characters on the line right.
    #[serde(rename = "INSERT_CHAR", rename_all = "camelCase")]
    InsertChar {
        /// Target line.
        line_idx: usize,
        /// Insertion column (characters before the insertion point).
        column_idx: usize,
        /// The character to insert.
        #[serde(rename = "char")]
        ch: char,
        /// Originating user.
        user_id: UserId,
    },

    /// Split a line in two at the given column.
    #[serde(rename = "INSERT_LINE_BRK", rename_all = "camelCase")]
    InsertLineBreak {
        /// Target line.
        line_idx: usize,
        /// Split column; everything at or after it moves to the new line.
        column_idx: usize,
        /// Originating user.
        user_id: UserId,
    },

    /// Delete one character.
    #[serde(rename = "DELETE_CHAR", rename_all = "camelCase")]
    DeleteChar {
        /// Target line.
        line_idx: usize,
        /// Column of the character to delete.
        column_idx: usize,
        /// Originating user.
        user_id: UserId,
    },

    /// Merge line `line_idx + 1` onto the end of line `line_idx`.
    #[serde(rename = "DELETE_LINE_BRK", rename_all = "camelCase")]
    DeleteLineBreak {
        /// The line absorbing its successor.
        line_idx: usize,
        /// Originating user.
        user_id: UserId,
    },

    /// Replace the document's display name.
    #[serde(rename = "CHANGE_DOC_NAME", rename_all = "camelCase")]
    ChangeDocName {
        /// The new document name.
        new_name: String,
        /// Originating user.
        user_id: UserId,
    },
}

impl Operation {
    /// Creates a character insertion.
    pub fn insert_char(line_idx: usize, column_idx: usize, ch: char, user_id: UserId) -> Self {
        Self::InsertChar {
            line_idx,
            column_idx,
            ch,
            user_id,
        }
    }

    /// Creates a line-break insertion.
    pub fn insert_line_break(line_idx: usize, column_idx: usize, user_id: UserId) -> Self {
        Self::InsertLineBreak {
            line_idx,
            column_idx,
            user_id,
        }
    }

    /// Creates a character deletion.
    pub fn delete_char(line_idx: usize, column_idx: usize, user_id: UserId) -> Self {
        Self::DeleteChar {
            line_idx,
            column_idx,
            user_id,
        }
    }

    /// Creates a line-break deletion.
    pub fn delete_line_break(line_idx: usize, user_id: UserId) -> Self {
        Self::DeleteLineBreak { line_idx, user_id }
    }

    /// Creates a document rename.
    pub fn change_doc_name(new_name: impl Into<String>, user_id: UserId) -> Self {
        Self::ChangeDocName {
            new_name: new_name.into(),
            user_id,
        }
    }

    /// Returns the originating user.
    pub fn user_id(&self) -> &UserId {
        match self {
            Operation::InsertChar { user_id, .. }
            | Operation::InsertLineBreak { user_id, .. }
            | Operation::DeleteChar { user_id, .. }
            | Operation::DeleteLineBreak { user_id, .. }
            | Operation::ChangeDocName { user_id, .. } => user_id,
        }
    }

    /// Returns the target line, if the operation is positional.
    pub fn line_idx(&self) -> Option<usize> {
        match self {
            Operation::InsertChar { line_idx, .. }
            | Operation::InsertLineBreak { line_idx, .. }
            | Operation::DeleteChar { line_idx, .. }
            | Operation::DeleteLineBreak { line_idx, .. } => Some(*line_idx),
            Operation::ChangeDocName { .. } => None,
        }
    }

    /// Returns the target column, if the operation carries one.
    pub fn column_idx(&self) -> Option<usize> {
        match self {
            Operation::InsertChar { column_idx, .. }
            | Operation::InsertLineBreak { column_idx, .. }
            | Operation::DeleteChar { column_idx, .. } => Some(*column_idx),
            Operation::DeleteLineBreak { .. } | Operation::ChangeDocName { .. } => None,
        }
    }

    /// Returns true if the operation addresses a position in the text.
    pub fn is_positional(&self) -> bool {
        !matches!(self, Operation::ChangeDocName { .. })
    }

    /// Returns the wire tag for this operation kind.
    pub fn label(&self) -> &'static str {
        match self {
            Operation::InsertChar { .. } => "INSERT_CHAR",
            Operation::InsertLineBreak { .. } => "INSERT_LINE_BRK",
            Operation::DeleteChar { .. } => "DELETE_CHAR",
            Operation::DeleteLineBreak { .. } => "DELETE_LINE_BRK",
            Operation::ChangeDocName { .. } => "CHANGE_DOC_NAME",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserId {
        UserId::new("u1")
    }

    #[test]
    fn insert_char_wire_format() {
        let op = Operation::insert_char(2, 5, 'x', user());
        let json: serde_json::Value = serde_json::to_value(&op).unwrap();

        assert_eq!(json["type"], "INSERT_CHAR");
        assert_eq!(json["lineIdx"], 2);
        assert_eq!(json["columnIdx"], 5);
        assert_eq!(json["char"], "x");
        assert_eq!(json["userId"], "u1");
    }

    #[test]
    fn delete_line_break_wire_format() {
        let op = Operation::delete_line_break(3, user());
        let json: serde_json::Value = serde_json::to_value(&op).unwrap();

        assert_eq!(json["type"], "DELETE_LINE_BRK");
        assert_eq!(json["lineIdx"], 3);
        assert!(json.get("columnIdx").is_none());
    }

    #[test]
    fn change_doc_name_wire_format() {
        let op = Operation::change_doc_name("meeting notes", user());
        let json: serde_json::Value = serde_json::to_value(&op).unwrap();

        assert_eq!(json["type"], "CHANGE_DOC_NAME");
        assert_eq!(json["newName"], "meeting notes");
    }

    #[test]
    fn json_roundtrip() {
        let ops = vec![
            Operation::insert_char(0, 0, 'h', user()),
            Operation::insert_line_break(1, 4, user()),
            Operation::delete_char(0, 2, user()),
            Operation::delete_line_break(0, user()),
            Operation::change_doc_name("renamed", user()),
        ];

        for op in ops {
            let json = serde_json::to_string(&op).unwrap();
            let back: Operation = serde_json::from_str(&json).unwrap();
            assert_eq!(back, op);
        }
    }

    #[test]
    fn accessors() {
        let op = Operation::insert_char(1, 2, 'a', user());
        assert_eq!(op.line_idx(), Some(1));
        assert_eq!(op.column_idx(), Some(2));
        assert!(op.is_positional());
        assert_eq!(op.label(), "INSERT_CHAR");

        let rename = Operation::change_doc_name("n", user());
        assert_eq!(rename.line_idx(), None);
        assert_eq!(rename.column_idx(), None);
        assert!(!rename.is_positional());
    }

    #[test]
    fn parses_client_wire_json() {
        let raw = r#"{"type":"INSERT_CHAR","lineIdx":0,"columnIdx":0,"char":"h","userId":"alice"}"#;
        let op: Operation = serde_json::from_str(raw).unwrap();
        assert_eq!(op, Operation::insert_char(0, 0, 'h', UserId::new("alice")));
    }
}
