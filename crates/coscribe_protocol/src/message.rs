//! Protocol messages exchanged with clients.

use crate::id::{DocId, UserId};
use crate::operation::Operation;
use serde::{Deserialize, Serialize};

/// A message received from a connected client.
///
/// The vocabulary is closed: a connection handshake (`CONNECT`), an
/// explicit teardown (`DISCONNECT`), and the five edit operations. The
/// wire encoding is a JSON object tagged by `type` with camelCase fields.
///
/// Note that edit messages carry no base-version field: a client cannot
/// declare which server state its positions were computed against. The
/// server infers it as the version last acknowledged to that client's
/// session (see `coscribe_server`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Join a document, creating it if it does not exist.
    #[serde(rename = "CONNECT", rename_all = "camelCase")]
    Connect {
        /// Joining user.
        user_id: UserId,
        /// Document to open.
        doc_id: DocId,
    },

    /// Leave the current document.
    #[serde(rename = "DISCONNECT", rename_all = "camelCase")]
    Disconnect {
        /// Departing user.
        user_id: UserId,
    },

    /// Insert one character.
    #[serde(rename = "INSERT_CHAR", rename_all = "camelCase")]
    InsertChar {
        /// Target line.
        line_idx: usize,
        /// Insertion column.
        column_idx: usize,
        /// The character to insert.
        #[serde(rename = "char")]
        ch: char,
        /// Originating user.
        user_id: UserId,
    },

    /// Insert a line break.
    #[serde(rename = "INSERT_LINE_BRK", rename_all = "camelCase")]
    InsertLineBreak {
        /// Target line.
        line_idx: usize,
        /// Split column.
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

    /// Delete a line break.
    #[serde(rename = "DELETE_LINE_BRK", rename_all = "camelCase")]
    DeleteLineBreak {
        /// The line absorbing its successor.
        line_idx: usize,
        /// Originating user.
        user_id: UserId,
    },

    /// Rename the document.
    #[serde(rename = "CHANGE_DOC_NAME", rename_all = "camelCase")]
    ChangeDocName {
        /// The new document name.
        new_name: String,
        /// Originating user.
        user_id: UserId,
    },
}

impl ClientMessage {
    /// Decodes a client message from its JSON wire form.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Encodes the message to its JSON wire form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Returns the user the message is correlated to.
    pub fn user_id(&self) -> &UserId {
        match self {
            ClientMessage::Connect { user_id, .. }
            | ClientMessage::Disconnect { user_id }
            | ClientMessage::InsertChar { user_id, .. }
            | ClientMessage::InsertLineBreak { user_id, .. }
            | ClientMessage::DeleteChar { user_id, .. }
            | ClientMessage::DeleteLineBreak { user_id, .. }
            | ClientMessage::ChangeDocName { user_id, .. } => user_id,
        }
    }

    /// Converts an edit message into its operation.
    ///
    /// Returns `None` for `CONNECT` and `DISCONNECT`, which address the
    /// session rather than the document content.
    pub fn into_operation(self) -> Option<Operation> {
        match self {
            ClientMessage::Connect { .. } | ClientMessage::Disconnect { .. } => None,
            ClientMessage::InsertChar {
                line_idx,
                column_idx,
                ch,
                user_id,
            } => Some(Operation::insert_char(line_idx, column_idx, ch, user_id)),
            ClientMessage::InsertLineBreak {
                line_idx,
                column_idx,
                user_id,
            } => Some(Operation::insert_line_break(line_idx, column_idx, user_id)),
            ClientMessage::DeleteChar {
                line_idx,
                column_idx,
                user_id,
            } => Some(Operation::delete_char(line_idx, column_idx, user_id)),
            ClientMessage::DeleteLineBreak { line_idx, user_id } => {
                Some(Operation::delete_line_break(line_idx, user_id))
            }
            ClientMessage::ChangeDocName { new_name, user_id } => {
                Some(Operation::change_doc_name(new_name, user_id))
            }
        }
    }
}

/// Document fields carried in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    /// Document identifier.
    pub id: DocId,
    /// Current display name.
    pub name: String,
    /// Flattened text with line breaks embedded.
    pub content: String,
}

/// User fields carried in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// User identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
}

/// The full-state answer to a successful `CONNECT`.
///
/// A point-in-time copy, not a reference: the `content` string is
/// decoupled from any future document mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    /// The opened document.
    pub document: DocumentInfo,
    /// The joining user.
    pub user: UserInfo,
}

/// Classification of a rejected client message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Position invalid even after transformation.
    OutOfBounds,
    /// No active session for the user.
    NotConnected,
    /// The session's base version predates retained history.
    VersionUnavailable,
    /// Message could not be interpreted.
    Protocol,
}

/// A message sent to connected clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Snapshot answer to a successful `CONNECT`.
    #[serde(rename = "CONNECT_ANSWER")]
    ConnectAnswer(DocumentSnapshot),

    /// An applied, authoritative operation, rebroadcast to every session
    /// on the document (including the originator, with corrected
    /// coordinates).
    #[serde(rename = "OPERATION", rename_all = "camelCase")]
    Edit {
        /// The transformed operation as applied.
        op: Operation,
        /// Document version after application.
        version: u64,
    },

    /// A peer joined the document.
    #[serde(rename = "PEER_JOINED", rename_all = "camelCase")]
    PeerJoined {
        /// The joining peer.
        user: UserInfo,
    },

    /// A peer left the document.
    #[serde(rename = "PEER_LEFT", rename_all = "camelCase")]
    PeerLeft {
        /// The departing peer.
        user_id: UserId,
    },

    /// Originator-only acknowledgment of a dropped stale operation.
    #[serde(rename = "STALE_OPERATION", rename_all = "camelCase")]
    StaleOperation {
        /// Current document version; the client should rebase on it.
        version: u64,
    },

    /// Originator-only rejection notice.
    #[serde(rename = "ERROR", rename_all = "camelCase")]
    Error {
        /// Rejection classification.
        kind: ErrorKind,
        /// Human-readable detail.
        message: String,
    },

    /// Sent to a session displaced by a duplicate `CONNECT`.
    #[serde(rename = "SESSION_REPLACED")]
    SessionReplaced,
}

impl ServerMessage {
    /// Decodes a server message from its JSON wire form.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Encodes the message to its JSON wire form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
