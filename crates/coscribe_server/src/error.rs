//! Error types for the collaboration server.

use coscribe_engine::EngineError;
use coscribe_protocol::{DocId, ErrorKind, UserId};
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur while handling a client message.
///
/// All of them are recoverable at single-message granularity; none
/// corrupts a document or another user's session.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The user has no active session.
    #[error("no active session for user {0}")]
    NotConnected(UserId),

    /// A session points at a document that is not open. Sessions and
    /// documents are registered together, so this is an internal
    /// consistency failure, not a client mistake.
    #[error("document {0} is not open")]
    UnknownDocument(DocId),

    /// The message was not valid JSON for the client vocabulary.
    #[error("malformed message: {0}")]
    Malformed(String),

    /// The sequencer rejected the operation.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl ServerError {
    /// Returns true if the fault lies with the client.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServerError::NotConnected(_) | ServerError::Malformed(_) | ServerError::Engine(_)
        )
    }

    /// Classification carried in the error notification to the client.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServerError::NotConnected(_) => ErrorKind::NotConnected,
            ServerError::Engine(EngineError::OutOfBounds(_)) => ErrorKind::OutOfBounds,
            ServerError::Engine(EngineError::VersionUnavailable { .. }) => {
                ErrorKind::VersionUnavailable
            }
            ServerError::Engine(EngineError::FutureBaseVersion { .. })
            | ServerError::Malformed(_)
            | ServerError::UnknownDocument(_) => ErrorKind::Protocol,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coscribe_core::CoreError;

    #[test]
    fn error_classification() {
        assert!(ServerError::NotConnected(UserId::new("u")).is_client_error());
        assert!(ServerError::Malformed("not json".into()).is_client_error());
        assert!(!ServerError::UnknownDocument(DocId::new("d")).is_client_error());
    }

    #[test]
    fn error_kinds() {
        let oob: ServerError = EngineError::from(CoreError::LineOutOfBounds {
            line_idx: 9,
            line_count: 1,
        })
        .into();
        assert_eq!(oob.kind(), ErrorKind::OutOfBounds);

        let unavailable: ServerError = EngineError::VersionUnavailable { base: 1, oldest: 5 }.into();
        assert_eq!(unavailable.kind(), ErrorKind::VersionUnavailable);

        assert_eq!(
            ServerError::NotConnected(UserId::new("u")).kind(),
            ErrorKind::NotConnected
        );
    }
}
