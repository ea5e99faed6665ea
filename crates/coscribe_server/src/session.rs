//! Session registry.
//!
//! Tracks which user is connected to which document, the version last
//! acknowledged to each session, and the bounded outbound queue the
//! transport drains for that session.

use coscribe_protocol::{DocId, ServerMessage, UserId};
use parking_lot::RwLock;
use std::collections::HashMap;
use tokio::sync::mpsc;

/// The receiving half of a session's outbound queue. The transport
/// layer owns it and drains it to the wire.
pub type SessionReceiver = mpsc::Receiver<ServerMessage>;

/// Outcome of a queue delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The message was queued.
    Sent,
    /// The queue was full; the session must be disconnected.
    Overflowed,
    /// The receiving half is gone; the session is dead.
    Closed,
}

/// The sending half of a session displaced by a duplicate connect,
/// detached from the registry so the close notice can still reach it.
#[derive(Debug)]
pub struct DisplacedSession {
    /// Document the displaced session was on.
    pub doc_id: DocId,
    outbound: mpsc::Sender<ServerMessage>,
}

impl DisplacedSession {
    /// Queues the session-replaced close notice. Best effort: a full or
    /// closed queue means the old transport is gone anyway.
    pub fn notify_replaced(&self) {
        let _ = self.outbound.try_send(ServerMessage::SessionReplaced);
    }
}

#[derive(Debug)]
struct SessionState {
    doc_id: DocId,
    last_acked: u64,
    outbound: mpsc::Sender<ServerMessage>,
}

/// Registry of active sessions, one at most per user.
///
/// Also the keeper of each session's `last_acked` version: edit messages
/// carry no base-version field, so the version last acknowledged to a
/// session is what its next operation's positions are assumed to be
/// computed against.
#[derive(Debug)]
pub struct SessionRegistry {
    queue_capacity: usize,
    sessions: RwLock<HashMap<UserId, SessionState>>,
}

impl SessionRegistry {
    /// Creates a registry whose session queues hold `queue_capacity`
    /// messages.
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            queue_capacity,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a session for `user_id` on `doc_id`, acknowledged up to
    /// `last_acked`. Returns the queue receiver for the transport and,
    /// if the user already had a session, its displaced sending half.
    pub fn register(
        &self,
        user_id: UserId,
        doc_id: DocId,
        last_acked: u64,
    ) -> (SessionReceiver, Option<DisplacedSession>) {
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let state = SessionState {
            doc_id,
            last_acked,
            outbound: tx,
        };
        let displaced = self
            .sessions
            .write()
            .insert(user_id, state)
            .map(|old| DisplacedSession {
                doc_id: old.doc_id,
                outbound: old.outbound,
            });
        (rx, displaced)
    }

    /// Removes the user's session, returning the document it was on.
    pub fn remove(&self, user_id: &UserId) -> Option<DocId> {
        self.sessions.write().remove(user_id).map(|s| s.doc_id)
    }

    /// Returns the document and acknowledged version of the user's
    /// session.
    pub fn session_view(&self, user_id: &UserId) -> Option<(DocId, u64)> {
        self.sessions
            .read()
            .get(user_id)
            .map(|s| (s.doc_id.clone(), s.last_acked))
    }

    /// Advances the session's acknowledged version. Never moves it
    /// backwards.
    pub fn record_ack(&self, user_id: &UserId, version: u64) {
        if let Some(session) = self.sessions.write().get_mut(user_id) {
            if version > session.last_acked {
                session.last_acked = version;
            }
        }
    }

    /// Returns the users with a session on `doc_id`.
    pub fn users_on(&self, doc_id: &DocId) -> Vec<UserId> {
        self.sessions
            .read()
            .iter()
            .filter(|(_, s)| s.doc_id == *doc_id)
            .map(|(user, _)| user.clone())
            .collect()
    }

    /// The lowest acknowledged version across the document's sessions.
    /// History at or below it can no longer be a transform base.
    pub fn min_acked(&self, doc_id: &DocId) -> Option<u64> {
        self.sessions
            .read()
            .values()
            .filter(|s| s.doc_id == *doc_id)
            .map(|s| s.last_acked)
            .min()
    }

    /// Attempts to queue a message for the user's session without
    /// blocking.
    pub fn deliver(&self, user_id: &UserId, msg: ServerMessage) -> Delivery {
        let Some(tx) = self
            .sessions
            .read()
            .get(user_id)
            .map(|s| s.outbound.clone())
        else {
            return Delivery::Closed;
        };
        match tx.try_send(msg) {
            Ok(()) => Delivery::Sent,
            Err(mpsc::error::TrySendError::Full(_)) => Delivery::Overflowed,
            Err(mpsc::error::TrySendError::Closed(_)) => Delivery::Closed,
        }
    }

    /// Returns the number of active sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Returns true if no sessions are active.
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(4)
    }

    #[test]
    fn register_and_view() {
        let reg = registry();
        let (_rx, displaced) = reg.register(UserId::new("alice"), DocId::new("d"), 3);

        assert!(displaced.is_none());
        assert_eq!(
            reg.session_view(&UserId::new("alice")),
            Some((DocId::new("d"), 3))
        );
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn duplicate_register_displaces_prior_session() {
        let reg = registry();
        let (mut old_rx, _) = reg.register(UserId::new("alice"), DocId::new("d1"), 0);
        let (_new_rx, displaced) = reg.register(UserId::new("alice"), DocId::new("d2"), 0);

        let displaced = displaced.unwrap();
        assert_eq!(displaced.doc_id, DocId::new("d1"));

        displaced.notify_replaced();
        assert_eq!(old_rx.try_recv().unwrap(), ServerMessage::SessionReplaced);

        // Only the new session remains addressable.
        assert_eq!(
            reg.session_view(&UserId::new("alice")),
            Some((DocId::new("d2"), 0))
        );
    }

    #[test]
    fn ack_never_regresses() {
        let reg = registry();
        let user = UserId::new("alice");
        let (_rx, _) = reg.register(user.clone(), DocId::new("d"), 5);

        reg.record_ack(&user, 9);
        reg.record_ack(&user, 2);
        assert_eq!(reg.session_view(&user), Some((DocId::new("d"), 9)));
    }

    #[test]
    fn min_acked_spans_one_document() {
        let reg = registry();
        let (_a, _) = reg.register(UserId::new("a"), DocId::new("d"), 7);
        let (_b, _) = reg.register(UserId::new("b"), DocId::new("d"), 3);
        let (_c, _) = reg.register(UserId::new("c"), DocId::new("other"), 1);

        assert_eq!(reg.min_acked(&DocId::new("d")), Some(3));
        assert_eq!(reg.min_acked(&DocId::new("missing")), None);
    }

    #[test]
    fn delivery_outcomes() {
        let reg = SessionRegistry::new(1);
        let user = UserId::new("alice");
        let (mut rx, _) = reg.register(user.clone(), DocId::new("d"), 0);

        assert_eq!(
            reg.deliver(&user, ServerMessage::StaleOperation { version: 1 }),
            Delivery::Sent
        );
        assert_eq!(
            reg.deliver(&user, ServerMessage::StaleOperation { version: 2 }),
            Delivery::Overflowed
        );

        rx.try_recv().unwrap();
        drop(rx);
        assert_eq!(
            reg.deliver(&user, ServerMessage::StaleOperation { version: 3 }),
            Delivery::Closed
        );

        assert_eq!(
            reg.deliver(&UserId::new("ghost"), ServerMessage::SessionReplaced),
            Delivery::Closed
        );
    }
}
