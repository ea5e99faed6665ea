//! Broadcast fan-out.
//!
//! Delivers authoritative results to the sessions of a document through
//! their bounded outbound queues. Delivery never blocks; a session whose
//! queue cannot take the message is reported back to the caller for
//! disconnection.

use crate::session::{Delivery, SessionRegistry};
use coscribe_protocol::{DocId, Operation, ServerMessage, UserId};
use std::sync::Arc;
use tracing::warn;

/// Fans server messages out to the sessions of a document.
#[derive(Debug)]
pub struct Broadcaster {
    registry: Arc<SessionRegistry>,
}

impl Broadcaster {
    /// Creates a broadcaster over the given registry.
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// Delivers an applied operation to every session on the document,
    /// the originator included, and advances each reached session's
    /// acknowledged version to `version`.
    ///
    /// Returns the users whose queues could not take the message; the
    /// caller must disconnect them.
    pub fn broadcast_applied(&self, doc_id: &DocId, op: Operation, version: u64) -> Vec<UserId> {
        let mut failed = Vec::new();
        for user in self.registry.users_on(doc_id) {
            let msg = ServerMessage::Edit {
                op: op.clone(),
                version,
            };
            match self.registry.deliver(&user, msg) {
                Delivery::Sent => self.registry.record_ack(&user, version),
                outcome => {
                    warn!(user = %user, doc = %doc_id, ?outcome, "broadcast delivery failed");
                    failed.push(user);
                }
            }
        }
        failed
    }

    /// Delivers a notification to every session on the document except
    /// `exclude`. Returns the users whose queues could not take it.
    pub fn notify_peers(
        &self,
        doc_id: &DocId,
        msg: &ServerMessage,
        exclude: &UserId,
    ) -> Vec<UserId> {
        let mut failed = Vec::new();
        for user in self.registry.users_on(doc_id) {
            if user == *exclude {
                continue;
            }
            match self.registry.deliver(&user, msg.clone()) {
                Delivery::Sent => {}
                outcome => {
                    warn!(user = %user, doc = %doc_id, ?outcome, "peer notification failed");
                    failed.push(user);
                }
            }
        }
        failed
    }

    /// Acknowledges a dropped stale operation to its originator only,
    /// advancing its acknowledged version once the message is queued.
    ///
    /// Returns the user back when the queue could not take the
    /// acknowledgment; the caller must disconnect it. Leaving the
    /// session acknowledged at `version` without the message would let
    /// the client keep its dropped optimistic edit.
    pub fn acknowledge_stale(&self, user_id: &UserId, version: u64) -> Option<UserId> {
        match self
            .registry
            .deliver(user_id, ServerMessage::StaleOperation { version })
        {
            Delivery::Sent => {
                self.registry.record_ack(user_id, version);
                None
            }
            outcome => {
                warn!(user = %user_id, ?outcome, "stale acknowledgment failed");
                Some(user_id.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Arc<SessionRegistry>, Broadcaster) {
        let registry = Arc::new(SessionRegistry::new(4));
        let broadcaster = Broadcaster::new(Arc::clone(&registry));
        (registry, broadcaster)
    }

    fn edit(version: u64) -> Operation {
        Operation::insert_char(0, 0, 'x', UserId::new(format!("author-{version}")))
    }

    #[test]
    fn applied_broadcast_reaches_all_sessions_and_acks() {
        let (registry, broadcaster) = setup();
        let doc = DocId::new("d");
        let (mut rx_a, _) = registry.register(UserId::new("a"), doc.clone(), 0);
        let (mut rx_b, _) = registry.register(UserId::new("b"), doc.clone(), 0);

        let failed = broadcaster.broadcast_applied(&doc, edit(1), 1);
        assert!(failed.is_empty());

        assert!(matches!(
            rx_a.try_recv().unwrap(),
            ServerMessage::Edit { version: 1, .. }
        ));
        assert!(matches!(
            rx_b.try_recv().unwrap(),
            ServerMessage::Edit { version: 1, .. }
        ));
        assert_eq!(registry.min_acked(&doc), Some(1));
    }

    #[test]
    fn overflowed_session_is_reported() {
        let registry = Arc::new(SessionRegistry::new(1));
        let broadcaster = Broadcaster::new(Arc::clone(&registry));
        let doc = DocId::new("d");
        let (_rx_a, _) = registry.register(UserId::new("a"), doc.clone(), 0);

        assert!(broadcaster.broadcast_applied(&doc, edit(1), 1).is_empty());
        let failed = broadcaster.broadcast_applied(&doc, edit(2), 2);
        assert_eq!(failed, vec![UserId::new("a")]);

        // The unreachable session's acknowledgment stays where it was.
        assert_eq!(registry.min_acked(&doc), Some(1));
    }

    #[test]
    fn peer_notifications_skip_the_subject() {
        let (registry, broadcaster) = setup();
        let doc = DocId::new("d");
        let (mut rx_a, _) = registry.register(UserId::new("a"), doc.clone(), 0);
        let (mut rx_b, _) = registry.register(UserId::new("b"), doc.clone(), 0);

        let msg = ServerMessage::PeerLeft {
            user_id: UserId::new("a"),
        };
        let failed = broadcaster.notify_peers(&doc, &msg, &UserId::new("a"));
        assert!(failed.is_empty());

        assert!(rx_a.try_recv().is_err());
        assert_eq!(rx_b.try_recv().unwrap(), msg);
    }

    #[test]
    fn stale_ack_is_originator_only() {
        let (registry, broadcaster) = setup();
        let doc = DocId::new("d");
        let (mut rx_a, _) = registry.register(UserId::new("a"), doc.clone(), 0);
        let (mut rx_b, _) = registry.register(UserId::new("b"), doc.clone(), 0);

        assert!(broadcaster.acknowledge_stale(&UserId::new("a"), 4).is_none());

        assert_eq!(
            rx_a.try_recv().unwrap(),
            ServerMessage::StaleOperation { version: 4 }
        );
        assert!(rx_b.try_recv().is_err());
        assert_eq!(registry.session_view(&UserId::new("a")).unwrap().1, 4);
    }

    #[test]
    fn undeliverable_stale_ack_reports_the_session_and_keeps_its_ack() {
        let registry = Arc::new(SessionRegistry::new(1));
        let broadcaster = Broadcaster::new(Arc::clone(&registry));
        let doc = DocId::new("d");
        let user = UserId::new("a");
        let (_rx, _) = registry.register(user.clone(), doc, 2);

        // Occupy the only queue slot, then try to acknowledge.
        assert_eq!(
            registry.deliver(&user, ServerMessage::SessionReplaced),
            Delivery::Sent
        );
        assert_eq!(broadcaster.acknowledge_stale(&user, 5), Some(user.clone()));

        // The session was not acknowledged past what it actually saw.
        assert_eq!(registry.session_view(&user).unwrap().1, 2);
    }
}
