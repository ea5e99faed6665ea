//! The collaboration server facade.

use crate::broadcast::Broadcaster;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::session::{Delivery, SessionReceiver, SessionRegistry};
use coscribe_core::Document;
use coscribe_engine::{DocumentSequencer, Submission};
use coscribe_protocol::{
    ClientMessage, DocId, DocumentInfo, DocumentSnapshot, Operation, ServerMessage, UserId,
    UserInfo,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// The collaboration server.
///
/// Routes decoded client messages through sessions and per-document
/// sequencers, and fans authoritative results back out through the
/// sessions' outbound queues. The transport layer decodes frames into
/// `ClientMessage`, calls `handle_message`, and drains each session's
/// `SessionReceiver` to the wire.
///
/// The document registry lock is held only for lookup, never across a
/// sequencer submit, so documents stay independent under load.
///
/// # Example
///
/// ```
/// use coscribe_protocol::{ClientMessage, DocId, UserId};
/// use coscribe_server::{CollabServer, ServerConfig};
///
/// let server = CollabServer::new(ServerConfig::default());
/// let receiver = server
///     .handle_message(ClientMessage::Connect {
///         user_id: UserId::new("alice"),
///         doc_id: DocId::new("notes"),
///     })
///     .unwrap();
/// assert!(receiver.is_some());
/// ```
pub struct CollabServer {
    config: ServerConfig,
    registry: Arc<SessionRegistry>,
    broadcaster: Broadcaster,
    docs: RwLock<HashMap<DocId, Arc<DocumentSequencer>>>,
}

impl CollabServer {
    /// Creates a server with no open documents.
    pub fn new(config: ServerConfig) -> Self {
        let registry = Arc::new(SessionRegistry::new(config.queue_capacity));
        let broadcaster = Broadcaster::new(Arc::clone(&registry));
        Self {
            config,
            registry,
            broadcaster,
            docs: RwLock::new(HashMap::new()),
        }
    }

    /// Handles one decoded client message.
    ///
    /// `CONNECT` yields the new session's queue receiver for the
    /// transport to drain; everything else yields `None`. A rejected
    /// edit is also reported to the offending session's queue as an
    /// error notification before the error is returned.
    pub fn handle_message(&self, msg: ClientMessage) -> ServerResult<Option<SessionReceiver>> {
        match msg {
            ClientMessage::Connect { user_id, doc_id } => {
                Ok(Some(self.connect(user_id, doc_id)))
            }
            ClientMessage::Disconnect { user_id } => {
                self.disconnect(&user_id)?;
                Ok(None)
            }
            edit => {
                let user_id = edit.user_id().clone();
                let Some(op) = edit.into_operation() else {
                    return Ok(None);
                };
                match self.submit(&user_id, op) {
                    Ok(()) => Ok(None),
                    Err(err) => {
                        if err.is_client_error() {
                            warn!(user = %user_id, %err, "rejecting client operation");
                            let notice = ServerMessage::Error {
                                kind: err.kind(),
                                message: err.to_string(),
                            };
                            if self.registry.deliver(&user_id, notice) != Delivery::Sent
                                && self.registry.session_view(&user_id).is_some()
                            {
                                self.disconnect_all(vec![user_id]);
                            }
                        }
                        Err(err)
                    }
                }
            }
        }
    }

    /// Decodes a raw JSON frame and handles it.
    pub fn handle_raw(&self, raw: &str) -> ServerResult<Option<SessionReceiver>> {
        let msg =
            ClientMessage::from_json(raw).map_err(|err| ServerError::Malformed(err.to_string()))?;
        self.handle_message(msg)
    }

    /// Opens a session for `user_id` on `doc_id`, creating the document
    /// if it is not open.
    ///
    /// The session is registered before the snapshot is taken, so a
    /// concurrent edit lands either inside the snapshot or in the new
    /// queue as a broadcast; nothing falls between. Edits queued ahead
    /// of the snapshot answer carry versions the snapshot already
    /// covers, and the client discards them. Peers get a joined
    /// notification. A prior session for the same user is displaced: it
    /// receives a session-replaced close notice and its peers a left
    /// notification.
    pub fn connect(&self, user_id: UserId, doc_id: DocId) -> SessionReceiver {
        let seq = self.open_document(&doc_id);
        let (receiver, displaced) = self.registry.register(user_id.clone(), doc_id.clone(), 0);

        if let Some(displaced) = displaced {
            displaced.notify_replaced();
            let left = ServerMessage::PeerLeft {
                user_id: user_id.clone(),
            };
            let failed = self
                .broadcaster
                .notify_peers(&displaced.doc_id, &left, &user_id);
            self.disconnect_all(failed);
            if displaced.doc_id != doc_id {
                self.evict_if_idle(&displaced.doc_id);
            }
        }

        let (name, content, version) = seq.snapshot();
        self.registry.record_ack(&user_id, version);

        let user = UserInfo {
            id: user_id.clone(),
            name: user_id.as_str().to_string(),
        };
        let snapshot = ServerMessage::ConnectAnswer(DocumentSnapshot {
            document: DocumentInfo {
                id: doc_id.clone(),
                name,
                content,
            },
            user: user.clone(),
        });
        if self.registry.deliver(&user_id, snapshot) != Delivery::Sent {
            // A session that cannot even take its snapshot is unusable.
            self.disconnect_all(vec![user_id]);
            return receiver;
        }

        let joined = ServerMessage::PeerJoined { user };
        let failed = self.broadcaster.notify_peers(&doc_id, &joined, &user_id);
        self.disconnect_all(failed);

        info!(user = %user_id, doc = %doc_id, version, "session connected");
        receiver
    }

    /// Tears down the user's session and notifies its peers. The
    /// document is evicted once its last session is gone.
    pub fn disconnect(&self, user_id: &UserId) -> ServerResult<()> {
        let doc_id = self
            .registry
            .remove(user_id)
            .ok_or_else(|| ServerError::NotConnected(user_id.clone()))?;
        info!(user = %user_id, doc = %doc_id, "session disconnected");

        let left = ServerMessage::PeerLeft {
            user_id: user_id.clone(),
        };
        let failed = self.broadcaster.notify_peers(&doc_id, &left, user_id);
        self.disconnect_all(failed);

        self.evict_if_idle(&doc_id);
        Ok(())
    }

    /// Submits an edit operation on behalf of a connected user.
    ///
    /// The operation is sequenced against the version last acknowledged
    /// to the user's session. An applied result is broadcast to every
    /// session on the document; a stale one is acknowledged to the
    /// originator only. After a broadcast the document's history is
    /// truncated to the minimum acknowledged version.
    pub fn submit(&self, user_id: &UserId, op: Operation) -> ServerResult<()> {
        let (doc_id, base_version) = self
            .registry
            .session_view(user_id)
            .ok_or_else(|| ServerError::NotConnected(user_id.clone()))?;
        let seq = self
            .docs
            .read()
            .get(&doc_id)
            .cloned()
            .ok_or_else(|| ServerError::UnknownDocument(doc_id.clone()))?;

        match seq.submit(op, base_version)? {
            Submission::Applied { op, version } => {
                let failed = self.broadcaster.broadcast_applied(&doc_id, op, version);
                self.disconnect_all(failed);
                if let Some(min_acked) = self.registry.min_acked(&doc_id) {
                    seq.truncate_history(min_acked);
                }
            }
            Submission::Stale { version } => {
                if let Some(unreachable) = self.broadcaster.acknowledge_stale(user_id, version) {
                    self.disconnect_all(vec![unreachable]);
                }
            }
        }
        Ok(())
    }

    /// Returns the number of open documents.
    pub fn open_documents(&self) -> usize {
        self.docs.read().len()
    }

    /// Returns the number of active sessions.
    pub fn session_count(&self) -> usize {
        self.registry.len()
    }

    /// Returns the current content of an open document.
    pub fn document_content(&self, doc_id: &DocId) -> Option<String> {
        self.docs.read().get(doc_id).map(|seq| seq.content())
    }

    fn open_document(&self, doc_id: &DocId) -> Arc<DocumentSequencer> {
        if let Some(seq) = self.docs.read().get(doc_id) {
            return Arc::clone(seq);
        }
        let mut docs = self.docs.write();
        Arc::clone(docs.entry(doc_id.clone()).or_insert_with(|| {
            info!(doc = %doc_id, "opening document");
            let doc = Document::new(doc_id.clone(), self.config.default_doc_name.clone());
            Arc::new(DocumentSequencer::new(doc, self.config.sequencer_config()))
        }))
    }

    fn evict_if_idle(&self, doc_id: &DocId) {
        if self.registry.users_on(doc_id).is_empty()
            && self.docs.write().remove(doc_id).is_some()
        {
            info!(doc = %doc_id, "evicting idle document");
        }
    }

    /// Disconnects sessions whose queues overflowed or closed during a
    /// fan-out.
    fn disconnect_all(&self, users: Vec<UserId>) {
        for user in users {
            warn!(user = %user, "disconnecting unreachable session");
            let _ = self.disconnect(&user);
        }
    }
}

impl std::fmt::Debug for CollabServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollabServer")
            .field("open_documents", &self.open_documents())
            .field("sessions", &self.registry.len())
            .finish()
    }
}
