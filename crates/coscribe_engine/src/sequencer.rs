//! Per-document serialization point.

use crate::error::{EngineError, EngineResult};
use crate::history::{AppliedOp, OperationLog};
use crate::transform::{transform_against, Transformed};
use coscribe_core::Document;
use coscribe_protocol::{DocId, Operation};
use parking_lot::Mutex;
use tracing::{debug, warn};

/// Configuration for a document sequencer.
#[derive(Debug, Clone)]
pub struct SequencerConfig {
    /// Maximum number of history entries retained for transformation.
    ///
    /// A client whose base version falls behind the retained window gets
    /// `EngineError::VersionUnavailable` and must resynchronize.
    pub max_history: usize,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self { max_history: 4096 }
    }
}

impl SequencerConfig {
    /// Creates a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum retained history length.
    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history;
        self
    }
}

/// Outcome of a successful submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The operation was applied (possibly transformed); carries the
    /// authoritative form to broadcast and the version it produced.
    Applied {
        /// The operation as actually applied.
        op: Operation,
        /// Document version after application.
        version: u64,
    },
    /// The operation's target was deleted by an operation sequenced
    /// earlier; nothing was applied. The originator is acknowledged at
    /// `version` so its pipeline stays in step, but no peer hears of it.
    Stale {
        /// Current document version, unchanged by this submit.
        version: u64,
    },
}

impl Submission {
    /// Returns the version the originator should treat as acknowledged.
    pub fn version(&self) -> u64 {
        match self {
            Submission::Applied { version, .. } | Submission::Stale { version } => *version,
        }
    }
}

struct SequencerInner {
    doc: Document,
    log: OperationLog,
}

/// The serialization point for one open document.
///
/// Owns the document and its operation history behind a single mutex, so
/// submits for the same document are totally ordered and never
/// interleave. Submits against different documents share nothing.
pub struct DocumentSequencer {
    config: SequencerConfig,
    inner: Mutex<SequencerInner>,
}

impl DocumentSequencer {
    /// Creates a sequencer around an existing document.
    pub fn new(doc: Document, config: SequencerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(SequencerInner {
                doc,
                log: OperationLog::new(),
            }),
        }
    }

    /// Returns the document identifier.
    pub fn doc_id(&self) -> DocId {
        self.inner.lock().doc.id().clone()
    }

    /// Returns the current document version.
    pub fn version(&self) -> u64 {
        self.inner.lock().doc.version()
    }

    /// Returns the current display name.
    pub fn name(&self) -> String {
        self.inner.lock().doc.name().to_string()
    }

    /// Returns the flattened content with line breaks embedded.
    pub fn content(&self) -> String {
        self.inner.lock().doc.content()
    }

    /// Returns name, content and version read under one lock
    /// acquisition, so the three are mutually consistent.
    pub fn snapshot(&self) -> (String, String, u64) {
        let inner = self.inner.lock();
        (
            inner.doc.name().to_string(),
            inner.doc.content(),
            inner.doc.version(),
        )
    }

    /// Submits an operation computed against `base_version`.
    ///
    /// The operation is transformed against everything applied after the
    /// base, then applied and recorded. A stale operation is dropped
    /// without touching the document. Bounds violations that survive
    /// transformation are the client's error; the document is unchanged.
    pub fn submit(&self, op: Operation, base_version: u64) -> EngineResult<Submission> {
        let mut inner = self.inner.lock();
        let current = inner.doc.version();

        if base_version > current {
            return Err(EngineError::FutureBaseVersion {
                base: base_version,
                current,
            });
        }
        if !inner.log.covers(base_version) {
            // Unwrap is fine: a non-covering log is non-empty.
            let oldest = inner.log.oldest_version().unwrap_or(0);
            return Err(EngineError::VersionUnavailable {
                base: base_version,
                oldest,
            });
        }

        let op = match transform_against(op, inner.log.since(base_version)) {
            Transformed::Kept(op) => op,
            Transformed::Stale => {
                warn!(
                    doc = %inner.doc.id(),
                    base_version,
                    version = current,
                    "dropping stale operation"
                );
                return Ok(Submission::Stale { version: current });
            }
        };

        // The absorbing line's length must be captured before the merge
        // destroys it; later transforms rebase columns with it.
        let merge_offset = match &op {
            Operation::DeleteLineBreak { line_idx, .. } => {
                Some(inner.doc.line_len(*line_idx)?)
            }
            _ => None,
        };

        inner.doc.apply(&op)?;
        let version = inner.doc.version();
        inner.log.append(AppliedOp {
            version,
            op: op.clone(),
            merge_offset,
        });
        inner.log.enforce_capacity(self.config.max_history);

        debug!(
            doc = %inner.doc.id(),
            base_version,
            version,
            op = op.label(),
            "applied operation"
        );
        Ok(Submission::Applied { op, version })
    }

    /// Drops history entries at or below `min_version`.
    ///
    /// Safe once every connected session has acknowledged `min_version`:
    /// no future submit can use an older base.
    pub fn truncate_history(&self, min_version: u64) {
        self.inner.lock().log.truncate(min_version);
    }

    /// Returns the number of retained history entries.
    pub fn history_len(&self) -> usize {
        self.inner.lock().log.len()
    }
}

impl std::fmt::Debug for DocumentSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("DocumentSequencer")
            .field("doc", inner.doc.id())
            .field("version", &inner.doc.version())
            .field("history_len", &inner.log.len())
            .finish()
    }
}
