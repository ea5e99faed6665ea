//! Per-document history of applied operations.

use coscribe_protocol::Operation;

/// One applied operation, tagged with the version it produced.
///
/// Entry `version` is the operation whose application moved the document
/// from `version - 1` to `version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedOp {
    /// Document version after this operation was applied.
    pub version: u64,
    /// The operation, in its authoritative (transformed) form.
    pub op: Operation,
    /// For a line-break deletion: character length of the absorbing line
    /// before the merge. Transformation against the merge needs it to
    /// rebase columns from the removed line.
    pub merge_offset: Option<usize>,
}

/// Ordered log of the operations applied to one document.
///
/// The log maintains:
/// - Entries in applied order with contiguous versions
/// - The transform backlog for any still-covered base version
/// - Truncation below the lowest version every session has acknowledged
#[derive(Debug, Default)]
pub struct OperationLog {
    entries: Vec<AppliedOp>,
}

impl OperationLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends an applied operation.
    ///
    /// Versions must arrive in applied order without gaps.
    pub fn append(&mut self, entry: AppliedOp) {
        debug_assert!(
            self.entries
                .last()
                .map(|last| last.version + 1 == entry.version)
                .unwrap_or(true),
            "history versions must be contiguous"
        );
        self.entries.push(entry);
    }

    /// Returns the entries applied after `version`, oldest first.
    pub fn since(&self, version: u64) -> &[AppliedOp] {
        let start = self.entries.partition_point(|e| e.version <= version);
        &self.entries[start..]
    }

    /// Returns the oldest retained version, if any entries remain.
    pub fn oldest_version(&self) -> Option<u64> {
        self.entries.first().map(|e| e.version)
    }

    /// Returns the newest retained version, if any entries remain.
    pub fn newest_version(&self) -> Option<u64> {
        self.entries.last().map(|e| e.version)
    }

    /// Returns true if a submit based on `version` can be transformed
    /// from this log (no gap between the base and the retained backlog).
    pub fn covers(&self, version: u64) -> bool {
        match self.oldest_version() {
            Some(oldest) => version + 1 >= oldest,
            None => true,
        }
    }

    /// Drops entries at or below `min_version`.
    ///
    /// Called once every connected session has acknowledged
    /// `min_version`; older entries can no longer be a transform base.
    pub fn truncate(&mut self, min_version: u64) {
        self.entries.retain(|e| e.version > min_version);
    }

    /// Drops the oldest entries until at most `max` remain.
    pub fn enforce_capacity(&mut self, max: usize) {
        if self.entries.len() > max {
            let excess = self.entries.len() - max;
            self.entries.drain(0..excess);
        }
    }

    /// Returns the number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries are retained.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coscribe_protocol::UserId;

    fn entry(version: u64) -> AppliedOp {
        AppliedOp {
            version,
            op: Operation::insert_char(0, 0, 'x', UserId::new("u")),
            merge_offset: None,
        }
    }

    #[test]
    fn empty_log() {
        let log = OperationLog::new();
        assert!(log.is_empty());
        assert!(log.since(0).is_empty());
        assert!(log.covers(0));
        assert!(log.covers(42));
    }

    #[test]
    fn since_returns_newer_entries() {
        let mut log = OperationLog::new();
        for v in 1..=5 {
            log.append(entry(v));
        }

        assert_eq!(log.since(0).len(), 5);
        assert_eq!(log.since(3).len(), 2);
        assert_eq!(log.since(3)[0].version, 4);
        assert!(log.since(5).is_empty());
    }

    #[test]
    fn coverage_after_truncation() {
        let mut log = OperationLog::new();
        for v in 1..=10 {
            log.append(entry(v));
        }

        log.truncate(4);
        assert_eq!(log.oldest_version(), Some(5));
        assert!(log.covers(4));
        assert!(log.covers(7));
        assert!(!log.covers(3));
    }

    #[test]
    fn capacity_drops_oldest() {
        let mut log = OperationLog::new();
        for v in 1..=10 {
            log.append(entry(v));
        }

        log.enforce_capacity(3);
        assert_eq!(log.len(), 3);
        assert_eq!(log.oldest_version(), Some(8));
        assert_eq!(log.newest_version(), Some(10));
    }
}
