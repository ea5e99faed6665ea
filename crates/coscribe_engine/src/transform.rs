//! Position transformation.
//!
//! Rebases a pending operation's line/column coordinates over operations
//! that were applied after the version the client computed them against.
//! This is the engine's conflict-resolution algorithm: a restricted
//! operational transformation specialized to line/column addressing.
//!
//! Transform order matters. `transform_against` folds the pending
//! operation through the backlog oldest-first, in the exact applied
//! order; each step's output depends on the cumulative effect of its
//! predecessors. Given the single global order the sequencer assigns per
//! document, this is what makes all replicas converge.

use crate::history::AppliedOp;
use coscribe_protocol::Operation;

/// Outcome of transforming a pending operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transformed {
    /// The operation, with coordinates valid against the current state.
    Kept(Operation),
    /// The operation's target no longer exists; it must be dropped and
    /// acknowledged to the originator only, never misapplied.
    Stale,
}

impl Transformed {
    /// Unwraps the kept operation, if any.
    pub fn kept(self) -> Option<Operation> {
        match self {
            Transformed::Kept(op) => Some(op),
            Transformed::Stale => None,
        }
    }
}

/// Transforms `pending` against one already-applied operation.
///
/// The rules, with A the applied operation and P the pending one:
///
/// - A inserted a character on P's line at a column at or before P's →
///   P's column shifts right by one (the earlier-sequenced operation
///   wins positional precedence).
/// - A deleted a character on P's line before P's column → P's column
///   shifts left. At exactly P's column, a pending character deletion
///   has lost its target and is stale.
/// - A split a line: everything on later lines shifts down one; on the
///   split line itself, positions at or after the split column move to
///   the head of the new line.
/// - A merged a line into its predecessor: positions on the removed
///   line move to the predecessor, offset by its pre-merge length;
///   later lines shift up one. A pending merge of the same break has
///   lost its target and is stale.
/// - Renames neither affect positions nor are affected.
pub fn transform(pending: Operation, applied: &AppliedOp) -> Transformed {
    let Some(pl) = pending.line_idx() else {
        // ChangeDocName carries no position.
        return Transformed::Kept(pending);
    };
    let pc = pending.column_idx();

    match &applied.op {
        Operation::ChangeDocName { .. } => Transformed::Kept(pending),

        Operation::InsertChar {
            line_idx: al,
            column_idx: ac,
            ..
        } => match pc {
            Some(c) if pl == *al && *ac <= c => {
                Transformed::Kept(reposition(pending, pl, Some(c + 1)))
            }
            _ => Transformed::Kept(pending),
        },

        Operation::DeleteChar {
            line_idx: al,
            column_idx: ac,
            ..
        } => match pc {
            Some(c) if pl == *al && *ac < c => {
                Transformed::Kept(reposition(pending, pl, Some(c - 1)))
            }
            Some(c) if pl == *al && *ac == c && matches!(pending, Operation::DeleteChar { .. }) => {
                Transformed::Stale
            }
            _ => Transformed::Kept(pending),
        },

        Operation::InsertLineBreak {
            line_idx: al,
            column_idx: ac,
            ..
        } => {
            if pl > *al {
                Transformed::Kept(reposition(pending, pl + 1, pc))
            } else if pl == *al {
                match pc {
                    // At or after the split column: the position moved to
                    // the new line, rebased past the split.
                    Some(c) if *ac <= c => Transformed::Kept(reposition(pending, pl + 1, Some(c - *ac))),
                    Some(_) => Transformed::Kept(pending),
                    // A pending merge targets the break at the end of the
                    // line, which now ends the new line below.
                    None => Transformed::Kept(reposition(pending, pl + 1, None)),
                }
            } else {
                Transformed::Kept(pending)
            }
        }

        Operation::DeleteLineBreak { line_idx: al, .. } => {
            let offset = applied.merge_offset.unwrap_or(0);
            if pl == *al + 1 {
                match pc {
                    Some(c) => Transformed::Kept(reposition(pending, *al, Some(c + offset))),
                    None => Transformed::Kept(reposition(pending, *al, None)),
                }
            } else if pl > *al + 1 {
                Transformed::Kept(reposition(pending, pl - 1, pc))
            } else if pl == *al && matches!(pending, Operation::DeleteLineBreak { .. }) {
                // Both deletions targeted the same break; it is gone.
                Transformed::Stale
            } else {
                Transformed::Kept(pending)
            }
        }
    }
}

/// Folds `pending` through a backlog of applied operations, oldest first.
///
/// Transforming against an empty backlog returns the operation
/// unchanged.
pub fn transform_against<'a, I>(pending: Operation, backlog: I) -> Transformed
where
    I: IntoIterator<Item = &'a AppliedOp>,
{
    let mut current = pending;
    for applied in backlog {
        match transform(current, applied) {
            Transformed::Kept(op) => current = op,
            Transformed::Stale => return Transformed::Stale,
        }
    }
    Transformed::Kept(current)
}

/// Rebuilds an operation at new coordinates.
fn reposition(op: Operation, line_idx: usize, column_idx: Option<usize>) -> Operation {
    match (op, column_idx) {
        (Operation::InsertChar { ch, user_id, .. }, Some(column_idx)) => Operation::InsertChar {
            line_idx,
            column_idx,
            ch,
            user_id,
        },
        (Operation::InsertLineBreak { user_id, .. }, Some(column_idx)) => {
            Operation::InsertLineBreak {
                line_idx,
                column_idx,
                user_id,
            }
        }
        (Operation::DeleteChar { user_id, .. }, Some(column_idx)) => Operation::DeleteChar {
            line_idx,
            column_idx,
            user_id,
        },
        (Operation::DeleteLineBreak { user_id, .. }, None) => {
            Operation::DeleteLineBreak { line_idx, user_id }
        }
        // Positional kinds always round-trip through their own shape.
        (op, _) => op,
    }
}
