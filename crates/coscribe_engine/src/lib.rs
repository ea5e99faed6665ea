//! # Coscribe Engine
//!
//! Position transformation and per-document sequencing for coscribe.
//!
//! This crate provides:
//! - `transform` / `transform_against`: the pure conflict-resolution
//!   functions that rebase stale positional references
//! - `OperationLog`: the per-document history of applied operations
//! - `DocumentSequencer`: the per-document serialization point that
//!   orders, transforms and applies operations
//!
//! ## Architecture
//!
//! One sequencer exists per open document and owns the document plus its
//! history behind a single mutex. All mutation goes through
//! `DocumentSequencer::submit`, which:
//! 1. collects the operations applied since the client's base version,
//! 2. folds the pending operation through them oldest-first,
//! 3. applies the result and appends it to the history.
//!
//! ## Key Invariants
//!
//! - Concurrent submits for one document never interleave
//! - Operations on different documents share no state
//! - Transform order is the exact applied order (convergence depends on it)
//! - A failed submit leaves document and history untouched

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod history;
mod sequencer;
mod transform;

pub use error::{EngineError, EngineResult};
pub use history::{AppliedOp, OperationLog};
pub use sequencer::{DocumentSequencer, SequencerConfig, Submission};
pub use transform::{transform, transform_against, Transformed};
