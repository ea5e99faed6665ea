//! # Coscribe Core
//!
//! Authoritative document model for coscribe.
//!
//! This crate provides:
//! - `Document`: the in-memory line-addressed text of one open document
//! - Atomic single-operation mutators with strict bounds validation
//! - `CoreError` for position violations
//!
//! The document is a plain value type; serialization of all mutations
//! belongs to the sequencer in `coscribe_engine`, which owns each
//! `Document` behind its exclusive access boundary.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod document;
mod error;

pub use document::Document;
pub use error::{CoreError, CoreResult};
