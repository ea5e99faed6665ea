//! # Coscribe Protocol
//!
//! Wire vocabulary for the coscribe collaboration engine.
//!
//! This crate provides:
//! - `Operation`: the closed set of edit intents
//! - `ClientMessage` / `ServerMessage`: the JSON message vocabulary
//! - `DocumentSnapshot`: the full-state answer to a CONNECT
//! - Opaque `DocId` / `UserId` identifiers
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod id;
mod message;
mod operation;

pub use id::{DocId, UserId};
pub use message::{
    ClientMessage, DocumentInfo, DocumentSnapshot, ErrorKind, ServerMessage, UserInfo,
};
pub use operation::Operation;
