//! # Coscribe Server
//!
//! Session management, broadcast fan-out and the server facade for
//! coscribe.
//!
//! This crate provides:
//! - `CollabServer`: routes decoded client messages through sessions
//!   and per-document sequencers
//! - `SessionRegistry`: one session at most per user, with the
//!   server-tracked acknowledged version and a bounded outbound queue
//! - `Broadcaster`: non-blocking fan-out of authoritative results
//!
//! # Architecture
//!
//! The transport layer (out of scope here) decodes frames into
//! `ClientMessage` values, hands them to `CollabServer::handle_message`,
//! and drains each session's `SessionReceiver` to the wire. Inside:
//!
//! 1. `CONNECT` opens the document if needed, registers the session and
//!    answers with a full snapshot; peers are told someone joined.
//! 2. Edit messages are sequenced against the version last acknowledged
//!    to the session, then broadcast in applied form to every session on
//!    the document, the originator included.
//! 3. A session whose queue overflows is disconnected rather than
//!    buffered without bound.
//!
//! Edit messages carry no base-version field, so the acknowledged
//! version tracked by the registry is the inferred transform base for
//! each session's next operation.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod broadcast;
mod config;
mod error;
mod server;
mod session;

pub use broadcast::Broadcaster;
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::CollabServer;
pub use session::{Delivery, DisplacedSession, SessionReceiver, SessionRegistry};
