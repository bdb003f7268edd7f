//! Protocol Buffer messages for the signaling gateway.
//!
//! The messages are declared by hand with `prost` derives rather than
//! generated by a build script, so the crate builds without `protoc`.
//! Field numbers are the wire contract; do not renumber them.
//!
//! - [`signaling`] - client-facing wire protocol (`package signal`)
//! - [`internal`] - gateway-to-node RPC payloads (`package signal.internal`)
//! - [`codec`] - encode/decode of the top-level wire message

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

// Re-export prost traits for convenience
pub use prost::Message;

pub mod codec;
pub mod internal;
pub mod signaling;
