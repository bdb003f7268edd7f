//! Codec for the top-level signaling wire message.
//!
//! Callers work with [`WireMessage`], the oneof of [`Signalv2WireMessage`],
//! so "no variant set" is rejected once here instead of at every use site.

use crate::signaling::{signalv2_wire_message, Signalv2WireMessage};
use bytes::{Bytes, BytesMut};
use prost::Message;

/// A decoded wire message: exactly one of `Envelope` or `Fragment`.
pub type WireMessage = signalv2_wire_message::Message;

/// Error type for codec operations
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Input is truncated or does not match the schema
    #[error("malformed wire message: {0}")]
    Malformed(String),

    /// Input decoded but carries neither an envelope nor a fragment
    #[error("wire message has no envelope or fragment")]
    MissingVariant,

    /// Output buffer could not hold the encoded message
    #[error("failed to encode wire message: {0}")]
    Encode(String),
}

/// Decode a wire message from bytes
///
/// # Errors
///
/// Returns [`CodecError::Malformed`] for truncated or schema-invalid input
/// and [`CodecError::MissingVariant`] when neither variant is set.
pub fn decode_wire_message(data: &[u8]) -> Result<WireMessage, CodecError> {
    let decoded =
        Signalv2WireMessage::decode(data).map_err(|e| CodecError::Malformed(e.to_string()))?;

    into_wire_message(decoded)
}

/// Unwrap the oneof of an already-decoded message.
///
/// # Errors
///
/// Returns [`CodecError::MissingVariant`] when neither variant is set.
pub fn into_wire_message(message: Signalv2WireMessage) -> Result<WireMessage, CodecError> {
    message.message.ok_or(CodecError::MissingVariant)
}

/// Encode a wire message to bytes
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if the buffer cannot hold the message.
pub fn encode_wire_message(message: WireMessage) -> Result<Bytes, CodecError> {
    let wire = Signalv2WireMessage::from(message);

    let mut buf = BytesMut::with_capacity(wire.encoded_len());
    wire.encode(&mut buf)
        .map_err(|e| CodecError::Encode(e.to_string()))?;

    Ok(buf.freeze())
}
