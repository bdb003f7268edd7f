//! Request body handed to the signaling operations.
//!
//! The handlers pass the raw body stream through untouched so the content
//! type check runs before anything is buffered. Reading enforces the
//! configured cap and reports failures as a JSON 400 like every other
//! rejection.

use crate::errors::SignalError;
use axum::body::Body;
use bytes::Bytes;

/// Unread request body plus the most bytes it may buffer to.
pub struct RequestBody {
    body: Body,
    limit: usize,
}

impl RequestBody {
    pub fn new(body: Body, limit: usize) -> Self {
        Self { body, limit }
    }

    /// Buffer the whole body.
    ///
    /// # Errors
    ///
    /// Returns `SignalError::UnreadableBody` if the stream fails or grows
    /// past the limit.
    pub(crate) async fn read(self) -> Result<Bytes, SignalError> {
        axum::body::to_bytes(self.body, self.limit)
            .await
            .map_err(|e| {
                tracing::debug!(
                    target: "signal.services.body",
                    limit = self.limit,
                    error = %e,
                    "Failed to read request body"
                );
                SignalError::UnreadableBody(e.to_string())
            })
    }
}

// In-memory bodies are already buffered, so no cap applies.

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> Self {
        Self::new(Body::from(bytes), usize::MAX)
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(Body::from(bytes), usize::MAX)
    }
}

impl From<&'static [u8]> for RequestBody {
    fn from(bytes: &'static [u8]) -> Self {
        Self::new(Body::from(bytes), usize::MAX)
    }
}
