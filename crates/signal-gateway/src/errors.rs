//! Signal Gateway error types.
//!
//! Every failure a request can hit is a [`SignalError`]. Each variant has
//! exactly one HTTP status, and the `IntoResponse` impl renders the
//! `{"code": <status>, "message": <text>}` body the signaling clients expect.
//!
//! Failures from the signal bus arrive as [`RpcError`] and are classified by
//! [`translate_relay_error`] before reaching the client.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::error::Error as _;
use thiserror::Error;

/// Message returned for server faults that carry no client-safe detail.
pub const GENERIC_INTERNAL_MESSAGE: &str = "internal error";

/// Signal Gateway error type.
///
/// Maps to HTTP status codes:
/// - UnsupportedContentType, UnreadableBody, MalformedMessage,
///   FragmentsNotAllowed, UnknownMessageType, ParticipantSidEmpty,
///   InvalidArgument: 400
/// - Unauthorized, PermissionDenied, NoRoomName, IdentityEmpty, InvalidToken: 401
/// - NotFound: 404
/// - RequestTimeout: 408
/// - Rejected: whatever status the connect validator chose
/// - Internal, InternalUnclassified: 500
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("unsupported content-type: {0}")]
    UnsupportedContentType(String),

    #[error("could not read request body: {0}")]
    UnreadableBody(String),

    #[error("could not unmarshal request: {0}")]
    MalformedMessage(String),

    #[error("should not get fragments via HTTP request")]
    FragmentsNotAllowed,

    #[error("unknown message type, message: {0}")]
    UnknownMessageType(String),

    #[error("participant sid cannot be empty")]
    ParticipantSidEmpty,

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("permissions denied")]
    PermissionDenied,

    #[error("no room name")]
    NoRoomName,

    #[error("identity cannot be empty")]
    IdentityEmpty,

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("{0}")]
    NotFound(String),

    #[error("request timed out")]
    RequestTimeout,

    /// Failure classified by a connect validator, which owns the status.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("{0}")]
    Internal(String),

    #[error("internal error")]
    InternalUnclassified,
}

impl SignalError {
    /// Convenience constructor for validator rejections.
    pub fn rejected(status: StatusCode, message: impl Into<String>) -> Self {
        SignalError::Rejected {
            status,
            message: message.into(),
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            SignalError::UnsupportedContentType(_)
            | SignalError::UnreadableBody(_)
            | SignalError::MalformedMessage(_)
            | SignalError::FragmentsNotAllowed
            | SignalError::UnknownMessageType(_)
            | SignalError::ParticipantSidEmpty
            | SignalError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            SignalError::Unauthorized(_)
            | SignalError::PermissionDenied
            | SignalError::NoRoomName
            | SignalError::IdentityEmpty
            | SignalError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            SignalError::NotFound(_) => StatusCode::NOT_FOUND,
            SignalError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            SignalError::Rejected { status, .. } => *status,
            SignalError::Internal(_) | SignalError::InternalUnclassified => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the HTTP status code for this error (for metrics recording).
    pub fn status_code(&self) -> u16 {
        self.status().as_u16()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    code: u16,
    message: String,
}

impl IntoResponse for SignalError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            SignalError::Internal(detail) => {
                tracing::error!(target: "signal.errors", error = %detail, "Request failed with internal error");
                detail.clone()
            }
            SignalError::InternalUnclassified => {
                tracing::error!(target: "signal.errors", "Request failed with unclassified error");
                GENERIC_INTERNAL_MESSAGE.to_string()
            }
            other => {
                tracing::debug!(target: "signal.errors", status = status.as_u16(), error = %other, "Request rejected");
                other.to_string()
            }
        };

        let body = ErrorResponse {
            code: status.as_u16(),
            message,
        };

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            if let Ok(header_value) = "Bearer realm=\"signal-gateway\"".parse() {
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, header_value);
            }
        }

        response
    }
}

/// Failure of an internal call over the signal bus.
#[derive(Debug, Clone, Error)]
pub enum RpcError {
    /// The remote side classified the failure with a status code.
    #[error("{message}")]
    Status { code: tonic::Code, message: String },

    /// The call failed before a classified answer came back.
    #[error("transport error: {0}")]
    Transport(String),
}

impl RpcError {
    pub fn status(code: tonic::Code, message: impl Into<String>) -> Self {
        RpcError::Status {
            code,
            message: message.into(),
        }
    }
}

/// A status raised locally by the channel carries the underlying transport
/// error as its source; one decoded from a peer's trailers does not.
impl From<tonic::Status> for RpcError {
    fn from(status: tonic::Status) -> Self {
        match status.source() {
            Some(source) => RpcError::Transport(source.to_string()),
            None => RpcError::Status {
                code: status.code(),
                message: status.message().to_string(),
            },
        }
    }
}

/// Classify a participant relay failure.
///
/// NotFound and InvalidArgument keep their meaning, any other classified
/// failure is a 500 that forwards the remote message, and an unclassified
/// failure is a 500 with a generic message.
pub fn translate_relay_error(err: RpcError) -> SignalError {
    match err {
        RpcError::Status {
            code: tonic::Code::NotFound,
            message,
        } => SignalError::NotFound(message),
        RpcError::Status {
            code: tonic::Code::InvalidArgument,
            message,
        } => SignalError::InvalidArgument(message),
        RpcError::Status { message, .. } => SignalError::Internal(message),
        RpcError::Transport(detail) => {
            tracing::warn!(target: "signal.errors", error = %detail, "Unclassified relay failure");
            SignalError::InternalUnclassified
        }
    }
}
