//! Signaling handlers.
//!
//! - `POST /rtc/v2` - establish a session (`ConnectRequest` in, `ConnectResponse` out)
//! - `PATCH /rtc/v2/:participant_id` - relay an in-session wire message
//!
//! Both take and return `application/x-protobuf` bodies. Grants come from
//! the auth middleware when a token was supplied. Bodies are passed on
//! unread; the services check the content type before buffering them.

use crate::auth::GrantSet;
use crate::context::{resolve_client_address, RequestContext};
use crate::errors::SignalError;
use crate::routes::AppState;
use crate::services::{RequestBody, PROTOBUF_CONTENT_TYPE};
use axum::{
    body::Body,
    extract::{rejection::PathRejection, ConnectInfo, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension,
};
use bytes::Bytes;
use common::types::ParticipantId;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::instrument;

/// Build the per-request context from what the transport and auth layer saw.
fn request_context(
    state: &AppState,
    peer: Option<ConnectInfo<SocketAddr>>,
    grants: Option<Extension<Arc<GrantSet>>>,
    headers: &HeaderMap,
) -> RequestContext {
    RequestContext::new(state.config.request_timeout())
        .with_grants(grants.map(|Extension(grants)| grants))
        .with_client_address(resolve_client_address(
            headers,
            peer.map(|ConnectInfo(addr)| addr),
        ))
}

fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
}

fn protobuf_response(body: Bytes) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, PROTOBUF_CONTENT_TYPE)],
        body,
    )
}

/// Handler for POST /rtc/v2
///
/// # Response
///
/// - 200 OK with the encoded `ConnectResponse` envelope
/// - 400 for a bad content type, an unreadable or oversized body, a
///   malformed body, a fragment, or a first message that is not a
///   `ConnectRequest`
/// - 401 when the grants do not allow joining
/// - 500 when placement or the room node fails
#[instrument(skip_all, name = "signal.rtc.connect")]
pub async fn connect(
    State(state): State<Arc<AppState>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    grants: Option<Extension<Arc<GrantSet>>>,
    headers: HeaderMap,
    body: Body,
) -> Result<impl IntoResponse, SignalError> {
    let ctx = request_context(&state, peer, grants, &headers);
    let body = RequestBody::new(body, state.config.max_request_body_bytes);

    let response = state
        .gateway
        .connect(content_type(&headers), body, &ctx)
        .await?;

    Ok(protobuf_response(response))
}

/// Handler for PATCH /rtc/v2/:participant_id
///
/// # Response
///
/// - 200 OK with the room node's encoded reply
/// - 400 for a bad content type, an empty participant id, or an unreadable,
///   oversized, or malformed body
/// - 401 when the grants do not identify a joinable room and participant
/// - 404 when the room node does not know the participant
/// - 500 for any other relay failure
#[instrument(skip_all, name = "signal.rtc.participant_action")]
pub async fn participant_action(
    State(state): State<Arc<AppState>>,
    participant_id: Result<Path<String>, PathRejection>,
    peer: Option<ConnectInfo<SocketAddr>>,
    grants: Option<Extension<Arc<GrantSet>>>,
    headers: HeaderMap,
    body: Body,
) -> Result<impl IntoResponse, SignalError> {
    let Path(participant_id) =
        participant_id.map_err(|rejection| SignalError::InvalidArgument(rejection.body_text()))?;
    let ctx = request_context(&state, peer, grants, &headers);
    let participant_id = ParticipantId::from(participant_id);
    let body = RequestBody::new(body, state.config.max_request_body_bytes);

    let response = state
        .gateway
        .participant_action(content_type(&headers), &participant_id, body, &ctx)
        .await?;

    Ok(protobuf_response(response))
}
