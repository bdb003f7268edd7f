//! Connect Router.
//!
//! Handles the first message of a session:
//!
//! ```text
//! content-type -> read body -> decode -> validate -> grants JSON -> client info
//!   -> select room node -> relay connect -> encode ConnectResponse
//! ```
//!
//! The first `ConnectRequest` in the envelope drives the response. Any other
//! client message ahead of it ends the request with `UnknownMessageType`.
//! An envelope with no client messages is rejected as malformed rather than
//! answered with an empty 200.

use crate::config::LimitConfig;
use crate::context::RequestContext;
use crate::errors::SignalError;
use crate::services::{
    ensure_protobuf_content_type, ConnectParams, ConnectValidator, MessageRouter,
    PlacementClient, RequestBody,
};
use bytes::Bytes;
use common::types::{ParticipantIdentity, RoomName};
use signal_proto::codec::{decode_wire_message, encode_wire_message, WireMessage};
use signal_proto::internal::RelaySignalv2ConnectRequest;
use signal_proto::signaling::{
    signalv2_client_message, signalv2_server_message, ClientInfo, ConnectRequest, Envelope,
};
use std::sync::Arc;
use tracing::instrument;

/// Everything resolved for one connect request before it leaves the gateway.
#[derive(Debug, Clone)]
pub struct ConnectRequestContext {
    pub room_name: RoomName,
    pub participant_identity: ParticipantIdentity,
    pub request: RelaySignalv2ConnectRequest,
}

pub struct ConnectRouter {
    limits: LimitConfig,
    validator: Arc<dyn ConnectValidator>,
    placement: Arc<dyn PlacementClient>,
    router: Arc<dyn MessageRouter>,
}

impl ConnectRouter {
    pub fn new(
        limits: LimitConfig,
        validator: Arc<dyn ConnectValidator>,
        placement: Arc<dyn PlacementClient>,
        router: Arc<dyn MessageRouter>,
    ) -> Self {
        Self {
            limits,
            validator,
            placement,
            router,
        }
    }

    /// Run the connect phase for one HTTP request body.
    ///
    /// # Errors
    ///
    /// - `UnsupportedContentType` - content type is not `application/x-protobuf`
    /// - `UnreadableBody` - body fails mid-stream or exceeds the size cap
    /// - `MalformedMessage` - body does not decode, or the envelope carries
    ///   no client messages (never an empty 200)
    /// - `FragmentsNotAllowed` - body is a fragment
    /// - `UnknownMessageType` - a non-connect client message precedes the connect request
    /// - validator errors, unchanged
    /// - `Internal` - grant serialization, placement, or relay failure
    #[instrument(skip_all, name = "signal.connect")]
    pub async fn connect(
        &self,
        content_type: Option<&str>,
        body: RequestBody,
        ctx: &RequestContext,
    ) -> Result<Bytes, SignalError> {
        ensure_protobuf_content_type(content_type)?;
        let body = body.read().await?;

        let envelope = match decode_wire_message(&body)
            .map_err(|e| SignalError::MalformedMessage(e.to_string()))?
        {
            WireMessage::Envelope(envelope) => envelope,
            WireMessage::Fragment(fragment) => {
                tracing::error!(
                    target: "signal.services.connect",
                    packet_id = fragment.packet_id,
                    "Fragment received on connect endpoint"
                );
                return Err(SignalError::FragmentsNotAllowed);
            }
        };

        // No client messages is an error, not an empty success.
        let first = envelope.client_messages.into_iter().next().ok_or_else(|| {
            SignalError::MalformedMessage("envelope carries no client messages".to_string())
        })?;

        match first.message {
            Some(signalv2_client_message::Message::ConnectRequest(connect_request)) => {
                self.handle_connect_request(connect_request, ctx).await
            }
            Some(other) => Err(SignalError::UnknownMessageType(other.kind().to_string())),
            None => Err(SignalError::UnknownMessageType("unset".to_string())),
        }
    }

    async fn handle_connect_request(
        &self,
        connect_request: ConnectRequest,
        ctx: &RequestContext,
    ) -> Result<Bytes, SignalError> {
        let ConnectRequestContext {
            room_name,
            participant_identity,
            request,
        } = self.validate_internal(connect_request, ctx).await?;

        self.placement
            .select_room_node(ctx, &room_name, "")
            .await
            .map_err(|e| {
                tracing::warn!(
                    target: "signal.services.connect",
                    room = %room_name,
                    error = %e,
                    "Room node selection failed"
                );
                SignalError::Internal(e.to_string())
            })?;

        let response = self
            .router
            .handle_participant_connect_request(ctx, &room_name, &participant_identity, request)
            .await
            .map_err(|e| {
                tracing::warn!(
                    target: "signal.services.connect",
                    room = %room_name,
                    participant = %participant_identity,
                    error = %e,
                    "Relay connect request failed"
                );
                SignalError::Internal(e.to_string())
            })?;

        let connect_response = response.connect_response.ok_or_else(|| {
            SignalError::Internal("room node returned no connect response".to_string())
        })?;

        // room sid may still be unresolved for a room created by this join
        tracing::debug!(
            target: "signal.services.connect",
            room = %room_name,
            room_sid = connect_response.room.as_ref().map(|r| r.sid.as_str()).unwrap_or_default(),
            participant = %participant_identity,
            participant_sid = connect_response
                .participant
                .as_ref()
                .map(|p| p.sid.as_str())
                .unwrap_or_default(),
            other_participants = connect_response.other_participants.len(),
            "connect response"
        );

        let reply = WireMessage::Envelope(Envelope::from_server_message(
            signalv2_server_message::Message::ConnectResponse(connect_response),
        ));

        encode_wire_message(reply).map_err(|e| SignalError::Internal(e.to_string()))
    }

    /// Validate the request and build what gets sent to the room's node.
    async fn validate_internal(
        &self,
        mut connect_request: ConnectRequest,
        ctx: &RequestContext,
    ) -> Result<ConnectRequestContext, SignalError> {
        let params = ConnectParams {
            metadata: connect_request.metadata.clone(),
            attributes: connect_request.participant_attributes.clone(),
        };

        let validated = self
            .validator
            .validate(
                ctx,
                &self.limits,
                params,
                self.router.as_ref(),
                self.placement.as_ref(),
            )
            .await?;

        let grants_json = serde_json::to_string(&validated.grants).map_err(|e| {
            tracing::error!(target: "signal.services.connect", error = %e, "Failed to serialize grants");
            SignalError::Internal("failed to serialize grants".to_string())
        })?;

        augment_client_info(&mut connect_request, ctx);

        Ok(ConnectRequestContext {
            room_name: validated.room_name,
            participant_identity: validated.grants.participant_identity(),
            request: RelaySignalv2ConnectRequest {
                grants_json,
                create_room: validated.create_room,
                connect_request: Some(connect_request),
            },
        })
    }
}

/// Stamp transport-observed details onto the request's client info,
/// creating the block if the client sent none.
pub fn augment_client_info(connect_request: &mut ConnectRequest, ctx: &RequestContext) {
    let client_info = connect_request
        .client_info
        .get_or_insert_with(ClientInfo::default);

    if let Some(address) = ctx.client_address() {
        client_info.address = address.to_string();
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use crate::auth::claims::{GrantSet, VideoGrant};
    use crate::errors::RpcError;
    use crate::services::mock::{MockConnectValidator, MockMessageRouter, MockPlacementClient};
    use crate::services::ValidatedConnect;
    use axum::http::StatusCode;
    use signal_proto::signaling::{
        signalv2_wire_message, ConnectResponse, Fragment, ParticipantInfo, Room,
        Signalv2ClientMessage, TrickleRequest,
    };
    use std::time::Duration;

    fn ctx() -> RequestContext {
        RequestContext::new(Duration::from_secs(5))
            .with_client_address(Some("203.0.113.7".to_string()))
    }

    fn validated() -> ValidatedConnect {
        ValidatedConnect {
            grants: GrantSet {
                identity: "alice".to_string(),
                video: Some(VideoGrant {
                    room_join: true,
                    room: "standup".to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            },
            room_name: RoomName::from("standup"),
            create_room: None,
        }
    }

    fn connect_response() -> ConnectResponse {
        ConnectResponse {
            room: Some(Room {
                sid: "RM_1".to_string(),
                name: "standup".to_string(),
                ..Default::default()
            }),
            participant: Some(ParticipantInfo {
                sid: "PA_1".to_string(),
                identity: "alice".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    struct Harness {
        router: Arc<MockMessageRouter>,
        placement: Arc<MockPlacementClient>,
        connect_router: ConnectRouter,
    }

    fn harness(
        validator: MockConnectValidator,
        placement: MockPlacementClient,
        router: MockMessageRouter,
    ) -> Harness {
        let router = Arc::new(router);
        let placement = Arc::new(placement);
        let connect_router = ConnectRouter::new(
            LimitConfig::default(),
            Arc::new(validator),
            placement.clone(),
            router.clone(),
        );
        Harness {
            router,
            placement,
            connect_router,
        }
    }

    fn accepting_harness() -> Harness {
        harness(
            MockConnectValidator::accepting(validated()),
            MockPlacementClient::accepting(),
            MockMessageRouter::responding(connect_response()),
        )
    }

    fn encode(messages: Vec<signalv2_client_message::Message>) -> Vec<u8> {
        let envelope = Envelope {
            client_messages: messages
                .into_iter()
                .map(|m| Signalv2ClientMessage { message: Some(m) })
                .collect(),
            server_messages: vec![],
        };
        encode_wire_message(WireMessage::Envelope(envelope))
            .unwrap()
            .to_vec()
    }

    fn connect_body() -> Vec<u8> {
        encode(vec![signalv2_client_message::Message::ConnectRequest(
            ConnectRequest {
                metadata: "{\"seat\":1}".to_string(),
                ..Default::default()
            },
        )])
    }

    #[tokio::test]
    async fn test_connect_success_returns_connect_response() {
        let h = accepting_harness();

        let bytes = h
            .connect_router
            .connect(Some("application/x-protobuf"), connect_body().into(), &ctx())
            .await
            .unwrap();

        let decoded = decode_wire_message(&bytes).unwrap();
        let WireMessage::Envelope(envelope) = decoded else {
            panic!("expected envelope");
        };
        assert!(envelope.client_messages.is_empty());
        assert_eq!(envelope.server_messages.len(), 1);
        assert_eq!(
            envelope.server_messages[0].message,
            Some(signalv2_server_message::Message::ConnectResponse(
                connect_response()
            ))
        );

        assert_eq!(h.placement.call_count(), 1);
        assert_eq!(h.router.call_count(), 1);
    }

    #[tokio::test]
    async fn test_connect_forwards_grants_and_augmented_request() {
        let h = accepting_harness();

        h.connect_router
            .connect(Some("application/x-protobuf"), connect_body().into(), &ctx())
            .await
            .unwrap();

        let requests = h.router.requests().await;
        assert_eq!(requests.len(), 1);
        let (room, identity, request) = &requests[0];
        assert_eq!(room.as_str(), "standup");
        assert_eq!(identity.as_str(), "alice");

        let grants: GrantSet = serde_json::from_str(&request.grants_json).unwrap();
        assert_eq!(grants, validated().grants);

        let forwarded = request.connect_request.as_ref().unwrap();
        assert_eq!(forwarded.metadata, "{\"seat\":1}");
        assert_eq!(
            forwarded.client_info.as_ref().unwrap().address,
            "203.0.113.7"
        );

        let placements = h.placement.requests().await;
        assert_eq!(placements, vec![(RoomName::from("standup"), String::new())]);
    }

    #[tokio::test]
    async fn test_connect_rejects_wrong_content_type_before_decoding() {
        let h = accepting_harness();

        let result = h
            .connect_router
            .connect(Some("application/json"), RequestBody::from(&b"not protobuf"[..]), &ctx())
            .await;

        assert!(matches!(result, Err(SignalError::UnsupportedContentType(ref ct)) if ct == "application/json"));
        assert_eq!(h.placement.call_count(), 0);
    }

    #[tokio::test]
    async fn test_connect_checks_content_type_before_reading_body() {
        let h = accepting_harness();
        let oversized = RequestBody::new(axum::body::Body::from(vec![0u8; 64]), 8);

        let result = h
            .connect_router
            .connect(Some("application/json"), oversized, &ctx())
            .await;

        assert!(matches!(result, Err(SignalError::UnsupportedContentType(_))));
    }

    #[tokio::test]
    async fn test_connect_rejects_oversized_body() {
        let h = accepting_harness();
        let oversized = RequestBody::new(axum::body::Body::from(connect_body()), 8);

        let result = h
            .connect_router
            .connect(Some("application/x-protobuf"), oversized, &ctx())
            .await;

        assert!(matches!(result, Err(SignalError::UnreadableBody(_))));
        assert_eq!(h.placement.call_count(), 0);
    }

    #[tokio::test]
    async fn test_connect_rejects_fragment() {
        let h = accepting_harness();
        let body = encode_wire_message(signalv2_wire_message::Message::Fragment(Fragment {
            packet_id: 1,
            fragment_number: 1,
            num_fragments: 2,
            data: vec![1, 2, 3],
        }))
        .unwrap();

        let result = h
            .connect_router
            .connect(Some("application/x-protobuf"), body.into(), &ctx())
            .await;

        assert!(matches!(result, Err(SignalError::FragmentsNotAllowed)));
        assert_eq!(h.placement.call_count(), 0);
        assert_eq!(h.router.call_count(), 0);
    }

    #[tokio::test]
    async fn test_connect_rejects_malformed_body() {
        let h = accepting_harness();

        let result = h
            .connect_router
            .connect(Some("application/x-protobuf"), vec![0x0a, 0x64, 0x01].into(), &ctx())
            .await;

        assert!(matches!(result, Err(SignalError::MalformedMessage(_))));
    }

    #[tokio::test]
    async fn test_connect_rejects_empty_envelope() {
        let h = accepting_harness();

        let result = h
            .connect_router
            .connect(Some("application/x-protobuf"), encode(vec![]).into(), &ctx())
            .await;

        assert!(matches!(result, Err(SignalError::MalformedMessage(_))));
        assert_eq!(result.unwrap_err().status_code(), 400);
        assert_eq!(h.placement.call_count(), 0);
        assert_eq!(h.router.call_count(), 0);
    }

    #[tokio::test]
    async fn test_connect_rejects_leading_unknown_message() {
        let h = accepting_harness();
        let body = encode(vec![
            signalv2_client_message::Message::Trickle(TrickleRequest::default()),
            signalv2_client_message::Message::ConnectRequest(ConnectRequest::default()),
        ]);

        let result = h
            .connect_router
            .connect(Some("application/x-protobuf"), body.into(), &ctx())
            .await;

        assert!(matches!(result, Err(SignalError::UnknownMessageType(ref kind)) if kind == "trickle"));
        assert_eq!(h.router.call_count(), 0);
    }

    #[tokio::test]
    async fn test_connect_returns_validator_error_verbatim() {
        let h = harness(
            MockConnectValidator::rejecting(StatusCode::FORBIDDEN, "room is locked"),
            MockPlacementClient::accepting(),
            MockMessageRouter::responding(connect_response()),
        );

        let err = h
            .connect_router
            .connect(Some("application/x-protobuf"), connect_body().into(), &ctx())
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 403);
        assert_eq!(err.to_string(), "room is locked");
        assert_eq!(h.placement.call_count(), 0);
    }

    #[tokio::test]
    async fn test_connect_placement_failure_is_internal() {
        let h = harness(
            MockConnectValidator::accepting(validated()),
            MockPlacementClient::failing(RpcError::status(
                tonic::Code::ResourceExhausted,
                "no nodes available",
            )),
            MockMessageRouter::responding(connect_response()),
        );

        let err = h
            .connect_router
            .connect(Some("application/x-protobuf"), connect_body().into(), &ctx())
            .await
            .unwrap_err();

        assert!(matches!(err, SignalError::Internal(ref m) if m == "no nodes available"));
        assert_eq!(h.router.call_count(), 0);
    }

    #[tokio::test]
    async fn test_connect_router_failure_is_internal() {
        let h = harness(
            MockConnectValidator::accepting(validated()),
            MockPlacementClient::accepting(),
            MockMessageRouter::failing(RpcError::status(tonic::Code::NotFound, "room gone")),
        );

        let err = h
            .connect_router
            .connect(Some("application/x-protobuf"), connect_body().into(), &ctx())
            .await
            .unwrap_err();

        // connect failures are never reclassified as 404
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn test_connect_missing_connect_response_is_internal() {
        let h = harness(
            MockConnectValidator::accepting(validated()),
            MockPlacementClient::accepting(),
            MockMessageRouter::empty(),
        );

        let err = h
            .connect_router
            .connect(Some("application/x-protobuf"), connect_body().into(), &ctx())
            .await
            .unwrap_err();

        assert!(matches!(err, SignalError::Internal(_)));
    }

    #[test]
    fn test_augment_creates_client_info() {
        let mut request = ConnectRequest::default();
        augment_client_info(&mut request, &ctx());

        assert_eq!(request.client_info.unwrap().address, "203.0.113.7");
    }

    #[test]
    fn test_augment_keeps_client_fields() {
        let mut request = ConnectRequest {
            client_info: Some(ClientInfo {
                sdk: "js".to_string(),
                address: "spoofed".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };
        augment_client_info(&mut request, &ctx());

        let info = request.client_info.unwrap();
        assert_eq!(info.sdk, "js");
        assert_eq!(info.address, "203.0.113.7");
    }
}
