//! Participant Relay.
//!
//! Forwards an in-session wire message to the node holding the
//! participant's session. The gateway keeps no session state; the topic is
//! recomputed from the caller's grants on every request.

use crate::context::RequestContext;
use crate::errors::{translate_relay_error, SignalError};
use crate::services::{
    ensure_protobuf_content_type, ParticipantRelayClient, RequestBody, TopicFormatter,
};
use bytes::Bytes;
use common::types::ParticipantId;
use signal_proto::codec::{decode_wire_message, encode_wire_message, into_wire_message};
use signal_proto::internal::RelaySignalv2ParticipantRequest;
use signal_proto::signaling::Signalv2WireMessage;
use std::sync::Arc;
use tracing::instrument;

pub struct ParticipantRelay {
    topics: Arc<dyn TopicFormatter>,
    client: Arc<dyn ParticipantRelayClient>,
}

impl ParticipantRelay {
    pub fn new(topics: Arc<dyn TopicFormatter>, client: Arc<dyn ParticipantRelayClient>) -> Self {
        Self { topics, client }
    }

    /// Relay one wire message for `participant_id`.
    ///
    /// Checks run in a fixed order so the same request always fails the
    /// same way: content type, video grant, join permission, room name,
    /// identity, participant id, body. The body is only read once every
    /// header-level check has passed.
    #[instrument(skip_all, name = "signal.participant_action", fields(participant_id = %participant_id))]
    pub async fn participant_action(
        &self,
        content_type: Option<&str>,
        participant_id: &ParticipantId,
        body: RequestBody,
        ctx: &RequestContext,
    ) -> Result<Bytes, SignalError> {
        ensure_protobuf_content_type(content_type)?;

        let grants = ctx
            .grants()
            .filter(|grants| grants.has_video_grant())
            .ok_or(SignalError::PermissionDenied)?;

        let room_name = grants.ensure_join_permission()?;
        if room_name.is_empty() {
            return Err(SignalError::NoRoomName);
        }

        let participant_identity = grants.participant_identity();
        if participant_identity.is_empty() {
            return Err(SignalError::IdentityEmpty);
        }

        if participant_id.is_empty() {
            return Err(SignalError::ParticipantSidEmpty);
        }

        let body = body.read().await?;

        // fragments pass through untouched
        let wire_message =
            decode_wire_message(&body).map_err(|e| SignalError::MalformedMessage(e.to_string()))?;

        let topic = self
            .topics
            .participant_topic(ctx, &room_name, &participant_identity);

        let response = self
            .client
            .relay_participant(
                ctx,
                &topic,
                RelaySignalv2ParticipantRequest {
                    room: room_name.to_string(),
                    participant_identity: participant_identity.to_string(),
                    participant_id: participant_id.to_string(),
                    wire_message: Some(Signalv2WireMessage::from(wire_message)),
                },
            )
            .await
            .map_err(|e| {
                tracing::debug!(
                    target: "signal.services.relay",
                    topic = %topic,
                    error = %e,
                    "Participant relay failed"
                );
                translate_relay_error(e)
            })?;

        let reply = response
            .wire_message
            .and_then(|message| into_wire_message(message).ok())
            .ok_or_else(|| {
                SignalError::Internal("room node returned no wire message".to_string())
            })?;

        tracing::debug!(
            target: "signal.services.relay",
            room = %room_name,
            participant = %participant_identity,
            participant_id = %participant_id,
            response_kind = reply.kind(),
            "participant response"
        );

        encode_wire_message(reply).map_err(|e| SignalError::Internal(e.to_string()))
    }
}
