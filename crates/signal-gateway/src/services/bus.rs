//! Signal bus gRPC client.
//!
//! The signal bus is a topic-routed gRPC front for the room-hosting nodes:
//! every unary call carries its topic in `x-signal-topic` metadata and the
//! bus delivers it to whichever node subscribes to that topic.
//!
//! # Security
//!
//! - Optional service token sent as a bearer `authorization` entry
//! - Every call is bounded by the inbound request's remaining budget

use crate::config::Config;
use crate::context::RequestContext;
use crate::errors::RpcError;
use crate::observability::metrics;
use crate::services::{
    MessageRouter, ParticipantRelayClient, PlacementClient, Topic, TopicFormatter,
};
use common::secret::{ExposeSecret, SecretString};
use common::types::{ParticipantIdentity, RoomName};
use signal_proto::internal::{
    paths, RelaySignalv2ConnectRequest, RelaySignalv2ConnectResponse,
    RelaySignalv2ParticipantRequest, RelaySignalv2ParticipantResponse, SelectRoomNodeRequest,
    SelectRoomNodeResponse,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::transport::{Channel, Endpoint};
use tracing::instrument;

/// Metadata key carrying the routing topic.
pub const TOPIC_METADATA_KEY: &str = "x-signal-topic";

/// Client for all three signal bus services over one shared channel.
#[derive(Clone)]
pub struct SignalBusClient {
    channel: Channel,
    topics: Arc<dyn TopicFormatter>,
    service_token: Option<SecretString>,
    auto_create: bool,
}

impl SignalBusClient {
    /// Build a client whose channel connects on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if `bus_url` is not a valid endpoint URI.
    pub fn connect_lazy(
        config: &Config,
        topics: Arc<dyn TopicFormatter>,
    ) -> Result<Self, tonic::transport::Error> {
        let channel = Endpoint::from_shared(config.bus_url.clone())?
            .connect_timeout(Duration::from_secs(config.bus_connect_timeout_seconds))
            .connect_lazy();

        Ok(Self {
            channel,
            topics,
            service_token: config.service_token.clone(),
            auto_create: config.room_auto_create,
        })
    }

    /// Issue one unary call on `topic`.
    async fn unary<Req, Resp>(
        &self,
        ctx: &RequestContext,
        path: &'static str,
        topic: &Topic,
        message: Req,
    ) -> Result<Resp, RpcError>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let start = Instant::now();
        let result = self.call(ctx, path, topic, message).await;

        let status = match &result {
            Ok(_) => "success",
            Err(RpcError::Status { .. }) => "error",
            Err(RpcError::Transport(_)) => "transport_error",
        };
        metrics::record_bus_call(path, status, start.elapsed());

        result
    }

    async fn call<Req, Resp>(
        &self,
        ctx: &RequestContext,
        path: &'static str,
        topic: &Topic,
        message: Req,
    ) -> Result<Resp, RpcError>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let remaining = ctx.remaining();
        if remaining.is_zero() {
            return Err(RpcError::status(
                tonic::Code::DeadlineExceeded,
                "request deadline exceeded",
            ));
        }

        let mut request = tonic::Request::new(message);
        request.set_timeout(remaining);

        let topic_value: MetadataValue<Ascii> = topic.as_str().parse().map_err(|_| {
            RpcError::status(
                tonic::Code::InvalidArgument,
                "topic is not valid request metadata",
            )
        })?;
        request.metadata_mut().insert(TOPIC_METADATA_KEY, topic_value);

        if let Some(token) = &self.service_token {
            let value = format!("Bearer {}", token.expose_secret())
                .parse()
                .map_err(|_| {
                    tracing::error!(target: "signal.services.bus", "Invalid service token format");
                    RpcError::Transport("invalid service token".to_string())
                })?;
            request.metadata_mut().insert("authorization", value);
        }

        let mut grpc = tonic::client::Grpc::new(self.channel.clone());
        grpc.ready().await.map_err(|e| {
            tracing::warn!(target: "signal.services.bus", error = %e, "Signal bus unavailable");
            RpcError::Transport(e.to_string())
        })?;

        let codec: ProstCodec<Req, Resp> = ProstCodec::default();
        let response = grpc
            .unary(request, PathAndQuery::from_static(path), codec)
            .await
            .map_err(|status| {
                tracing::debug!(
                    target: "signal.services.bus",
                    path = path,
                    topic = %topic,
                    code = ?status.code(),
                    "Signal bus call failed"
                );
                RpcError::from(status)
            })?;

        Ok(response.into_inner())
    }
}

#[async_trait::async_trait]
impl PlacementClient for SignalBusClient {
    #[instrument(skip_all, fields(room = %room))]
    async fn select_room_node(
        &self,
        ctx: &RequestContext,
        room: &RoomName,
        node_id_hint: &str,
    ) -> Result<(), RpcError> {
        let topic = self.topics.room_topic(ctx, room);
        let response: SelectRoomNodeResponse = self
            .unary(
                ctx,
                paths::SELECT_ROOM_NODE,
                &topic,
                SelectRoomNodeRequest {
                    room_name: room.to_string(),
                    node_id_hint: node_id_hint.to_string(),
                },
            )
            .await?;

        tracing::debug!(
            target: "signal.services.bus",
            room = %room,
            node_id = %response.node_id,
            "Room node selected"
        );

        Ok(())
    }

    fn auto_create_enabled(&self) -> bool {
        self.auto_create
    }
}

#[async_trait::async_trait]
impl MessageRouter for SignalBusClient {
    #[instrument(skip_all, fields(room = %room, participant = %identity))]
    async fn handle_participant_connect_request(
        &self,
        ctx: &RequestContext,
        room: &RoomName,
        identity: &ParticipantIdentity,
        request: RelaySignalv2ConnectRequest,
    ) -> Result<RelaySignalv2ConnectResponse, RpcError> {
        let topic = self.topics.room_topic(ctx, room);
        self.unary(ctx, paths::RELAY_CONNECT, &topic, request).await
    }
}

#[async_trait::async_trait]
impl ParticipantRelayClient for SignalBusClient {
    #[instrument(skip_all, fields(topic = %topic))]
    async fn relay_participant(
        &self,
        ctx: &RequestContext,
        topic: &Topic,
        request: RelaySignalv2ParticipantRequest,
    ) -> Result<RelaySignalv2ParticipantResponse, RpcError> {
        self.unary(ctx, paths::RELAY_PARTICIPANT, topic, request)
            .await
    }
}
