//! Service layer for the Signal Gateway.
//!
//! The two entry operations live on [`SignalingGateway`]:
//!
//! - `connect` - validate, place, and hand a new session to its room's node
//! - `participant_action` - relay an in-session message to the node holding it
//!
//! Everything the gateway talks to sits behind a trait so deployments (and
//! tests) can swap implementations.
//!
//! # Components
//!
//! - `connect` - Connect Router orchestration
//! - `relay` - Participant Relay orchestration
//! - `body` - size-capped request body reading
//! - `validator` - default connect validation (grants and limits)
//! - `bus` - gRPC clients over the signal bus
//! - `topic` - topic naming
//! - `mock` - in-memory collaborators for tests

pub mod body;
pub mod bus;
pub mod connect;
pub mod mock;
pub mod relay;
pub mod topic;
pub mod validator;

use crate::auth::claims::GrantSet;
use crate::config::LimitConfig;
use crate::context::RequestContext;
use crate::errors::{RpcError, SignalError};
use crate::observability::metrics;
use bytes::Bytes;
use common::types::{ParticipantId, ParticipantIdentity, RoomName};
use signal_proto::internal::{
    CreateRoomRequest, RelaySignalv2ConnectRequest, RelaySignalv2ConnectResponse,
    RelaySignalv2ParticipantRequest, RelaySignalv2ParticipantResponse,
};
use std::collections::HashMap;
use std::sync::Arc;

pub use body::RequestBody;
pub use connect::{ConnectRequestContext, ConnectRouter};
pub use relay::ParticipantRelay;
pub use topic::{NamespacedTopicFormatter, Topic};
pub use validator::DefaultConnectValidator;

/// The only content type either endpoint accepts.
pub const PROTOBUF_CONTENT_TYPE: &str = "application/x-protobuf";

/// Fields of a connect request the validator inspects.
#[derive(Debug, Clone, Default)]
pub struct ConnectParams {
    pub metadata: String,
    pub attributes: HashMap<String, String>,
}

/// Outcome of a successful connect validation.
#[derive(Debug, Clone)]
pub struct ValidatedConnect {
    pub grants: GrantSet,
    pub room_name: RoomName,
    pub create_room: Option<CreateRoomRequest>,
}

/// Decides whether a connect request may proceed.
///
/// Errors are returned to the client as-is, so implementations choose the
/// status (typically via `SignalError::Rejected` or an auth variant).
#[async_trait::async_trait]
pub trait ConnectValidator: Send + Sync {
    async fn validate(
        &self,
        ctx: &RequestContext,
        limits: &LimitConfig,
        params: ConnectParams,
        router: &dyn MessageRouter,
        placement: &dyn PlacementClient,
    ) -> Result<ValidatedConnect, SignalError>;
}

/// Selects or confirms the node hosting a room.
#[async_trait::async_trait]
pub trait PlacementClient: Send + Sync {
    async fn select_room_node(
        &self,
        ctx: &RequestContext,
        room: &RoomName,
        node_id_hint: &str,
    ) -> Result<(), RpcError>;

    /// Whether rooms are created on first join.
    fn auto_create_enabled(&self) -> bool;
}

/// Forwards a validated connect request to the room's node.
#[async_trait::async_trait]
pub trait MessageRouter: Send + Sync {
    async fn handle_participant_connect_request(
        &self,
        ctx: &RequestContext,
        room: &RoomName,
        identity: &ParticipantIdentity,
        request: RelaySignalv2ConnectRequest,
    ) -> Result<RelaySignalv2ConnectResponse, RpcError>;
}

/// Deterministic topic naming.
pub trait TopicFormatter: Send + Sync {
    fn participant_topic(
        &self,
        ctx: &RequestContext,
        room: &RoomName,
        identity: &ParticipantIdentity,
    ) -> Topic;

    fn room_topic(&self, ctx: &RequestContext, room: &RoomName) -> Topic;
}

/// Typed RPC to whichever node subscribes to a participant topic.
#[async_trait::async_trait]
pub trait ParticipantRelayClient: Send + Sync {
    async fn relay_participant(
        &self,
        ctx: &RequestContext,
        topic: &Topic,
        request: RelaySignalv2ParticipantRequest,
    ) -> Result<RelaySignalv2ParticipantResponse, RpcError>;
}

/// Collaborators a [`SignalingGateway`] is built from.
#[derive(Clone)]
pub struct Collaborators {
    pub validator: Arc<dyn ConnectValidator>,
    pub placement: Arc<dyn PlacementClient>,
    pub router: Arc<dyn MessageRouter>,
    pub topics: Arc<dyn TopicFormatter>,
    pub relay: Arc<dyn ParticipantRelayClient>,
}

/// Composes the Connect Router and the Participant Relay.
pub struct SignalingGateway {
    connect_router: ConnectRouter,
    participant_relay: ParticipantRelay,
}

impl SignalingGateway {
    pub fn new(limits: LimitConfig, collaborators: Collaborators) -> Self {
        let Collaborators {
            validator,
            placement,
            router,
            topics,
            relay,
        } = collaborators;

        Self {
            connect_router: ConnectRouter::new(limits, validator, placement, router),
            participant_relay: ParticipantRelay::new(topics, relay),
        }
    }

    /// Establish a session. Returns the encoded wire message carrying the
    /// `ConnectResponse`.
    pub async fn connect(
        &self,
        content_type: Option<&str>,
        body: RequestBody,
        ctx: &RequestContext,
    ) -> Result<Bytes, SignalError> {
        let result = self.connect_router.connect(content_type, body, ctx).await;
        metrics::record_connect(status_of(&result));
        result
    }

    /// Relay an in-session message. Returns the encoded response wire message.
    pub async fn participant_action(
        &self,
        content_type: Option<&str>,
        participant_id: &ParticipantId,
        body: RequestBody,
        ctx: &RequestContext,
    ) -> Result<Bytes, SignalError> {
        let result = self
            .participant_relay
            .participant_action(content_type, participant_id, body, ctx)
            .await;
        metrics::record_relay(status_of(&result));
        result
    }
}

fn status_of<T>(result: &Result<T, SignalError>) -> u16 {
    match result {
        Ok(_) => 200,
        Err(e) => e.status_code(),
    }
}

/// Reject anything but an exact `application/x-protobuf` content type.
pub(crate) fn ensure_protobuf_content_type(content_type: Option<&str>) -> Result<(), SignalError> {
    match content_type {
        Some(PROTOBUF_CONTENT_TYPE) => Ok(()),
        other => Err(SignalError::UnsupportedContentType(
            other.unwrap_or_default().to_string(),
        )),
    }
}
