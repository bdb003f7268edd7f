//! Internal gateway-to-node RPC payloads (`package signal.internal`).
//!
//! These travel over the signal bus as unary gRPC calls. The bus routes
//! each call by the `x-signal-topic` metadata entry, so the gateway never
//! needs to know which physical node serves a room.

use crate::signaling::{ConnectRequest, ConnectResponse, Signalv2WireMessage};

/// Fully-qualified gRPC method paths on the signal bus.
pub mod paths {
    /// Room allocator: pick (or confirm) the node hosting a room.
    pub const SELECT_ROOM_NODE: &str = "/signal.internal.RoomAllocator/SelectRoomNode";

    /// Signal router: hand a validated connect request to the room's node.
    pub const RELAY_CONNECT: &str = "/signal.internal.SignalRouter/RelayConnect";

    /// Participant relay: forward an in-session wire message.
    pub const RELAY_PARTICIPANT: &str = "/signal.internal.ParticipantRelay/RelayParticipant";
}

/// Directive to create the room on first join.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateRoomRequest {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub room_preset: ::prost::alloc::string::String,
    #[prost(uint32, tag = "3")]
    pub empty_timeout: u32,
    #[prost(uint32, tag = "4")]
    pub max_participants: u32,
    #[prost(string, tag = "5")]
    pub metadata: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RelaySignalv2ConnectRequest {
    /// JSON-serialized grant set of the connecting participant.
    #[prost(string, tag = "1")]
    pub grants_json: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "2")]
    pub create_room: ::core::option::Option<CreateRoomRequest>,
    #[prost(message, optional, tag = "3")]
    pub connect_request: ::core::option::Option<ConnectRequest>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RelaySignalv2ConnectResponse {
    #[prost(message, optional, tag = "1")]
    pub connect_response: ::core::option::Option<ConnectResponse>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RelaySignalv2ParticipantRequest {
    #[prost(string, tag = "1")]
    pub room: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub participant_identity: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub participant_id: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "4")]
    pub wire_message: ::core::option::Option<Signalv2WireMessage>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RelaySignalv2ParticipantResponse {
    #[prost(message, optional, tag = "1")]
    pub wire_message: ::core::option::Option<Signalv2WireMessage>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SelectRoomNodeRequest {
    #[prost(string, tag = "1")]
    pub room_name: ::prost::alloc::string::String,
    /// Preferred node, empty to let the allocator decide.
    #[prost(string, tag = "2")]
    pub node_id_hint: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SelectRoomNodeResponse {
    #[prost(string, tag = "1")]
    pub node_id: ::prost::alloc::string::String,
}
