//! Client-server signaling messages (`package signal`).

/// Top-level unit on the wire: either a batch of messages or a fragment of one.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Signalv2WireMessage {
    #[prost(oneof = "signalv2_wire_message::Message", tags = "1, 2")]
    pub message: ::core::option::Option<signalv2_wire_message::Message>,
}

pub mod signalv2_wire_message {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Message {
        #[prost(message, tag = "1")]
        Envelope(super::Envelope),
        #[prost(message, tag = "2")]
        Fragment(super::Fragment),
    }

    impl Message {
        /// Stable name of the active variant, for logs and error text.
        pub fn kind(&self) -> &'static str {
            match self {
                Message::Envelope(_) => "envelope",
                Message::Fragment(_) => "fragment",
            }
        }
    }

    impl From<Message> for super::Signalv2WireMessage {
        fn from(message: Message) -> Self {
            Self {
                message: Some(message),
            }
        }
    }
}

/// Ordered batch of client or server messages.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Envelope {
    #[prost(message, repeated, tag = "1")]
    pub client_messages: ::prost::alloc::vec::Vec<Signalv2ClientMessage>,
    #[prost(message, repeated, tag = "2")]
    pub server_messages: ::prost::alloc::vec::Vec<Signalv2ServerMessage>,
}

impl Envelope {
    /// Envelope carrying a single server message.
    pub fn from_server_message(message: signalv2_server_message::Message) -> Self {
        Self {
            client_messages: Vec::new(),
            server_messages: vec![Signalv2ServerMessage {
                message: Some(message),
            }],
        }
    }
}

/// Continuation unit of a message split across streaming frames.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Fragment {
    #[prost(uint32, tag = "1")]
    pub packet_id: u32,
    #[prost(uint32, tag = "2")]
    pub fragment_number: u32,
    #[prost(uint32, tag = "3")]
    pub num_fragments: u32,
    #[prost(bytes = "vec", tag = "4")]
    pub data: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Signalv2ClientMessage {
    #[prost(oneof = "signalv2_client_message::Message", tags = "1, 2, 3, 4, 5, 6, 7")]
    pub message: ::core::option::Option<signalv2_client_message::Message>,
}

pub mod signalv2_client_message {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Message {
        #[prost(message, tag = "1")]
        ConnectRequest(super::ConnectRequest),
        #[prost(message, tag = "2")]
        PublisherSdp(super::SessionDescription),
        #[prost(message, tag = "3")]
        SubscriberSdp(super::SessionDescription),
        #[prost(message, tag = "4")]
        Trickle(super::TrickleRequest),
        #[prost(message, tag = "5")]
        MuteTrack(super::MuteTrackRequest),
        #[prost(message, tag = "6")]
        UpdateSubscription(super::UpdateSubscription),
        #[prost(message, tag = "7")]
        Leave(super::LeaveRequest),
    }

    impl Message {
        /// Stable name of the active variant, for logs and error text.
        pub fn kind(&self) -> &'static str {
            match self {
                Message::ConnectRequest(_) => "connect_request",
                Message::PublisherSdp(_) => "publisher_sdp",
                Message::SubscriberSdp(_) => "subscriber_sdp",
                Message::Trickle(_) => "trickle",
                Message::MuteTrack(_) => "mute_track",
                Message::UpdateSubscription(_) => "update_subscription",
                Message::Leave(_) => "leave",
            }
        }
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Signalv2ServerMessage {
    #[prost(oneof = "signalv2_server_message::Message", tags = "1, 2, 3, 4, 5")]
    pub message: ::core::option::Option<signalv2_server_message::Message>,
}

pub mod signalv2_server_message {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Message {
        #[prost(message, tag = "1")]
        ConnectResponse(super::ConnectResponse),
        #[prost(message, tag = "2")]
        PublisherSdp(super::SessionDescription),
        #[prost(message, tag = "3")]
        SubscriberSdp(super::SessionDescription),
        #[prost(message, tag = "4")]
        Trickle(super::TrickleRequest),
        #[prost(message, tag = "5")]
        Leave(super::LeaveRequest),
    }

    impl Message {
        pub fn kind(&self) -> &'static str {
            match self {
                Message::ConnectResponse(_) => "connect_response",
                Message::PublisherSdp(_) => "publisher_sdp",
                Message::SubscriberSdp(_) => "subscriber_sdp",
                Message::Trickle(_) => "trickle",
                Message::Leave(_) => "leave",
            }
        }
    }
}

/// First message of a session: asks the gateway to place and join a room.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ConnectRequest {
    #[prost(message, optional, tag = "1")]
    pub client_info: ::core::option::Option<ClientInfo>,
    #[prost(string, tag = "2")]
    pub metadata: ::prost::alloc::string::String,
    #[prost(map = "string, string", tag = "3")]
    pub participant_attributes:
        ::std::collections::HashMap<::prost::alloc::string::String, ::prost::alloc::string::String>,
}

/// Client SDK and device details. `address` is filled in by the gateway.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ClientInfo {
    #[prost(string, tag = "1")]
    pub sdk: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub version: ::prost::alloc::string::String,
    #[prost(int32, tag = "3")]
    pub protocol: i32,
    #[prost(string, tag = "4")]
    pub os: ::prost::alloc::string::String,
    #[prost(string, tag = "5")]
    pub os_version: ::prost::alloc::string::String,
    #[prost(string, tag = "6")]
    pub device_model: ::prost::alloc::string::String,
    #[prost(string, tag = "7")]
    pub browser: ::prost::alloc::string::String,
    #[prost(string, tag = "8")]
    pub browser_version: ::prost::alloc::string::String,
    #[prost(string, tag = "9")]
    pub address: ::prost::alloc::string::String,
    #[prost(string, tag = "10")]
    pub network: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ConnectResponse {
    #[prost(message, optional, tag = "1")]
    pub room: ::core::option::Option<Room>,
    #[prost(message, optional, tag = "2")]
    pub participant: ::core::option::Option<ParticipantInfo>,
    #[prost(message, repeated, tag = "3")]
    pub other_participants: ::prost::alloc::vec::Vec<ParticipantInfo>,
    #[prost(message, repeated, tag = "4")]
    pub ice_servers: ::prost::alloc::vec::Vec<IceServer>,
}

/// Room as reported by the hosting node. `sid` may still be empty when a
/// freshly created room has not been assigned one yet.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Room {
    #[prost(string, tag = "1")]
    pub sid: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub name: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub metadata: ::prost::alloc::string::String,
    #[prost(uint32, tag = "4")]
    pub num_participants: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ParticipantInfo {
    #[prost(string, tag = "1")]
    pub sid: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub identity: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub name: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub metadata: ::prost::alloc::string::String,
    #[prost(map = "string, string", tag = "5")]
    pub attributes:
        ::std::collections::HashMap<::prost::alloc::string::String, ::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IceServer {
    #[prost(string, repeated, tag = "1")]
    pub urls: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(string, tag = "2")]
    pub username: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub credential: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SessionDescription {
    /// "offer" or "answer"
    #[prost(string, tag = "1")]
    pub r#type: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub sdp: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TrickleRequest {
    #[prost(string, tag = "1")]
    pub candidate_init: ::prost::alloc::string::String,
    #[prost(enumeration = "SignalTarget", tag = "2")]
    pub target: i32,
    #[prost(bool, tag = "3")]
    pub r#final: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MuteTrackRequest {
    #[prost(string, tag = "1")]
    pub sid: ::prost::alloc::string::String,
    #[prost(bool, tag = "2")]
    pub muted: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateSubscription {
    #[prost(string, repeated, tag = "1")]
    pub track_sids: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(bool, tag = "2")]
    pub subscribe: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LeaveRequest {
    #[prost(bool, tag = "1")]
    pub can_reconnect: bool,
    #[prost(enumeration = "DisconnectReason", tag = "2")]
    pub reason: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum SignalTarget {
    Publisher = 0,
    Subscriber = 1,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum DisconnectReason {
    UnknownReason = 0,
    ClientInitiated = 1,
    DuplicateIdentity = 2,
    ServerShutdown = 3,
    ParticipantRemoved = 4,
    RoomDeleted = 5,
}
