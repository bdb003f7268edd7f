//! Topic naming on the signal bus.
//!
//! A topic is recomputed on every call from `(room, identity)` and never
//! stored, so the formatter must be a pure function of its inputs.

use crate::context::RequestContext;
use crate::services::TopicFormatter;
use common::types::{ParticipantIdentity, RoomName};
use std::fmt;

/// Routing key for one call on the signal bus.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topic(String);

impl Topic {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Formats `{namespace}.room.{room}` and
/// `{namespace}.participant.{room_len}.{room}.{identity}`.
///
/// The room length prefix keeps participant topics distinct when room
/// names or identities contain dots.
#[derive(Debug, Clone)]
pub struct NamespacedTopicFormatter {
    namespace: String,
}

impl NamespacedTopicFormatter {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }
}

impl TopicFormatter for NamespacedTopicFormatter {
    fn participant_topic(
        &self,
        _ctx: &RequestContext,
        room: &RoomName,
        identity: &ParticipantIdentity,
    ) -> Topic {
        Topic(format!(
            "{}.participant.{}.{}.{}",
            self.namespace,
            room.as_str().len(),
            room,
            identity
        ))
    }

    fn room_topic(&self, _ctx: &RequestContext, room: &RoomName) -> Topic {
        Topic(format!("{}.room.{}", self.namespace, room))
    }
}
