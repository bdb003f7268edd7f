//! In-memory collaborators for tests.
//!
//! Each mock counts its calls and records what it was asked, so tests can
//! assert both on the HTTP outcome and on what reached the "backend".

use crate::config::LimitConfig;
use crate::context::RequestContext;
use crate::errors::{RpcError, SignalError};
use crate::services::{
    ConnectParams, ConnectValidator, MessageRouter, ParticipantRelayClient, PlacementClient,
    Topic, ValidatedConnect,
};
use axum::http::StatusCode;
use common::types::{ParticipantIdentity, RoomName};
use signal_proto::internal::{
    RelaySignalv2ConnectRequest, RelaySignalv2ConnectResponse, RelaySignalv2ParticipantRequest,
    RelaySignalv2ParticipantResponse,
};
use signal_proto::signaling::{ConnectResponse, Signalv2WireMessage};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

/// Validator that returns a fixed outcome without looking at the request.
pub struct MockConnectValidator {
    outcome: Result<ValidatedConnect, (StatusCode, String)>,
    call_count: AtomicUsize,
}

impl MockConnectValidator {
    pub fn accepting(validated: ValidatedConnect) -> Self {
        Self {
            outcome: Ok(validated),
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn rejecting(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            outcome: Err((status, message.into())),
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ConnectValidator for MockConnectValidator {
    async fn validate(
        &self,
        _ctx: &RequestContext,
        _limits: &LimitConfig,
        _params: ConnectParams,
        _router: &dyn MessageRouter,
        _placement: &dyn PlacementClient,
    ) -> Result<ValidatedConnect, SignalError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        match &self.outcome {
            Ok(validated) => Ok(validated.clone()),
            Err((status, message)) => Err(SignalError::rejected(*status, message.clone())),
        }
    }
}

/// Placement client recording `(room, node_id_hint)` per call.
pub struct MockPlacementClient {
    error: Option<RpcError>,
    delay: Option<Duration>,
    auto_create: bool,
    call_count: AtomicUsize,
    requests: Mutex<Vec<(RoomName, String)>>,
}

impl MockPlacementClient {
    pub fn accepting() -> Self {
        Self {
            error: None,
            delay: None,
            auto_create: true,
            call_count: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: RpcError) -> Self {
        Self {
            error: Some(error),
            ..Self::accepting()
        }
    }

    /// Accepts, but only after `delay` has passed.
    pub fn stalled(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::accepting()
        }
    }

    pub fn without_auto_create() -> Self {
        Self {
            auto_create: false,
            ..Self::accepting()
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub async fn requests(&self) -> Vec<(RoomName, String)> {
        self.requests.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl PlacementClient for MockPlacementClient {
    async fn select_room_node(
        &self,
        _ctx: &RequestContext,
        room: &RoomName,
        node_id_hint: &str,
    ) -> Result<(), RpcError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .await
            .push((room.clone(), node_id_hint.to_string()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn auto_create_enabled(&self) -> bool {
        self.auto_create
    }
}

/// Message router returning a canned relay-connect response.
pub struct MockMessageRouter {
    response: Result<RelaySignalv2ConnectResponse, RpcError>,
    call_count: AtomicUsize,
    requests: Mutex<Vec<(RoomName, ParticipantIdentity, RelaySignalv2ConnectRequest)>>,
}

impl MockMessageRouter {
    pub fn responding(connect_response: ConnectResponse) -> Self {
        Self::with_response(Ok(RelaySignalv2ConnectResponse {
            connect_response: Some(connect_response),
        }))
    }

    /// Responds successfully but without a `ConnectResponse`.
    pub fn empty() -> Self {
        Self::with_response(Ok(RelaySignalv2ConnectResponse::default()))
    }

    pub fn failing(error: RpcError) -> Self {
        Self::with_response(Err(error))
    }

    fn with_response(response: Result<RelaySignalv2ConnectResponse, RpcError>) -> Self {
        Self {
            response,
            call_count: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub async fn requests(
        &self,
    ) -> Vec<(RoomName, ParticipantIdentity, RelaySignalv2ConnectRequest)> {
        self.requests.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl MessageRouter for MockMessageRouter {
    async fn handle_participant_connect_request(
        &self,
        _ctx: &RequestContext,
        room: &RoomName,
        identity: &ParticipantIdentity,
        request: RelaySignalv2ConnectRequest,
    ) -> Result<RelaySignalv2ConnectResponse, RpcError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .await
            .push((room.clone(), identity.clone(), request));

        self.response.clone()
    }
}

/// Participant relay client returning a canned response.
pub struct MockParticipantRelayClient {
    response: Result<RelaySignalv2ParticipantResponse, RpcError>,
    call_count: AtomicUsize,
    requests: Mutex<Vec<(Topic, RelaySignalv2ParticipantRequest)>>,
}

impl MockParticipantRelayClient {
    pub fn responding(wire_message: Signalv2WireMessage) -> Self {
        Self::with_response(Ok(RelaySignalv2ParticipantResponse {
            wire_message: Some(wire_message),
        }))
    }

    /// Responds successfully but without a wire message.
    pub fn empty() -> Self {
        Self::with_response(Ok(RelaySignalv2ParticipantResponse::default()))
    }

    pub fn failing(error: RpcError) -> Self {
        Self::with_response(Err(error))
    }

    fn with_response(response: Result<RelaySignalv2ParticipantResponse, RpcError>) -> Self {
        Self {
            response,
            call_count: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub async fn requests(&self) -> Vec<(Topic, RelaySignalv2ParticipantRequest)> {
        self.requests.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl ParticipantRelayClient for MockParticipantRelayClient {
    async fn relay_participant(
        &self,
        _ctx: &RequestContext,
        topic: &Topic,
        request: RelaySignalv2ParticipantRequest,
    ) -> Result<RelaySignalv2ParticipantResponse, RpcError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push((topic.clone(), request));

        self.response.clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_mock_placement_records_requests() {
        let mock = MockPlacementClient::accepting();
        let ctx = RequestContext::new(Duration::from_secs(1));

        mock.select_room_node(&ctx, &RoomName::from("r1"), "")
            .await
            .unwrap();

        assert_eq!(mock.call_count(), 1);
        assert_eq!(mock.requests().await, vec![(RoomName::from("r1"), String::new())]);
        assert!(mock.auto_create_enabled());
        assert!(!MockPlacementClient::without_auto_create().auto_create_enabled());
    }

    #[tokio::test]
    async fn test_mock_relay_failing() {
        let mock = MockParticipantRelayClient::failing(RpcError::Transport("down".to_string()));
        let ctx = RequestContext::new(Duration::from_secs(1));

        let result = mock
            .relay_participant(
                &ctx,
                &Topic::new("t"),
                RelaySignalv2ParticipantRequest::default(),
            )
            .await;

        assert!(matches!(result, Err(RpcError::Transport(_))));
        assert_eq!(mock.call_count(), 1);
    }
}
