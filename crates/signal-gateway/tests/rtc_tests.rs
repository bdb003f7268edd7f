//! Router-level tests for the signaling endpoints.
//!
//! Drives the full axum stack (auth middleware, handlers, services, error
//! rendering) with in-memory collaborators standing in for the signal bus.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::IntoResponse;
use axum::Router;
use common::types::ParticipantId;
use http_body_util::BodyExt;
use metrics_exporter_prometheus::PrometheusBuilder;
use signal_gateway::auth::claims::{GrantSet, VideoGrant};
use signal_gateway::config::Config;
use signal_gateway::context::RequestContext;
use signal_gateway::errors::{RpcError, SignalError};
use signal_gateway::routes::{build_routes, AppState};
use signal_gateway::services::mock::{
    MockMessageRouter, MockParticipantRelayClient, MockPlacementClient,
};
use signal_gateway::services::{
    Collaborators, DefaultConnectValidator, NamespacedTopicFormatter, SignalingGateway,
};
use signal_proto::codec::{decode_wire_message, encode_wire_message, WireMessage};
use signal_proto::signaling::{
    signalv2_client_message, signalv2_server_message, ConnectRequest, ConnectResponse, Envelope,
    Fragment, LeaveRequest, ParticipantInfo, Room, Signalv2ClientMessage, Signalv2WireMessage,
    TrickleRequest,
};
use std::collections::HashMap;
use std::sync::Arc;
use signal_test_utils::{TestTokenBuilder, TEST_API_KEY, TEST_API_SECRET};
use std::time::Duration;
use tower::ServiceExt;

const PROTOBUF: &str = "application/x-protobuf";

/// Larger than both the gateway's default body cap and axum's own default.
const THREE_MIB: usize = 3 * 1024 * 1024;

fn config_with(extra: &[(&str, &str)]) -> Config {
    let mut vars = HashMap::from([
        ("SIGNAL_BUS_URL".to_string(), "http://127.0.0.1:1".to_string()),
        ("SIGNAL_API_KEY".to_string(), TEST_API_KEY.to_string()),
        ("SIGNAL_API_SECRET".to_string(), TEST_API_SECRET.to_string()),
    ]);
    for (name, value) in extra {
        vars.insert(name.to_string(), value.to_string());
    }
    Config::from_vars(&vars).expect("test config should parse")
}

/// Collaborator mocks kept around so tests can inspect what reached them.
struct TestGateway {
    app: Router,
    gateway: Arc<SignalingGateway>,
    placement: Arc<MockPlacementClient>,
    router: Arc<MockMessageRouter>,
    relay: Arc<MockParticipantRelayClient>,
}

impl TestGateway {
    fn new(
        placement: MockPlacementClient,
        router: MockMessageRouter,
        relay: MockParticipantRelayClient,
    ) -> Self {
        Self::with_config(config_with(&[]), placement, router, relay)
    }

    fn with_config(
        config: Config,
        placement: MockPlacementClient,
        router: MockMessageRouter,
        relay: MockParticipantRelayClient,
    ) -> Self {
        let placement = Arc::new(placement);
        let router = Arc::new(router);
        let relay = Arc::new(relay);

        let gateway = Arc::new(SignalingGateway::new(
            config.limits.clone(),
            Collaborators {
                validator: Arc::new(DefaultConnectValidator::new()),
                placement: placement.clone(),
                router: router.clone(),
                topics: Arc::new(NamespacedTopicFormatter::new(config.topic_namespace.clone())),
                relay: relay.clone(),
            },
        ));

        let state = Arc::new(AppState {
            config,
            gateway: gateway.clone(),
        });
        let handle = PrometheusBuilder::new().build_recorder().handle();

        Self {
            app: build_routes(state, handle),
            gateway,
            placement,
            router,
            relay,
        }
    }

    fn healthy() -> Self {
        Self::new(
            MockPlacementClient::accepting(),
            MockMessageRouter::responding(connect_response()),
            MockParticipantRelayClient::responding(Signalv2WireMessage::from(leave_reply())),
        )
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Option<String>, Vec<u8>) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, content_type, body.to_vec())
    }
}

fn grants(identity: &str, room: &str) -> GrantSet {
    GrantSet {
        identity: identity.to_string(),
        video: Some(VideoGrant {
            room_join: true,
            room: room.to_string(),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn token(identity: &str, room: &str) -> String {
    TestTokenBuilder::new()
        .for_identity(identity)
        .join_room(room)
        .expires_in(600)
        .sign()
}

fn connect_response() -> ConnectResponse {
    ConnectResponse {
        room: Some(Room {
            sid: "RM_standup".to_string(),
            name: "standup".to_string(),
            ..Default::default()
        }),
        participant: Some(ParticipantInfo {
            sid: "PA_alice".to_string(),
            identity: "alice".to_string(),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn leave_reply() -> WireMessage {
    WireMessage::Envelope(Envelope::from_server_message(
        signalv2_server_message::Message::Leave(LeaveRequest::default()),
    ))
}

fn envelope(messages: Vec<signalv2_client_message::Message>) -> Vec<u8> {
    encode_wire_message(WireMessage::Envelope(Envelope {
        client_messages: messages
            .into_iter()
            .map(|m| Signalv2ClientMessage { message: Some(m) })
            .collect(),
        server_messages: vec![],
    }))
    .unwrap()
    .to_vec()
}

fn connect_body() -> Vec<u8> {
    envelope(vec![signalv2_client_message::Message::ConnectRequest(
        ConnectRequest::default(),
    )])
}

fn trickle_body() -> Vec<u8> {
    envelope(vec![signalv2_client_message::Message::Trickle(
        TrickleRequest {
            candidate_init: "candidate:1".to_string(),
            ..Default::default()
        },
    )])
}

fn post_connect(token: Option<&str>, content_type: &str, body: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/rtc/v2")
        .header(header::CONTENT_TYPE, content_type)
        .header("x-forwarded-for", "198.51.100.4, 10.0.0.1");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body)).unwrap()
}

fn patch_action(token: Option<&str>, participant_id: &str, body: Vec<u8>) -> Request<Body> {
    let uri = match token {
        Some(token) => format!("/rtc/v2/{participant_id}?access_token={token}"),
        None => format!("/rtc/v2/{participant_id}"),
    };
    Request::builder()
        .method("PATCH")
        .uri(uri)
        .header(header::CONTENT_TYPE, PROTOBUF)
        .body(Body::from(body))
        .unwrap()
}

fn error_body(body: &[u8]) -> (u64, String) {
    let json: serde_json::Value = serde_json::from_slice(body).expect("error body is JSON");
    (
        json["code"].as_u64().expect("code"),
        json["message"].as_str().expect("message").to_string(),
    )
}

#[tokio::test]
async fn test_health_returns_ok() -> Result<(), anyhow::Error> {
    let gateway = TestGateway::healthy();

    let (status, _, body) = gateway
        .send(Request::builder().uri("/health").body(Body::empty())?)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
    Ok(())
}

#[tokio::test]
async fn test_metrics_endpoint_is_served() -> Result<(), anyhow::Error> {
    let gateway = TestGateway::healthy();

    let (status, _, _) = gateway
        .send(Request::builder().uri("/metrics").body(Body::empty())?)
        .await;

    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn test_connect_success() -> Result<(), anyhow::Error> {
    let gateway = TestGateway::healthy();
    let token = token("alice", "standup");

    let (status, content_type, body) = gateway
        .send(post_connect(Some(&token), PROTOBUF, connect_body()))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some(PROTOBUF));

    let expected = WireMessage::Envelope(Envelope::from_server_message(
        signalv2_server_message::Message::ConnectResponse(connect_response()),
    ));
    assert_eq!(decode_wire_message(&body)?, expected);

    let placements = gateway.placement.requests().await;
    assert_eq!(placements.len(), 1);
    assert_eq!(placements[0].0.as_str(), "standup");
    assert_eq!(placements[0].1, "");

    let routed = gateway.router.requests().await;
    assert_eq!(routed.len(), 1);
    let (room, identity, request) = &routed[0];
    assert_eq!(room.as_str(), "standup");
    assert_eq!(identity.as_str(), "alice");
    assert_eq!(
        request.create_room.as_ref().map(|c| c.name.as_str()),
        Some("standup")
    );

    let forwarded: GrantSet = serde_json::from_str(&request.grants_json)?;
    assert_eq!(forwarded, grants("alice", "standup"));

    let client_info = request
        .connect_request
        .as_ref()
        .and_then(|c| c.client_info.as_ref())
        .expect("client info is filled in");
    assert_eq!(client_info.address, "198.51.100.4");
    Ok(())
}

#[tokio::test]
async fn test_connect_rejects_fragment() -> Result<(), anyhow::Error> {
    let gateway = TestGateway::healthy();
    let token = token("alice", "standup");
    let fragment = encode_wire_message(WireMessage::Fragment(Fragment {
        packet_id: 1,
        fragment_number: 1,
        num_fragments: 2,
        data: vec![1, 2, 3],
    }))?;

    let (status, _, body) = gateway
        .send(post_connect(Some(&token), PROTOBUF, fragment.to_vec()))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        error_body(&body),
        (400, "should not get fragments via HTTP request".to_string())
    );
    assert_eq!(gateway.placement.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_connect_requires_exact_content_type() -> Result<(), anyhow::Error> {
    let gateway = TestGateway::healthy();
    let token = token("alice", "standup");

    for content_type in ["application/json", "application/x-protobuf; charset=utf-8"] {
        let (status, _, body) = gateway
            .send(post_connect(Some(&token), content_type, connect_body()))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_body(&body).0, 400);
    }
    assert_eq!(gateway.router.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_oversized_body_with_wrong_content_type_is_unsupported() -> Result<(), anyhow::Error> {
    let gateway = TestGateway::healthy();
    let token = token("alice", "standup");

    let (status, content_type, body) = gateway
        .send(post_connect(Some(&token), "application/json", vec![0u8; THREE_MIB]))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(
        error_body(&body),
        (400, "unsupported content-type: application/json".to_string())
    );
    Ok(())
}

#[tokio::test]
async fn test_connect_oversized_body_is_json_bad_request() -> Result<(), anyhow::Error> {
    let gateway = TestGateway::healthy();
    let token = token("alice", "standup");

    let (status, content_type, body) = gateway
        .send(post_connect(Some(&token), PROTOBUF, vec![0u8; THREE_MIB]))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    let (code, message) = error_body(&body);
    assert_eq!(code, 400);
    assert!(message.starts_with("could not read request body"), "{message}");
    assert_eq!(gateway.placement.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_body_cap_follows_config() -> Result<(), anyhow::Error> {
    let gateway = TestGateway::with_config(
        config_with(&[("MAX_REQUEST_BODY_BYTES", "16")]),
        MockPlacementClient::accepting(),
        MockMessageRouter::responding(connect_response()),
        MockParticipantRelayClient::responding(Signalv2WireMessage::from(leave_reply())),
    );
    let token = token("alice", "standup");

    let (status, _, body) = gateway
        .send(patch_action(Some(&token), "PA_alice", vec![0u8; 17]))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_body(&body).1.starts_with("could not read request body"));
    assert_eq!(gateway.relay.call_count(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_request_timeout_is_json() -> Result<(), anyhow::Error> {
    let gateway = TestGateway::with_config(
        config_with(&[("REQUEST_TIMEOUT_SECONDS", "1")]),
        MockPlacementClient::stalled(Duration::from_secs(60)),
        MockMessageRouter::responding(connect_response()),
        MockParticipantRelayClient::empty(),
    );
    let token = token("alice", "standup");

    let (status, content_type, body) = gateway
        .send(post_connect(Some(&token), PROTOBUF, connect_body()))
        .await;

    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(error_body(&body), (408, "request timed out".to_string()));
    assert_eq!(gateway.router.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_connect_rejects_unknown_first_message() -> Result<(), anyhow::Error> {
    let gateway = TestGateway::healthy();
    let token = token("alice", "standup");

    let (status, _, body) = gateway
        .send(post_connect(Some(&token), PROTOBUF, trickle_body()))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, message) = error_body(&body);
    assert!(message.starts_with("unknown message type"), "{message}");
    Ok(())
}

#[tokio::test]
async fn test_connect_without_token_is_unauthorized() -> Result<(), anyhow::Error> {
    let gateway = TestGateway::healthy();

    let (status, _, body) = gateway
        .send(post_connect(None, PROTOBUF, connect_body()))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_body(&body), (401, "permissions denied".to_string()));
    assert_eq!(gateway.placement.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_invalid_token_is_unauthorized() -> Result<(), anyhow::Error> {
    let gateway = TestGateway::healthy();
    let forged = TestTokenBuilder::new()
        .for_identity("mallory")
        .join_room("standup")
        .sign_with("some-other-secret-0123456789abcdef");

    let response = gateway
        .app
        .clone()
        .oneshot(post_connect(Some(&forged), PROTOBUF, connect_body()))
        .await?;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
    Ok(())
}

#[tokio::test]
async fn test_connect_placement_failure_is_internal() -> Result<(), anyhow::Error> {
    let gateway = TestGateway::new(
        MockPlacementClient::failing(RpcError::status(
            tonic::Code::Unavailable,
            "no nodes available",
        )),
        MockMessageRouter::responding(connect_response()),
        MockParticipantRelayClient::empty(),
    );
    let token = token("alice", "standup");

    let (status, _, body) = gateway
        .send(post_connect(Some(&token), PROTOBUF, connect_body()))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_body(&body).0, 500);
    assert_eq!(gateway.router.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_participant_action_success() -> Result<(), anyhow::Error> {
    let gateway = TestGateway::healthy();
    let token = token("alice", "standup");

    let (status, content_type, body) = gateway
        .send(patch_action(Some(&token), "PA_alice", trickle_body()))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some(PROTOBUF));
    assert_eq!(decode_wire_message(&body)?, leave_reply());

    let relayed = gateway.relay.requests().await;
    assert_eq!(relayed.len(), 1);
    let (topic, request) = &relayed[0];
    assert_eq!(topic.as_str(), "signal.participant.7.standup.alice");
    assert_eq!(request.participant_id, "PA_alice");
    Ok(())
}

#[tokio::test]
async fn test_participant_action_auth_order() -> Result<(), anyhow::Error> {
    let gateway = TestGateway::healthy();

    // no token at all
    let (status, _, body) = gateway
        .send(patch_action(None, "PA_alice", trickle_body()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_body(&body).1, "permissions denied");

    // room is checked before identity
    let token_without_room = token("", "");
    let (status, _, body) = gateway
        .send(patch_action(Some(&token_without_room), "PA_alice", trickle_body()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_body(&body).1, "no room name");

    let token_without_identity = token("", "standup");
    let (status, _, body) = gateway
        .send(patch_action(Some(&token_without_identity), "PA_alice", trickle_body()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_body(&body).1, "identity cannot be empty");

    // An empty path segment never routes, so the combined case goes straight
    // to the gateway: identity is checked before the participant id.
    let ctx = RequestContext::new(Duration::from_secs(5))
        .with_grants(Some(Arc::new(grants("", "standup"))));
    let err = gateway
        .gateway
        .participant_action(Some(PROTOBUF), &ParticipantId::from(""), trickle_body().into(), &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, SignalError::IdentityEmpty));

    let response = err.into_response();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response.into_body().collect().await?.to_bytes();
    assert_eq!(error_body(&body), (401, "identity cannot be empty".to_string()));

    assert_eq!(gateway.relay.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_participant_action_maps_relay_errors() -> Result<(), anyhow::Error> {
    let cases = [
        (
            RpcError::status(tonic::Code::NotFound, "participant not found"),
            StatusCode::NOT_FOUND,
            "participant not found",
        ),
        (
            RpcError::status(tonic::Code::InvalidArgument, "bad candidate"),
            StatusCode::BAD_REQUEST,
            "bad candidate",
        ),
        (
            RpcError::status(tonic::Code::Internal, "node crashed"),
            StatusCode::INTERNAL_SERVER_ERROR,
            "node crashed",
        ),
        (
            RpcError::Transport("connection refused".to_string()),
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal error",
        ),
    ];
    let token = token("alice", "standup");

    for (rpc_error, expected_status, expected_message) in cases {
        let gateway = TestGateway::new(
            MockPlacementClient::accepting(),
            MockMessageRouter::empty(),
            MockParticipantRelayClient::failing(rpc_error),
        );

        let (status, _, body) = gateway
            .send(patch_action(Some(&token), "PA_alice", trickle_body()))
            .await;

        assert_eq!(status, expected_status);
        assert_eq!(
            error_body(&body),
            (u64::from(expected_status.as_u16()), expected_message.to_string())
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_wrong_method_is_rejected_by_router() -> Result<(), anyhow::Error> {
    let gateway = TestGateway::healthy();

    let (status, _, _) = gateway
        .send(Request::builder().method("GET").uri("/rtc/v2").body(Body::empty())?)
        .await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    Ok(())
}
