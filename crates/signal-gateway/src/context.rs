//! Per-request context handed to the signaling services.
//!
//! Holds what the transport layer learned about the caller (grant set,
//! client address) and the deadline every outbound call must respect.

use crate::auth::claims::GrantSet;
use axum::http::HeaderMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct RequestContext {
    grants: Option<Arc<GrantSet>>,
    client_address: Option<String>,
    deadline: Instant,
}

impl RequestContext {
    /// Context whose deadline is `timeout` from now.
    pub fn new(timeout: Duration) -> Self {
        Self {
            grants: None,
            client_address: None,
            deadline: Instant::now() + timeout,
        }
    }

    pub fn with_grants(mut self, grants: Option<Arc<GrantSet>>) -> Self {
        self.grants = grants;
        self
    }

    pub fn with_client_address(mut self, client_address: Option<String>) -> Self {
        self.client_address = client_address;
        self
    }

    pub fn grants(&self) -> Option<&GrantSet> {
        self.grants.as_deref()
    }

    pub fn client_address(&self) -> Option<&str> {
        self.client_address.as_deref()
    }

    /// Time left before the deadline, zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

/// Best guess at the client's address.
///
/// Precedence: `CF-Connecting-IP`, first `X-Forwarded-For` entry,
/// `X-Real-IP`, then the socket peer.
pub fn resolve_client_address(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(ip) = header_value("cf-connecting-ip") {
        return Some(ip.to_string());
    }

    if let Some(first) = header_value("x-forwarded-for")
        .and_then(|list| list.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return Some(first.to_string());
    }

    if let Some(ip) = header_value("x-real-ip") {
        return Some(ip.to_string());
    }

    peer.map(|addr| addr.ip().to_string())
}
