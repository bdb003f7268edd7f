//! Access token middleware for the signaling routes.
//!
//! The token is read from the `Authorization: Bearer` header, falling back
//! to the `access_token` query parameter. A request with no token at all is
//! passed through without grants; the signaling operations reject it with
//! their own permission errors so the check order stays observable.

use crate::auth::TokenVerifier;
use crate::errors::SignalError;
use axum::{
    extract::{Query, Request, State},
    http::header,
    middleware::Next,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;

/// Client-facing text for every rejected token.
const INVALID_TOKEN_MESSAGE: &str = "the access token is invalid or expired";

/// State for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<TokenVerifier>,
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    access_token: Option<String>,
}

/// Extract the raw access token, if the request carries one.
///
/// An `Authorization` header that is present but not a bearer credential
/// is an error rather than a missing token.
fn extract_access_token(req: &Request) -> Result<Option<String>, SignalError> {
    if let Some(value) = req.headers().get(header::AUTHORIZATION) {
        let token = value
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| {
                tracing::debug!(target: "signal.middleware.auth", "Invalid Authorization header format");
                SignalError::InvalidToken("invalid Authorization header format".to_string())
            })?;
        return Ok(Some(token.to_string()));
    }

    Ok(Query::<TokenQuery>::try_from_uri(req.uri())
        .ok()
        .and_then(|Query(query)| query.access_token)
        .filter(|token| !token.is_empty()))
}

/// Verify the access token and attach its grants to the request.
///
/// # Response
///
/// - Returns 401 Unauthorized if a token is present but invalid
/// - Continues with `Arc<GrantSet>` in extensions if the token is valid
/// - Continues without grants if no token was supplied
#[instrument(skip_all, name = "signal.middleware.auth")]
pub async fn attach_grants(
    State(state): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, SignalError> {
    if let Some(token) = extract_access_token(&req)? {
        let grants = state.verifier.verify(&token).map_err(|e| {
            tracing::debug!(target: "signal.middleware.auth", error = %e, "Access token rejected");
            SignalError::InvalidToken(INVALID_TOKEN_MESSAGE.to_string())
        })?;

        req.extensions_mut().insert(Arc::new(grants));
    }

    Ok(next.run(req).await)
}
