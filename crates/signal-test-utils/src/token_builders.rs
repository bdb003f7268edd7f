//! Builder for HS256 access tokens.
//!
//! Produces tokens in the shape the gateway verifies: `iss` is the API key,
//! `sub` the participant identity, grants flattened next to them.

use jsonwebtoken::{encode, get_current_timestamp, Algorithm, EncodingKey, Header};
use serde_json::{json, Map, Value};

/// API key the builder issues tokens under by default.
pub const TEST_API_KEY: &str = "APItest";

/// API secret the builder signs with by default.
pub const TEST_API_SECRET: &str = "test-api-secret-with-enough-entropy-0123456789";

/// Builder for test access tokens
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .for_identity("alice")
///     .join_room("standup")
///     .expires_in(600)
///     .sign();
/// ```
pub struct TestTokenBuilder {
    iss: String,
    sub: String,
    exp: u64,
    nbf: u64,
    claims: Map<String, Value>,
}

impl TestTokenBuilder {
    /// Create a builder with no grants, valid for an hour
    pub fn new() -> Self {
        let now = get_current_timestamp();
        Self {
            iss: TEST_API_KEY.to_string(),
            sub: "test-participant".to_string(),
            exp: now + 3600,
            nbf: now,
            claims: Map::new(),
        }
    }

    /// Set the issuer (API key)
    pub fn issued_by(mut self, api_key: &str) -> Self {
        self.iss = api_key.to_string();
        self
    }

    /// Set the participant identity (`sub`)
    pub fn for_identity(mut self, identity: &str) -> Self {
        self.sub = identity.to_string();
        self
    }

    /// Grant permission to join `room`
    pub fn join_room(self, room: &str) -> Self {
        self.with_video(json!({ "roomJoin": true, "room": room }))
    }

    /// Set the video grant verbatim
    pub fn with_video(self, video: Value) -> Self {
        self.with_claim("video", video)
    }

    /// Set any other top-level claim (`name`, `metadata`, `attributes`, ...)
    ///
    /// Registered claims (`iss`, `sub`, `exp`, `nbf`) are owned by the
    /// dedicated setters and overwrite anything set here.
    pub fn with_claim(mut self, key: &str, value: Value) -> Self {
        self.claims.insert(key.to_string(), value);
        self
    }

    /// Set expiration in seconds from now
    pub fn expires_in(mut self, seconds: u64) -> Self {
        self.exp = get_current_timestamp() + seconds;
        self
    }

    /// Set an absolute expiration (Unix seconds), e.g. in the past
    pub fn expires_at(mut self, timestamp: u64) -> Self {
        self.exp = timestamp;
        self
    }

    /// Set the not-before time (Unix seconds)
    pub fn not_before(mut self, timestamp: u64) -> Self {
        self.nbf = timestamp;
        self
    }

    /// Build the claims as a JSON value
    pub fn build(self) -> Value {
        let mut claims = self.claims;
        claims.insert("iss".to_string(), json!(self.iss));
        claims.insert("sub".to_string(), json!(self.sub));
        claims.insert("exp".to_string(), json!(self.exp));
        claims.insert("nbf".to_string(), json!(self.nbf));
        Value::Object(claims)
    }

    /// Sign with [`TEST_API_SECRET`]
    pub fn sign(self) -> String {
        self.sign_with(TEST_API_SECRET)
    }

    /// Sign with an arbitrary secret
    pub fn sign_with(self, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &self.build(),
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("HS256 signing of JSON claims should succeed")
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_creates_valid_claims() {
        let claims = TestTokenBuilder::new()
            .for_identity("alice")
            .join_room("standup")
            .build();

        assert_eq!(claims["iss"], TEST_API_KEY);
        assert_eq!(claims["sub"], "alice");
        assert_eq!(claims["video"]["room"], "standup");
        assert_eq!(claims["video"]["roomJoin"], true);
        assert!(claims["exp"].as_u64().unwrap() > claims["nbf"].as_u64().unwrap());
    }

    #[test]
    fn test_builder_default() {
        let claims = TestTokenBuilder::default().build();
        assert_eq!(claims["sub"], "test-participant");
        assert!(claims.get("video").is_none());
    }

    #[test]
    fn test_registered_claims_win_over_custom() {
        let claims = TestTokenBuilder::new()
            .with_claim("sub", json!("mallory"))
            .expires_at(42)
            .build();

        assert_eq!(claims["sub"], "test-participant");
        assert_eq!(claims["exp"], 42);
    }

    #[test]
    fn test_sign_produces_three_segments() {
        let token = TestTokenBuilder::new().sign();
        assert_eq!(token.split('.').count(), 3);
    }
}
