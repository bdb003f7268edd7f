//! HS256 access token verification.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing
//! - Only HS256 is accepted; the signing secret is the API secret
//! - `iss` must equal the configured API key
//! - `exp` and `nbf` are validated with clock skew tolerance

use crate::auth::claims::GrantSet;
use common::secret::{ExposeSecret, SecretString};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

/// Maximum accepted token size in bytes.
pub const MAX_TOKEN_SIZE_BYTES: usize = 8192;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token exceeds {MAX_TOKEN_SIZE_BYTES} bytes")]
    TooLarge,

    #[error("token rejected: {0}")]
    Rejected(String),
}

/// Registered claims plus the grant set, flattened into one JSON object.
///
/// `sub` is the participant identity and overrides any `identity` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub iss: String,

    #[serde(default)]
    pub sub: String,

    pub exp: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<u64>,

    #[serde(flatten)]
    pub grants: GrantSet,
}

/// Verifies access tokens signed with the deployment's API secret.
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(api_key: &str, api_secret: &SecretString, clock_skew_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = clock_skew_seconds;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_issuer(&[api_key]);
        validation.set_required_spec_claims(&["exp", "iss"]);

        Self {
            decoding_key: DecodingKey::from_secret(api_secret.expose_secret().as_bytes()),
            validation,
        }
    }

    /// Verify a token and return the grant set it carries.
    ///
    /// # Errors
    ///
    /// - `TokenError::TooLarge` - token longer than [`MAX_TOKEN_SIZE_BYTES`]
    /// - `TokenError::Rejected` - bad signature, issuer, or time window
    #[instrument(skip_all)]
    pub fn verify(&self, token: &str) -> Result<GrantSet, TokenError> {
        if token.len() > MAX_TOKEN_SIZE_BYTES {
            tracing::debug!(target: "signal.auth.token", size = token.len(), "Token exceeds size limit");
            return Err(TokenError::TooLarge);
        }

        let token_data = decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!(target: "signal.auth.token", error = %e, "Token verification failed");
                TokenError::Rejected(e.to_string())
            })?;

        let AccessTokenClaims { sub, mut grants, .. } = token_data.claims;
        grants.identity = sub;

        Ok(grants)
    }
}
