//! Signal Gateway configuration.
//!
//! Configuration is loaded from environment variables. The API secret and
//! the bus service token are held in `SecretString` and redacted in Debug
//! output.

use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:7880";

/// Default topic namespace on the signal bus.
pub const DEFAULT_TOPIC_NAMESPACE: &str = "signal";

/// Default end-to-end request budget in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;

/// Default cap on a buffered signaling request body (1 MiB).
pub const DEFAULT_MAX_REQUEST_BODY_BYTES: u64 = 1024 * 1024;

/// Default connect timeout for the signal bus channel in seconds.
pub const DEFAULT_BUS_CONNECT_TIMEOUT_SECONDS: u64 = 5;

/// Default clock skew tolerance for access token `exp`/`nbf` checks.
pub const DEFAULT_JWT_CLOCK_SKEW_SECONDS: u64 = 300;

/// Upper bound for the clock skew tolerance.
pub const MAX_JWT_CLOCK_SKEW_SECONDS: u64 = 600;

/// Default maximum participant metadata size in bytes.
pub const DEFAULT_MAX_METADATA_SIZE: usize = 64_000;

/// Default maximum total participant attribute size in bytes.
pub const DEFAULT_MAX_ATTRIBUTES_SIZE: usize = 64_000;

/// Default drain period on shutdown in seconds.
pub const DEFAULT_DRAIN_SECONDS: u64 = 30;

/// Default node ID prefix.
pub const DEFAULT_NODE_ID_PREFIX: &str = "sg";

/// Size limits applied to connect requests. A limit of 0 disables the check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitConfig {
    pub max_metadata_size: usize,
    pub max_attributes_size: usize,
    pub max_participant_identity_length: usize,
    pub max_room_name_length: usize,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            max_metadata_size: DEFAULT_MAX_METADATA_SIZE,
            max_attributes_size: DEFAULT_MAX_ATTRIBUTES_SIZE,
            max_participant_identity_length: 0,
            max_room_name_length: 0,
        }
    }
}

impl LimitConfig {
    pub fn check_metadata_size(&self, metadata: &str) -> bool {
        within(self.max_metadata_size, metadata.len())
    }

    /// Attribute size is the sum of all key and value lengths.
    pub fn check_attributes_size(&self, attributes: &HashMap<String, String>) -> bool {
        let total: usize = attributes.iter().map(|(k, v)| k.len() + v.len()).sum();
        within(self.max_attributes_size, total)
    }

    pub fn check_participant_identity_length(&self, identity: &str) -> bool {
        within(self.max_participant_identity_length, identity.len())
    }

    pub fn check_room_name_length(&self, room_name: &str) -> bool {
        within(self.max_room_name_length, room_name.len())
    }
}

fn within(limit: usize, len: usize) -> bool {
    limit == 0 || len <= limit
}

/// Signal Gateway configuration.
#[derive(Clone)]
pub struct Config {
    /// HTTP bind address (default: "0.0.0.0:7880").
    pub bind_address: String,

    /// gRPC endpoint of the signal bus that routes calls by topic.
    pub bus_url: String,

    /// API key; access tokens must carry it as `iss`.
    pub api_key: String,

    /// API secret used to verify HS256 access tokens.
    pub api_secret: SecretString,

    /// Optional bearer token presented to the signal bus.
    pub service_token: Option<SecretString>,

    /// Unique identifier for this gateway instance.
    pub node_id: String,

    /// Prefix for every topic this gateway addresses.
    pub topic_namespace: String,

    /// End-to-end budget for one request, also forwarded to outbound calls.
    pub request_timeout_seconds: u64,

    /// Largest signaling request body that is buffered and decoded.
    pub max_request_body_bytes: usize,

    /// Connect timeout for the signal bus channel.
    pub bus_connect_timeout_seconds: u64,

    /// Clock skew tolerance for access token validation.
    pub jwt_clock_skew_seconds: u64,

    /// Whether a validated connect carries a room-creation directive.
    pub room_auto_create: bool,

    /// Connect request size limits.
    pub limits: LimitConfig,

    /// Drain period after a shutdown signal.
    pub drain_seconds: u64,
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("bus_url", &self.bus_url)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field(
                "service_token",
                &self.service_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("node_id", &self.node_id)
            .field("topic_namespace", &self.topic_namespace)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("max_request_body_bytes", &self.max_request_body_bytes)
            .field(
                "bus_connect_timeout_seconds",
                &self.bus_connect_timeout_seconds,
            )
            .field("jwt_clock_skew_seconds", &self.jwt_clock_skew_seconds)
            .field("room_auto_create", &self.room_auto_create)
            .field("limits", &self.limits)
            .field("drain_seconds", &self.drain_seconds)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid JWT clock skew configuration: {0}")]
    InvalidJwtClockSkew(String),

    #[error("Invalid timeout configuration: {0}")]
    InvalidTimeout(String),

    #[error("Invalid limit configuration: {0}")]
    InvalidLimit(String),

    #[error("Invalid flag configuration: {0}")]
    InvalidFlag(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bus_url = required(vars, "SIGNAL_BUS_URL")?;
        let api_key = required(vars, "SIGNAL_API_KEY")?;
        let api_secret = SecretString::from(required(vars, "SIGNAL_API_SECRET")?);

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let service_token = vars
            .get("SIGNAL_SERVICE_TOKEN")
            .filter(|token| !token.is_empty())
            .map(|token| SecretString::from(token.clone()));

        let topic_namespace = vars
            .get("TOPIC_NAMESPACE")
            .cloned()
            .unwrap_or_else(|| DEFAULT_TOPIC_NAMESPACE.to_string());

        let request_timeout_seconds = parse_positive(
            vars,
            "REQUEST_TIMEOUT_SECONDS",
            DEFAULT_REQUEST_TIMEOUT_SECONDS,
            ConfigError::InvalidTimeout,
        )?;

        let max_request_body_bytes = parse_positive(
            vars,
            "MAX_REQUEST_BODY_BYTES",
            DEFAULT_MAX_REQUEST_BODY_BYTES,
            ConfigError::InvalidLimit,
        )?;
        let max_request_body_bytes = usize::try_from(max_request_body_bytes).map_err(|_| {
            ConfigError::InvalidLimit(format!(
                "MAX_REQUEST_BODY_BYTES is too large for this platform, got {}",
                max_request_body_bytes
            ))
        })?;

        let bus_connect_timeout_seconds = parse_positive(
            vars,
            "BUS_CONNECT_TIMEOUT_SECONDS",
            DEFAULT_BUS_CONNECT_TIMEOUT_SECONDS,
            ConfigError::InvalidTimeout,
        )?;

        let jwt_clock_skew_seconds = parse_positive(
            vars,
            "JWT_CLOCK_SKEW_SECONDS",
            DEFAULT_JWT_CLOCK_SKEW_SECONDS,
            ConfigError::InvalidJwtClockSkew,
        )?;
        if jwt_clock_skew_seconds > MAX_JWT_CLOCK_SKEW_SECONDS {
            return Err(ConfigError::InvalidJwtClockSkew(format!(
                "JWT_CLOCK_SKEW_SECONDS must not exceed {} seconds, got {}",
                MAX_JWT_CLOCK_SKEW_SECONDS, jwt_clock_skew_seconds
            )));
        }

        let room_auto_create = match vars.get("ROOM_AUTO_CREATE").map(String::as_str) {
            None => true,
            Some("true") | Some("1") => true,
            Some("false") | Some("0") => false,
            Some(other) => {
                return Err(ConfigError::InvalidFlag(format!(
                    "ROOM_AUTO_CREATE must be true or false, got '{}'",
                    other
                )))
            }
        };

        let limits = LimitConfig {
            max_metadata_size: parse_limit(
                vars,
                "LIMIT_MAX_METADATA_SIZE",
                DEFAULT_MAX_METADATA_SIZE,
            )?,
            max_attributes_size: parse_limit(
                vars,
                "LIMIT_MAX_ATTRIBUTES_SIZE",
                DEFAULT_MAX_ATTRIBUTES_SIZE,
            )?,
            max_participant_identity_length: parse_limit(
                vars,
                "LIMIT_MAX_PARTICIPANT_IDENTITY_LENGTH",
                0,
            )?,
            max_room_name_length: parse_limit(vars, "LIMIT_MAX_ROOM_NAME_LENGTH", 0)?,
        };

        let drain_seconds = match vars.get("DRAIN_SECONDS") {
            Some(value_str) => value_str.parse().map_err(|e| {
                ConfigError::InvalidTimeout(format!(
                    "DRAIN_SECONDS must be a valid non-negative integer, got '{}': {}",
                    value_str, e
                ))
            })?,
            None => DEFAULT_DRAIN_SECONDS,
        };

        let node_id = vars.get("SIGNAL_NODE_ID").cloned().unwrap_or_else(|| {
            let hostname = std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string());
            let uuid_suffix = uuid::Uuid::new_v4().to_string();
            let short_suffix = uuid_suffix.get(..8).unwrap_or("00000000");
            format!("{}-{}-{}", DEFAULT_NODE_ID_PREFIX, hostname, short_suffix)
        });

        Ok(Config {
            bind_address,
            bus_url,
            api_key,
            api_secret,
            service_token,
            node_id,
            topic_namespace,
            request_timeout_seconds,
            max_request_body_bytes,
            bus_connect_timeout_seconds,
            jwt_clock_skew_seconds,
            room_auto_create,
            limits,
            drain_seconds,
        })
    }

    /// Request budget as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

fn required(vars: &HashMap<String, String>, name: &str) -> Result<String, ConfigError> {
    vars.get(name)
        .filter(|value| !value.is_empty())
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

fn parse_positive(
    vars: &HashMap<String, String>,
    name: &str,
    default: u64,
    err: fn(String) -> ConfigError,
) -> Result<u64, ConfigError> {
    let Some(value_str) = vars.get(name) else {
        return Ok(default);
    };

    let value: u64 = value_str.parse().map_err(|e| {
        err(format!(
            "{} must be a valid positive integer, got '{}': {}",
            name, value_str, e
        ))
    })?;

    if value == 0 {
        return Err(err(format!("{} must be greater than 0", name)));
    }

    Ok(value)
}

fn parse_limit(
    vars: &HashMap<String, String>,
    name: &str,
    default: usize,
) -> Result<usize, ConfigError> {
    match vars.get(name) {
        Some(value_str) => value_str.parse().map_err(|e| {
            ConfigError::InvalidLimit(format!(
                "{} must be a valid non-negative integer, got '{}': {}",
                name, value_str, e
            ))
        }),
        None => Ok(default),
    }
}
