//! Secret types for protecting sensitive values from accidental logging.
//!
//! Re-exports [`secrecy`] so every crate in the workspace wraps API secrets
//! and bearer tokens the same way. `SecretString` redacts itself in `Debug`,
//! so a config struct holding one can derive or hand-write `Debug` without
//! leaking the value into logs.
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! let api_secret = SecretString::from("signing-secret");
//! assert!(!format!("{api_secret:?}").contains("signing-secret"));
//! assert_eq!(api_secret.expose_secret(), "signing-secret");
//! ```

pub use secrecy::{ExposeSecret, SecretString};
