//! Access token handling.
//!
//! - `claims` - the grant set a token carries
//! - `token` - HS256 verification against the API key and secret

pub mod claims;
pub mod token;

pub use claims::{GrantSet, VideoGrant};
pub use token::{TokenError, TokenVerifier};
