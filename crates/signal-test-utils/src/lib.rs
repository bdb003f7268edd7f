//! # Signal Test Utilities
//!
//! Shared test utilities for the Signal Gateway.
//!
//! This crate provides:
//! - Test access token builder (`TestTokenBuilder`)
//! - Fixed API credentials matching the builder defaults
//!
//! ## Usage
//!
//! ```rust,ignore
//! use signal_test_utils::*;
//!
//! let token = TestTokenBuilder::new()
//!     .for_identity("alice")
//!     .join_room("standup")
//!     .sign();
//! ```

pub mod token_builders;

pub use token_builders::{TestTokenBuilder, TEST_API_KEY, TEST_API_SECRET};
