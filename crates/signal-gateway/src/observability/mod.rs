//! Observability for the Signal Gateway.
//!
//! Provides metrics definitions and recording helpers.

pub mod metrics;
