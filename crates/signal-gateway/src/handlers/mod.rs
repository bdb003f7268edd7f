//! HTTP request handlers for the Signal Gateway.

pub mod health;
pub mod metrics;
pub mod rtc;

pub use health::health_check;
pub use metrics::metrics_handler;
pub use rtc::{connect, participant_action};
