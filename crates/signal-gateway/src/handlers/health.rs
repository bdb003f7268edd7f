//! Liveness probe.

/// Returns "OK" while the process is serving. Does not reach the signal bus.
pub async fn health_check() -> &'static str {
    "OK"
}
