//! Signal Gateway
//!
//! Stateless HTTP signaling front that relays session traffic to the
//! room-hosting nodes over the signal bus.
//!
//! # Startup Flow
//!
//! 1. Initialize tracing
//! 2. Load configuration from environment
//! 3. Initialize Prometheus metrics recorder
//! 4. Build the signal bus client (lazy channel, no dial at startup)
//! 5. Start the HTTP server
//! 6. Wait for shutdown signal, then drain in-flight requests

#![warn(clippy::pedantic)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use signal_gateway::config::Config;
use signal_gateway::observability::metrics::init_metrics_recorder;
use signal_gateway::routes::{self, AppState};
use signal_gateway::services::bus::SignalBusClient;
use signal_gateway::services::{
    Collaborators, DefaultConnectValidator, NamespacedTopicFormatter, SignalingGateway,
    TopicFormatter,
};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting Signal Gateway");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        bus_url = %config.bus_url,
        node_id = %config.node_id,
        topic_namespace = %config.topic_namespace,
        request_timeout_seconds = config.request_timeout_seconds,
        room_auto_create = config.room_auto_create,
        "Configuration loaded successfully"
    );

    // Must happen before any metrics are recorded
    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!(error = %e, "Failed to install Prometheus metrics recorder");
        e
    })?;

    let topics: Arc<dyn TopicFormatter> =
        Arc::new(NamespacedTopicFormatter::new(config.topic_namespace.clone()));

    let bus = Arc::new(
        SignalBusClient::connect_lazy(&config, Arc::clone(&topics)).map_err(|e| {
            error!(error = %e, bus_url = %config.bus_url, "Invalid signal bus endpoint");
            e
        })?,
    );

    let gateway = SignalingGateway::new(
        config.limits.clone(),
        Collaborators {
            validator: Arc::new(DefaultConnectValidator::new()),
            placement: bus.clone(),
            router: bus.clone(),
            topics,
            relay: bus,
        },
    );

    let bind_address: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!(error = %e, addr = %config.bind_address, "Invalid bind address");
        format!("Invalid bind address: {e}")
    })?;
    let drain = Duration::from_secs(config.drain_seconds);

    let state = Arc::new(AppState {
        config,
        gateway: Arc::new(gateway),
    });
    let app = routes::build_routes(state, metrics_handle);

    // Bind before spawning to fail fast on bind errors
    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .map_err(|e| {
            error!(error = %e, addr = %bind_address, "Failed to bind HTTP server");
            format!("Failed to bind HTTP server to {bind_address}: {e}")
        })?;
    info!(addr = %bind_address, "Signal Gateway listening");

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        })
        .await
    });

    tokio::select! {
        () = shutdown_signal() => {}
        result = &mut server => {
            error!(result = ?result, "HTTP server exited unexpectedly");
            return Err("HTTP server exited unexpectedly".into());
        }
    }

    info!(
        drain_seconds = drain.as_secs(),
        "Shutdown signal received, draining in-flight requests"
    );
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(drain, server).await {
        Ok(Ok(Ok(()))) => info!("Signal Gateway shutdown complete"),
        Ok(Ok(Err(e))) => error!(error = %e, "HTTP server failed during shutdown"),
        Ok(Err(e)) => error!(error = %e, "HTTP server task failed"),
        Err(_) => warn!("Drain period elapsed with requests still in flight"),
    }

    Ok(())
}

/// Text output by default, JSON when `LOG_FORMAT=json`.
fn init_tracing() {
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    let (text_layer, json_layer) = if json {
        (None, Some(tracing_subscriber::fmt::layer().json()))
    } else {
        (Some(tracing_subscriber::fmt::layer()), None)
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "signal_gateway=debug,tower_http=debug".into()),
        )
        .with(text_layer)
        .with(json_layer)
        .init();
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
///
/// # Panics
///
/// Panics if signal handlers cannot be installed.
async fn shutdown_signal() {
    let ctrl_c = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation is critical - panic is appropriate if it fails"
        )]
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
