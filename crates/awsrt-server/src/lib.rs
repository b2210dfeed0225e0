//! AWSRT REST API server.
//!
//! Exposes the run engine over HTTP using Axum.
//! Endpoints: /health, /manifests/*, /runs/*, /preview/belief.png

mod handlers;
mod routes;
mod state;

use awsrt_config::ServerSection;
use awsrt_core::RunEngine;

pub use routes::build_router;
pub use state::AppState;

/// Start the API server with graceful shutdown on SIGTERM/SIGINT.
pub async fn serve(
    engine: RunEngine,
    config: &ServerSection,
) -> Result<(), Box<dyn std::error::Error>> {
    if !is_loopback_host(&config.host) {
        tracing::warn!(
            host = %config.host,
            "Binding to a non-local host; the API has no authentication"
        );
    }

    let state = AppState::new(engine);
    let app = build_router(state.clone(), config);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("AWSRT server listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!(
        uptime_secs = state.uptime_secs(),
        "AWSRT server shut down gracefully"
    );
    Ok(())
}

fn is_loopback_host(host: &str) -> bool {
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    host.parse::<std::net::IpAddr>()
        .map(|ip| ip.is_loopback())
        .unwrap_or(false)
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { tracing::info!("Received SIGINT, shutting down..."); }
        _ = terminate => { tracing::info!("Received SIGTERM, shutting down..."); }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loopback_hosts() {
        assert!(is_loopback_host("127.0.0.1"));
        assert!(is_loopback_host("LOCALHOST"));
        assert!(is_loopback_host("::1"));
        assert!(!is_loopback_host("0.0.0.0"));
        assert!(!is_loopback_host("example.org"));
    }
}
