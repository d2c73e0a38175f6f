use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, EnvFilter};

use monitoring_backend::config::Config;
use monitoring_backend::metrics::{MetricsGenerator, RequestCounter};
use monitoring_backend::store::Persistence;
use monitoring_backend::{server, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // ── 1. Configuration (fatal on bad values) ───────────────────
    let config = Config::from_env().context("invalid configuration")?;

    // RUST_LOG wins; LOG_LEVEL is the fallback.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        port = config.port,
        "monitoring backend starting"
    );

    // ── 2. Connect to the store (degraded mode on failure) ───────
    let store = Persistence::connect(&config).await;

    // ── 3. Build shared state ────────────────────────────────────
    let generator = MetricsGenerator::new(Arc::new(RequestCounter::new()));
    let port = config.port;
    let state = Arc::new(AppState::new(config, generator, store));

    // ── 4. Build Axum router ─────────────────────────────────────
    let app = server::create_router(state.clone());

    // ── 5. Bind & serve ──────────────────────────────────────────
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("listening on http://localhost:{port}");
    for path in monitoring_backend::handlers::ENDPOINTS {
        tracing::info!("  GET  http://localhost:{port}{path}");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server exited with error")?;

    // ── 6. Server drained; release the store ─────────────────────
    state.store.shutdown().await;
    tracing::info!("server closed");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
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
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("SIGINT received, shutting down gracefully"),
        _ = terminate => tracing::info!("SIGTERM received, shutting down gracefully"),
    }
}
