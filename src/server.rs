use axum::{
    http::{HeaderValue, Method},
    handler::Handler,
    middleware as axum_mw,
    routing::{get, MethodRouter},
    Router,
};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};

use crate::handlers;
use crate::middleware::timing;
use crate::AppState;

/// Builds the full Axum `Router` with all routes and middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors_origin);

    Router::new()
        // ── Service descriptors ─────────────────────────────────
        .route("/", get_only(handlers::service::root))
        .route("/health", get_only(handlers::service::health))
        .route("/info", get_only(handlers::service::info))
        // ── Metrics ─────────────────────────────────────────────
        .route("/metrics", get_only(handlers::metrics::get_metrics))
        .route("/metrics/history", get_only(handlers::metrics::metrics_history))
        // ── Everything else ─────────────────────────────────────
        .fallback(handlers::not_found)
        // ── Provide shared state to all routes above ────────────
        .with_state(state)
        // ── Global middleware (applied bottom-up) ───────────────
        .layer(CatchPanicLayer::custom(handlers::handle_panic))
        .layer(axum_mw::from_fn(timing::timing_middleware))
        .layer(cors)
}

/// GET route whose other methods get the same JSON 404 as unknown paths.
fn get_only<H, T>(handler: H) -> MethodRouter<Arc<AppState>>
where
    H: Handler<T, Arc<AppState>>,
    T: 'static,
{
    get(handler).fallback(handlers::not_found)
}

/// `*` opens CORS to everyone; anything else is a single allowed origin.
/// The origin was validated when the config was loaded.
fn cors_layer(origin: &str) -> CorsLayer {
    if origin == "*" {
        return CorsLayer::permissive();
    }

    match HeaderValue::from_str(origin) {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods([Method::GET, Method::OPTIONS])
            .allow_headers(Any),
        Err(_) => {
            tracing::warn!(%origin, "invalid CORS origin, falling back to permissive");
            CorsLayer::permissive()
        }
    }
}
