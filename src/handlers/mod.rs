pub mod metrics;
pub mod service;

use std::any::Any;

use axum::{
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};

use crate::store::StoreError;

/// Every route the service answers, advertised on 404s.
pub const ENDPOINTS: &[&str] = &["/", "/metrics", "/metrics/history", "/health", "/info"];

// ─── Unified error type ──────────────────────────────────────────

#[derive(Debug)]
pub enum AppError {
    /// History lookup failed against a connected store.
    History(StoreError),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = match self {
            Self::History(e) => serde_json::json!({
                "error":   "Failed to fetch metrics history",
                "message": e.to_string(),
                "metrics": [],
            }),
            Self::Internal(msg) => serde_json::json!({
                "error":   "Internal Server Error",
                "message": msg,
            }),
        };

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

// ─── Fallback: unknown routes ────────────────────────────────────

pub async fn not_found(method: Method, uri: Uri) -> Response {
    let body = serde_json::json!({
        "error":   "Not Found",
        "message": format!("Route {method} {} not found", uri.path()),
        "availableEndpoints": ENDPOINTS,
    });

    (StatusCode::NOT_FOUND, Json(body)).into_response()
}

// ─── Panic → 500 ─────────────────────────────────────────────────

/// Used by `CatchPanicLayer`: a panicking handler becomes a 500 with the
/// panic message, and the server keeps serving.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_owned()
    } else {
        "unknown panic".to_owned()
    };

    tracing::error!(%message, "handler panicked");
    AppError::Internal(message).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn panic_becomes_internal_error() {
        let resp = handle_panic(Box::new("boom"));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(resp).await;
        assert_eq!(json["error"], "Internal Server Error");
        assert_eq!(json["message"], "boom");
    }

    #[tokio::test]
    async fn history_error_carries_empty_metrics() {
        let resp = AppError::History(StoreError::Backend("READONLY".into())).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(resp).await;
        assert_eq!(json["error"], "Failed to fetch metrics history");
        assert_eq!(json["message"], "store backend error: READONLY");
        assert_eq!(json["metrics"], serde_json::json!([]));
    }
}
