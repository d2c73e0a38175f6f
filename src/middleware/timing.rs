use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Request logger. Adds two response headers:
///
///   X-Response-Time-Us  — total handler wall time in microseconds
///   Server-Timing       — same value in the standard Server-Timing format
///
/// and emits one `tracing` event per request.
pub async fn timing_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let start = Instant::now();
    let mut response = next.run(req).await;
    let elapsed = start.elapsed();
    let us = elapsed.as_micros() as u64;

    // ── Inject response headers ─────────────────────────────────
    if let Ok(val) = us.to_string().parse() {
        response.headers_mut().insert("X-Response-Time-Us", val);
    }

    let server_timing = format!("total;dur={:.3}", elapsed.as_secs_f64() * 1000.0);
    if let Ok(val) = server_timing.parse() {
        response.headers_mut().insert("Server-Timing", val);
    }

    // ── Log ─────────────────────────────────────────────────────
    let status = response.status().as_u16();
    match status {
        500..=599 => tracing::error!(%method, %path, status, elapsed_us = us, "request"),
        400..=499 => tracing::warn!(%method, %path, status, elapsed_us = us, "request"),
        _ => tracing::info!(%method, %path, status, elapsed_us = us, "request"),
    }

    response
}
