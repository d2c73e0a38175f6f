use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::metrics::MetricSample;
use crate::store::StoreError;
use crate::AppState;

use super::AppError;

pub const DEFAULT_HISTORY_LIMIT: usize = 20;
pub const MAX_HISTORY_LIMIT: usize = 1_000;

// ─── Request / response types ────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub count: usize,
    pub metrics: Vec<MetricSample>,
}

// ─── GET /metrics ────────────────────────────────────────────────

pub async fn get_metrics(State(state): State<Arc<AppState>>) -> Json<MetricSample> {
    let sample = state.generator.generate();

    match state.store.save(&sample).await {
        Ok(()) => {}
        Err(StoreError::Unavailable) => {
            tracing::debug!(request_count = sample.request_count, "metric not saved: no store");
        }
        Err(e) => {
            tracing::warn!(
                request_count = sample.request_count,
                error = %e,
                "failed to save metric"
            );
        }
    }

    Json(sample)
}

// ─── GET /metrics/history ────────────────────────────────────────

pub async fn metrics_history(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<HistoryResponse>, AppError> {
    let limit = parse_limit(first_param(&params, "limit"));

    let metrics = match state.store.query_recent(limit).await {
        Ok(metrics) => metrics,
        // Degraded mode: nothing was ever stored.
        Err(StoreError::Unavailable) => Vec::new(),
        Err(e) => {
            tracing::error!(limit, error = %e, "failed to fetch metrics history");
            return Err(AppError::History(e));
        }
    };

    Ok(Json(HistoryResponse {
        count: metrics.len(),
        metrics,
    }))
}

// ─── Helpers ─────────────────────────────────────────────────────

/// Query pairs stay raw so junk or repeated keys never reject the request;
/// the first occurrence of `key` wins.
pub fn first_param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Lenient integer parse: leading digits win ("15abc" → 15), a sign is
/// allowed and dropped, zero or garbage means the default, and the result
/// is capped at `MAX_HISTORY_LIMIT`.
pub fn parse_limit(raw: Option<&str>) -> usize {
    let Some(raw) = raw else {
        return DEFAULT_HISTORY_LIMIT;
    };

    let s = raw.trim();
    let s = s.strip_prefix(['-', '+']).unwrap_or(s);
    let digits: &str = &s[..s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len())];

    match digits.parse::<usize>() {
        Ok(0) => DEFAULT_HISTORY_LIMIT,
        Ok(n) => n.min(MAX_HISTORY_LIMIT),
        // Digits present but too large for usize.
        Err(_) if !digits.is_empty() => MAX_HISTORY_LIMIT,
        Err(_) => DEFAULT_HISTORY_LIMIT,
    }
}
