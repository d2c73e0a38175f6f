use axum::{extract::State, Json};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::sync::Arc;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::AppState;

pub const SERVICE_NAME: &str = "monitoring-backend";
pub const SERVICE_TITLE: &str = "Monitoring Backend API";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ─── Response types ──────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ServiceDescriptor {
    pub service: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub endpoints: Endpoints,
}

#[derive(Debug, Serialize)]
pub struct Endpoints {
    pub metrics: &'static str,
    pub history: &'static str,
    pub health: &'static str,
    pub info: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    /// Whole seconds since startup
    pub uptime: u64,
    pub timestamp: String,
    pub service: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    pub service: &'static str,
    pub version: &'static str,
    pub environment: String,
    pub port: u16,
    pub total_requests: u64,
    pub uptime: u64,
    pub memory_usage: MemoryUsage,
    pub rust_version: &'static str,
}

/// Resident and virtual size of this process, in bytes.
#[derive(Debug, Default, Serialize)]
pub struct MemoryUsage {
    pub rss: u64,
    #[serde(rename = "virtual")]
    pub virtual_bytes: u64,
}

// ─── GET / ───────────────────────────────────────────────────────

pub async fn root() -> Json<ServiceDescriptor> {
    Json(ServiceDescriptor {
        service: SERVICE_TITLE,
        version: VERSION,
        status: "running",
        endpoints: Endpoints {
            metrics: "/metrics",
            history: "/metrics/history",
            health: "/health",
            info: "/info",
        },
    })
}

// ─── GET /health ─────────────────────────────────────────────────

pub async fn health(State(state): State<Arc<AppState>>) -> Json<Health> {
    Json(Health {
        status: "healthy",
        uptime: state.uptime_secs(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        service: SERVICE_NAME,
    })
}

// ─── GET /info ───────────────────────────────────────────────────

pub async fn info(State(state): State<Arc<AppState>>) -> Json<Info> {
    Json(Info {
        service: SERVICE_NAME,
        version: VERSION,
        environment: state.config.environment.clone(),
        port: state.config.port,
        total_requests: state.generator.current_count(),
        uptime: state.uptime_secs(),
        memory_usage: memory_usage(),
        rust_version: env!("CARGO_PKG_RUST_VERSION"),
    })
}

fn memory_usage() -> MemoryUsage {
    let pid = Pid::from_u32(std::process::id());
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

    sys.process(pid)
        .map(|p| MemoryUsage {
            rss: p.memory(),
            virtual_bytes: p.virtual_memory(),
        })
        .unwrap_or_default()
}
