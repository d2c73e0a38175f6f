//! Demo monitoring backend: fabricates system metrics on demand, keeps a
//! best-effort history in Redis, and serves both over a small JSON API
//! for the dashboard to poll.

pub mod config;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod server;
pub mod store;

use std::time::Instant;

use config::Config;
use metrics::MetricsGenerator;
use store::Persistence;

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    pub config: Config,

    /// Owns the request counter; `/metrics` draws from it, `/info` reads it.
    pub generator: MetricsGenerator,

    /// Sample history. Disconnected when the store was unreachable at startup.
    pub store: Persistence,

    /// Anchor for the `uptime` fields.
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config, generator: MetricsGenerator, store: Persistence) -> Self {
        Self {
            config,
            generator,
            store,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
