pub mod counter;
pub mod generator;

pub use counter::RequestCounter;
pub use generator::MetricsGenerator;

use serde::{Deserialize, Serialize};

/// One synthetic metrics reading, exactly as the dashboard receives it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// CPU usage in percent, 20.0–90.0, one decimal
    pub cpu_usage: f64,
    /// Memory usage in percent, 30.0–85.0, one decimal
    pub memory_usage: f64,
    /// API latency in milliseconds, 50–300
    pub api_latency: u32,
    /// Post-increment counter value at generation time
    pub request_count: u64,
    /// ISO-8601 UTC timestamp, millisecond precision
    pub timestamp: String,
}
