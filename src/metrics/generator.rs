use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use rand::Rng;

use super::{MetricSample, RequestCounter};

// ─── Sampling ranges ─────────────────────────────────────────────

const CPU_RANGE: (f64, f64) = (20.0, 90.0);
const MEMORY_RANGE: (f64, f64) = (30.0, 85.0);
const LATENCY_RANGE_MS: (u32, u32) = (50, 300);

// ─── Generator ───────────────────────────────────────────────────

/// Fabricates `MetricSample`s. Cloning shares the same counter.
///
/// Generation never touches the store: the `/metrics` handler persists
/// the returned sample as a separate step.
#[derive(Debug, Clone)]
pub struct MetricsGenerator {
    counter: Arc<RequestCounter>,
}

impl MetricsGenerator {
    pub fn new(counter: Arc<RequestCounter>) -> Self {
        Self { counter }
    }

    /// Produce a sample from the thread-local RNG.
    pub fn generate(&self) -> MetricSample {
        self.generate_with(&mut rand::thread_rng())
    }

    /// Produce a sample from a caller-supplied RNG (seeded in tests).
    pub fn generate_with<R: Rng>(&self, rng: &mut R) -> MetricSample {
        let request_count = self.counter.increment();

        MetricSample {
            cpu_usage: round1(rng.gen_range(CPU_RANGE.0..=CPU_RANGE.1)),
            memory_usage: round1(rng.gen_range(MEMORY_RANGE.0..=MEMORY_RANGE.1)),
            api_latency: rng.gen_range(LATENCY_RANGE_MS.0..=LATENCY_RANGE_MS.1),
            request_count,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn current_count(&self) -> u64 {
        self.counter.current()
    }

    pub fn reset_count(&self) {
        self.counter.reset();
    }
}

/// Round to one decimal place.
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn generator() -> MetricsGenerator {
        MetricsGenerator::new(Arc::new(RequestCounter::new()))
    }

    #[test]
    fn samples_stay_in_range() {
        let gen = generator();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..1000 {
            let s = gen.generate_with(&mut rng);
            assert!((20.0..=90.0).contains(&s.cpu_usage), "cpu {}", s.cpu_usage);
            assert!((30.0..=85.0).contains(&s.memory_usage), "mem {}", s.memory_usage);
            assert!((50..=300).contains(&s.api_latency), "latency {}", s.api_latency);
        }
    }

    #[test]
    fn percentages_have_one_decimal() {
        let gen = generator();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..200 {
            let s = gen.generate_with(&mut rng);
            assert_eq!(round1(s.cpu_usage), s.cpu_usage);
            assert_eq!(round1(s.memory_usage), s.memory_usage);
        }
    }

    #[test]
    fn request_count_tracks_calls() {
        let gen = generator();
        for n in 1..=5 {
            assert_eq!(gen.generate().request_count, n);
        }
        assert_eq!(gen.current_count(), 5);

        gen.reset_count();
        assert_eq!(gen.current_count(), 0);
        assert_eq!(gen.generate().request_count, 1);
    }

    #[test]
    fn timestamp_is_rfc3339_utc() {
        let s = generator().generate();
        let parsed = DateTime::parse_from_rfc3339(&s.timestamp).expect("valid timestamp");
        assert_eq!(parsed.offset().local_minus_utc(), 0);
        assert!(s.timestamp.ends_with('Z'));
    }

    #[test]
    fn same_seed_same_values() {
        let a = generator().generate_with(&mut StdRng::seed_from_u64(1));
        let b = generator().generate_with(&mut StdRng::seed_from_u64(1));
        assert_eq!(a.cpu_usage, b.cpu_usage);
        assert_eq!(a.memory_usage, b.memory_usage);
        assert_eq!(a.api_latency, b.api_latency);
    }
}
