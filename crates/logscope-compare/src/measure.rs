use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

/// Timing collaborator handed to the comparator
pub trait Measure: Send + Sync {
    fn start_measure(&self, name: &str);

    /// Elapsed time since the matching `start_measure`, or zero if none is pending
    fn end_measure(&self, name: &str) -> Duration;
}

/// Discards all measurements
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopMeasure;

impl Measure for NoopMeasure {
    fn start_measure(&self, _name: &str) {}

    fn end_measure(&self, _name: &str) -> Duration {
        Duration::ZERO
    }
}

/// Records start instants and reports finished measurements as `tracing` events
#[derive(Debug, Default)]
pub struct TracingMeasure {
    started: Mutex<HashMap<String, Instant>>,
}

impl TracingMeasure {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Measure for TracingMeasure {
    fn start_measure(&self, name: &str) {
        self.started.lock().insert(name.to_string(), Instant::now());
    }

    fn end_measure(&self, name: &str) -> Duration {
        let Some(start) = self.started.lock().remove(name) else {
            return Duration::ZERO;
        };

        let elapsed = start.elapsed();
        debug!(measure = name, elapsed_ms = elapsed.as_secs_f64() * 1000.0, "measurement finished");
        elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop() {
        let m = NoopMeasure;
        m.start_measure("x");
        assert_eq!(m.end_measure("x"), Duration::ZERO);
    }

    #[test]
    fn test_tracing_measure_pairs_start_and_end() {
        let m = TracingMeasure::new();
        assert_eq!(m.end_measure("never-started"), Duration::ZERO);

        m.start_measure("compare");
        std::thread::sleep(Duration::from_millis(2));
        assert!(m.end_measure("compare") >= Duration::from_millis(2));

        // Consumed by the first end
        assert_eq!(m.end_measure("compare"), Duration::ZERO);
    }
}
