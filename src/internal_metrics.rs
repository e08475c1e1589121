//! A metrics recorder that logs the counters captured during a report cycle.

use metrics::{Counter, Gauge, Histogram, Key, KeyName, Label, Metadata, Recorder, SharedString, Unit};
use metrics_util::registry::{AtomicStorage, Registry};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

/// Keeps every metric in memory and logs them on `log_snapshot()`.
///
/// Clones share the same registry, so one clone can be installed as the
/// global recorder while another is kept for logging.
#[derive(Clone)]
pub struct LoggingRecorder {
    registry: Arc<Registry<Key, AtomicStorage>>,
}

impl LoggingRecorder {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry::new(AtomicStorage)),
        }
    }

    /// The current value of a counter, or 0 if it was never incremented.
    pub fn counter_value(&self, name: &str, labels: &[(&str, &str)]) -> u64 {
        let key = Key::from_parts(
            name.to_string(),
            labels
                .iter()
                .map(|(key, value)| Label::new(key.to_string(), value.to_string()))
                .collect::<Vec<_>>(),
        );
        self.registry
            .get_counter_handles()
            .get(&key)
            .map_or(0, |counter| counter.load(Ordering::Relaxed))
    }

    /// Logs every counter and gauge at info level.
    pub fn log_snapshot(&self) {
        info!("--- Metrics Snapshot ---");
        for (key, counter) in self.registry.get_counter_handles() {
            info!("[Counter] {}: {}", key, counter.load(Ordering::Relaxed));
        }
        for (key, gauge) in self.registry.get_gauge_handles() {
            info!("[Gauge] {}: {}", key, f64::from_bits(gauge.load(Ordering::Relaxed)));
        }
    }
}

impl Default for LoggingRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Recorder for LoggingRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        self.registry.get_or_create_counter(key, |c| c.clone()).into()
    }

    fn register_gauge(&self, key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        self.registry.get_or_create_gauge(key, |g| g.clone()).into()
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        self.registry.get_or_create_histogram(key, |h| h.clone()).into()
    }
}
