//! Metrics recording implementation using Prometheus.

use prometheus::{
    register_counter_vec_with_registry, register_counter_with_registry,
    register_histogram_vec_with_registry, Counter, CounterVec, Encoder, HistogramVec, Opts,
    Registry, TextEncoder,
};
use std::sync::Arc;

/// Trait for recording client metrics.
pub trait MetricsRecorder: Clone + Send + Sync + 'static {
    /// Records the final outcome of one logical call ("success" or "error").
    fn record_request(&self, outcome: &str, duration_secs: f64);

    /// Records a refresh network call and its result.
    fn record_refresh(&self, result: &str);

    /// Records a replay after a successful refresh.
    fn record_retry(&self);

    /// Records a classified rejection.
    fn record_error(&self, kind: &str, origin: &str);
}

/// Prometheus metrics collector.
///
/// Every instance owns its own registry so several clients can coexist.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,

    // Request metrics
    requests_total: CounterVec,
    request_duration_seconds: HistogramVec,

    // Refresh metrics
    refresh_total: CounterVec,
    retries_total: Counter,

    // Classified errors
    errors_total: CounterVec,
}

impl Metrics {
    /// Creates a new metrics instance with a Prometheus registry.
    pub fn new() -> Self {
        let registry = Arc::new(Registry::new());

        let requests_total = register_counter_vec_with_registry!(
            Opts::new("client_requests_total", "Total number of logical API calls"),
            &["outcome"],
            registry.clone()
        )
        .expect("Failed to register client_requests_total");

        let request_duration_seconds = register_histogram_vec_with_registry!(
            "client_request_duration_seconds",
            "Logical API call duration in seconds, replay included",
            &["outcome"],
            vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
            registry.clone()
        )
        .expect("Failed to register client_request_duration_seconds");

        let refresh_total = register_counter_vec_with_registry!(
            Opts::new("client_refresh_total", "Token refresh network calls"),
            &["result"],
            registry.clone()
        )
        .expect("Failed to register client_refresh_total");

        let retries_total = register_counter_with_registry!(
            Opts::new(
                "client_retries_total",
                "Calls replayed after a successful refresh"
            ),
            registry.clone()
        )
        .expect("Failed to register client_retries_total");

        let errors_total = register_counter_vec_with_registry!(
            Opts::new("client_errors_total", "Classified rejections"),
            &["kind", "origin"],
            registry.clone()
        )
        .expect("Failed to register client_errors_total");

        Metrics {
            registry,
            requests_total,
            request_duration_seconds,
            refresh_total,
            retries_total,
            errors_total,
        }
    }

    /// Number of refresh calls recorded with `result`.
    pub fn refresh_count(&self, result: &str) -> u64 {
        self.refresh_total.with_label_values(&[result]).get() as u64
    }

    pub fn retry_count(&self) -> u64 {
        self.retries_total.get() as u64
    }

    /// Renders all metrics in Prometheus text format.
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::warn!("Failed to encode metrics: {}", e);
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder for Metrics {
    fn record_request(&self, outcome: &str, duration_secs: f64) {
        self.requests_total.with_label_values(&[outcome]).inc();
        self.request_duration_seconds
            .with_label_values(&[outcome])
            .observe(duration_secs);
    }

    fn record_refresh(&self, result: &str) {
        self.refresh_total.with_label_values(&[result]).inc();
    }

    fn record_retry(&self) {
        self.retries_total.inc();
    }

    fn record_error(&self, kind: &str, origin: &str) {
        self.errors_total.with_label_values(&[kind, origin]).inc();
    }
}
