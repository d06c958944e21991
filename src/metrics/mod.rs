//! Metrics collection and exposition for Prometheus.
//!
//! This module provides centralized metrics recording for the client.

mod recorder;

pub use recorder::{Metrics, MetricsRecorder};
