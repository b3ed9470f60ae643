//! Metrics and observability module
//!
//! Provides Prometheus-compatible metrics for probing sessions.
//!
//! Key metrics exposed:
//! - Messages generated, received and abandoned
//! - Duplicate and out-of-order deliveries
//! - Sequence gaps
//! - End-to-end latency distribution

pub mod exporter;
pub mod recorder;

pub use exporter::{
    install_recorder, render_metrics, start_metrics_server, MetricsBuilder, MetricsConfig,
    MetricsError,
};
pub use recorder::{init_metrics, record_report};
