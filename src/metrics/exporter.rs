//! Prometheus metrics exporter
//!
//! Exposes probe metrics via HTTP for Prometheus scraping, or in-process
//! through [`render_metrics`] for harnesses that report on their own.

use crate::metrics::recorder::init_metrics;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;

/// Global prometheus handle
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics server configuration
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Address to bind the metrics server
    pub listen_addr: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 9090)),
        }
    }
}

impl MetricsConfig {
    /// Create a new config with custom address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self { listen_addr: addr }
    }
}

/// Install the Prometheus recorder and serve it over HTTP.
///
/// Must be called from within a Tokio runtime. Only the first successful
/// call installs anything; later calls return the existing handle.
pub fn start_metrics_server(
    config: MetricsConfig,
) -> Result<&'static PrometheusHandle, MetricsError> {
    init_metrics();

    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle);
    }

    let runtime = tokio::runtime::Handle::try_current()
        .map_err(|e| MetricsError::SetupFailed(e.to_string()))?;

    let (recorder, exporter) = PrometheusBuilder::new()
        .with_http_listener(config.listen_addr)
        .build()
        .map_err(|e| MetricsError::SetupFailed(e.to_string()))?;

    let handle = recorder.handle();
    metrics::set_global_recorder(recorder).map_err(|_| MetricsError::AlreadyInitialized)?;

    runtime.spawn(async move {
        if let Err(e) = exporter.await {
            tracing::warn!("metrics exporter stopped: {:?}", e);
        }
    });

    tracing::info!("metrics exporter listening on {}", config.listen_addr);
    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle))
}

/// Install the Prometheus recorder without an HTTP listener
pub fn install_recorder() -> Result<&'static PrometheusHandle, MetricsError> {
    init_metrics();

    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::SetupFailed(e.to_string()))?;

    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle))
}

/// Get the current prometheus handle (if initialized)
pub fn get_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|h| h.render())
}

/// Errors that can occur during metrics setup
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Failed to setup metrics: {0}")]
    SetupFailed(String),

    #[error("Metrics already initialized")]
    AlreadyInitialized,
}

/// Builder for metrics configuration
pub struct MetricsBuilder {
    config: MetricsConfig,
}

impl MetricsBuilder {
    pub fn new() -> Self {
        Self {
            config: MetricsConfig::default(),
        }
    }

    /// Set the listen address
    pub fn listen_addr(mut self, addr: SocketAddr) -> Self {
        self.config.listen_addr = addr;
        self
    }

    /// Build and start the metrics server
    pub fn build(self) -> Result<&'static PrometheusHandle, MetricsError> {
        start_metrics_server(self.config)
    }
}

impl Default for MetricsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
