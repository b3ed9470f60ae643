//! # qos_probe
//!
//! Message-delivery quality-of-service probe. Generates uniquely numbered
//! test messages for a channel under test and, on the receiving side,
//! measures latency, sequence gaps and duplicate delivery.
//!
//! - `probe`: message generation, QoS evaluation, delivery history and wire codec
//! - `session`: publishing/receiving loops and per-session statistics
//! - `metrics`: Prometheus-compatible metrics for probing sessions

pub mod metrics;
pub mod probe;
pub mod session;

pub use probe::{
    evaluate, DeliveryHistory, Generator, ProbeError, ProbeResult, QosReport, TestMessage,
};
pub use session::{ProbeConfig, ProbePublisher, ProbeSession, ProbeSubscriber, SessionSummary};
