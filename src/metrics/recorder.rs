//! Metrics recorder for probing sessions
//!
//! Records per-message delivery quality as counters, gauges and histograms.

use crate::probe::QosReport;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::sync::atomic::{AtomicBool, Ordering};

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize metric descriptions (call once at startup)
pub fn init_metrics() {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        return; // Already initialized
    }

    // Publishing side
    describe_counter!(
        "probe_messages_generated_total",
        "Total number of test messages generated"
    );
    describe_counter!(
        "probe_generation_failures_total",
        "Test messages abandoned because the entropy source failed"
    );
    describe_counter!(
        "probe_send_failures_total",
        "Test messages the transport refused to send"
    );

    // Receiving side
    describe_counter!(
        "probe_messages_received_total",
        "Total number of test messages evaluated"
    );
    describe_counter!(
        "probe_duplicates_total",
        "Received test messages whose sequence was already recorded"
    );
    describe_counter!(
        "probe_decode_errors_total",
        "Received payloads that could not be decoded"
    );
    describe_counter!(
        "probe_sequence_gap_total",
        "Sum of positive sequence deltas (messages skipped between receipts)"
    );
    describe_counter!(
        "probe_out_of_order_total",
        "Received test messages with a negative sequence delta"
    );

    describe_gauge!(
        "probe_history_entries",
        "Distinct sequences held in the delivery history"
    );

    describe_histogram!(
        "probe_payload_bytes",
        "Random payload size of generated test messages"
    );
    describe_histogram!(
        "probe_latency_ms",
        "End-to-end latency of test messages in milliseconds"
    );
}

// ============== Publishing ==============

/// Record a test message being generated
pub fn record_message_generated(session_id: &str, payload_size: usize) {
    counter!("probe_messages_generated_total", "session_id" => session_id.to_string())
        .increment(1);
    histogram!("probe_payload_bytes").record(payload_size as f64);
}

/// Record a generation call failing
pub fn record_generation_failed(session_id: &str) {
    counter!("probe_generation_failures_total", "session_id" => session_id.to_string())
        .increment(1);
}

/// Record the transport refusing a message
pub fn record_send_failed(session_id: &str) {
    counter!("probe_send_failures_total", "session_id" => session_id.to_string()).increment(1);
}

// ============== Receiving ==============

/// Record an evaluated test message
pub fn record_report(session_id: &str, report: &QosReport) {
    counter!("probe_messages_received_total", "session_id" => session_id.to_string())
        .increment(1);
    histogram!("probe_latency_ms", "session_id" => session_id.to_string())
        .record(report.latency_ms());

    if report.duplicate {
        counter!("probe_duplicates_total", "session_id" => session_id.to_string()).increment(1);
    }

    if report.sequence_delta > 0 {
        counter!("probe_sequence_gap_total", "session_id" => session_id.to_string())
            .increment(report.sequence_delta as u64);
    } else if report.sequence_delta < 0 {
        counter!("probe_out_of_order_total", "session_id" => session_id.to_string())
            .increment(1);
    }
}

/// Record a payload that failed to decode
pub fn record_decode_error(session_id: &str) {
    counter!("probe_decode_errors_total", "session_id" => session_id.to_string()).increment(1);
}

/// Update history size gauge
pub fn set_history_entries(session_id: &str, entries: usize) {
    gauge!("probe_history_entries", "session_id" => session_id.to_string()).set(entries as f64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_init_metrics() {
        // Should not panic when called multiple times
        init_metrics();
        init_metrics();
    }

    #[test]
    fn test_record_without_recorder() {
        // No recorder installed: calls are no-ops
        let report = QosReport {
            sequence: 4,
            latency: TimeDelta::milliseconds(3),
            sequence_delta: -2,
            duplicate: true,
        };
        record_report("test-session", &report);
        record_message_generated("test-session", 64);
        record_decode_error("test-session");
        set_history_entries("test-session", 10);
    }
}
