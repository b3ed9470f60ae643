use crate::probe::codec::WireEnvelope;
use crate::probe::error::ProbeResult;
use crate::probe::generator::{Generator, OsEntropy};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Synthetic message injected into the channel under test.
///
/// Only `sequence`, `payload` and `origin_time` travel on the wire. The
/// delivery count belongs to the receiving side and is never encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireEnvelope", into = "WireEnvelope")]
pub struct TestMessage {
    pub sequence: i64,
    pub payload: String,
    pub origin_time: DateTime<Utc>,
    delivery_count: u32,
}

impl TestMessage {
    pub fn new(sequence: i64, payload: impl Into<String>, origin_time: DateTime<Utc>) -> Self {
        Self {
            sequence,
            payload: payload.into(),
            origin_time,
            delivery_count: 0,
        }
    }

    /// Generate a message using the operating system's entropy source
    pub fn generate(sequence: i64, payload_size: usize) -> ProbeResult<Self> {
        Generator::new(OsEntropy::default()).generate(sequence, payload_size)
    }

    /// Number of receipts recorded for this sequence (0 until evaluated)
    pub fn delivery_count(&self) -> u32 {
        self.delivery_count
    }

    /// Size of the random payload in bytes (before hex encoding)
    pub fn payload_size(&self) -> usize {
        self.payload.len() / 2
    }

    pub(crate) fn set_delivery_count(&mut self, count: u32) {
        self.delivery_count = count;
    }

    pub(crate) fn record_delivery(&mut self) {
        self.delivery_count = self.delivery_count.saturating_add(1);
    }
}

/// Per-message delivery quality computed on receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QosReport {
    pub sequence: i64,
    /// Evaluation instant minus origin time. Not clamped, so clock skew shows up as negative.
    pub latency: TimeDelta,
    /// `current - previous - 1`; zero when contiguous, negative when out of order
    pub sequence_delta: i64,
    pub duplicate: bool,
}

impl QosReport {
    pub fn latency_ms(&self) -> f64 {
        match self.latency.num_microseconds() {
            Some(us) => us as f64 / 1000.0,
            None => self.latency.num_milliseconds() as f64,
        }
    }

    pub fn is_contiguous(&self) -> bool {
        self.sequence_delta == 0
    }

    pub fn is_out_of_order(&self) -> bool {
        self.sequence_delta < 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_message_has_no_deliveries() {
        let msg = TestMessage::new(7, "abcd", Utc::now());
        assert_eq!(msg.delivery_count(), 0);
        assert_eq!(msg.payload_size(), 2);
    }

    #[test]
    fn test_latency_ms_keeps_sign() {
        let report = QosReport {
            sequence: 1,
            latency: TimeDelta::microseconds(-2500),
            sequence_delta: 0,
            duplicate: false,
        };
        assert_eq!(report.latency_ms(), -2.5);
        assert!(report.is_contiguous());
        assert!(!report.is_out_of_order());
    }
}
