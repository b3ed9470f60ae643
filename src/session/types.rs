use crate::probe::error::{ProbeError, ProbeResult};
use crate::probe::history::HistoryRetention;
use crate::probe::types::QosReport;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Parameters shared by both ends of a probing session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProbeConfig {
    /// Random payload bytes per message (hex doubles this on the wire)
    pub payload_size: usize,
    /// Messages to publish, and distinct sequences to receive before the session is done
    pub count: usize,
    /// Pause between published messages in milliseconds
    pub interval_ms: u64,
    /// Sequence number of the first published message
    pub start_sequence: i64,
    pub retention: HistoryRetention,
    /// Keep a delivery history; without one no duplicates are reported
    pub detect_duplicates: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            payload_size: 64,
            count: 10,
            interval_ms: 1000,
            start_sequence: 0,
            retention: HistoryRetention::Unbounded,
            detect_duplicates: true,
        }
    }
}

impl ProbeConfig {
    /// Publish as fast as the transport accepts
    pub fn burst(count: usize) -> Self {
        Self {
            count,
            interval_ms: 0,
            ..Default::default()
        }
    }

    /// Long-running probe with a bounded history
    pub fn soak(count: usize) -> Self {
        Self {
            count,
            interval_ms: 100,
            retention: HistoryRetention::MaxEntries(10_000),
            ..Default::default()
        }
    }

    pub fn with_payload_size(mut self, payload_size: usize) -> Self {
        self.payload_size = payload_size;
        self
    }

    pub fn with_start_sequence(mut self, start_sequence: i64) -> Self {
        self.start_sequence = start_sequence;
        self
    }

    pub fn with_retention(mut self, retention: HistoryRetention) -> Self {
        self.retention = retention;
        self
    }

    pub fn without_duplicate_detection(mut self) -> Self {
        self.detect_duplicates = false;
        self
    }

    /// Sequence numbers a publisher with this config emits.
    /// Empty when the range does not fit in `i64`, which `validate` rejects.
    pub fn sequences(&self) -> std::ops::Range<i64> {
        let start = self.start_sequence;
        match i64::try_from(self.count)
            .ok()
            .and_then(|count| start.checked_add(count))
        {
            Some(end) => start..end,
            None => start..start,
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn validate(&self) -> ProbeResult<()> {
        if self.count == 0 {
            return Err(ProbeError::InvalidConfig(
                "count must be at least 1".to_string(),
            ));
        }
        if self.retention == HistoryRetention::MaxEntries(0) {
            return Err(ProbeError::InvalidConfig(
                "history retention must keep at least one entry".to_string(),
            ));
        }
        let end = i64::try_from(self.count)
            .ok()
            .and_then(|count| self.start_sequence.checked_add(count));
        if end.is_none() {
            return Err(ProbeError::InvalidConfig(format!(
                "{} messages from sequence {} overflow the sequence range",
                self.count, self.start_sequence
            )));
        }
        Ok(())
    }
}

/// Every sequence number seen in a session, stored as disjoint inclusive ranges.
///
/// Unlike the delivery history this is never evicted, so it stays exact for
/// long sessions while costing one entry per run of contiguous sequences.
#[derive(Debug, Clone, Default)]
pub struct SeenSequences {
    ranges: BTreeMap<i64, i64>,
    distinct: u64,
}

impl SeenSequences {
    /// Mark `sequence` as seen, returning false if it already was
    pub fn insert(&mut self, sequence: i64) -> bool {
        let before = self
            .ranges
            .range(..=sequence)
            .next_back()
            .map(|(&start, &end)| (start, end));

        if let Some((_, end)) = before {
            if sequence <= end {
                return false;
            }
        }

        let start = match before {
            Some((start, end)) if end.checked_add(1) == Some(sequence) => start,
            _ => sequence,
        };
        let end = match sequence.checked_add(1).and_then(|next| self.ranges.remove(&next)) {
            Some(end) => end,
            None => sequence,
        };

        self.ranges.insert(start, end);
        self.distinct += 1;
        true
    }

    pub fn contains(&self, sequence: i64) -> bool {
        self.ranges
            .range(..=sequence)
            .next_back()
            .is_some_and(|(_, &end)| sequence <= end)
    }

    /// Number of distinct sequences seen
    pub fn len(&self) -> u64 {
        self.distinct
    }

    pub fn is_empty(&self) -> bool {
        self.distinct == 0
    }

    /// Number of contiguous runs held
    pub fn runs(&self) -> usize {
        self.ranges.len()
    }

    /// Sequences between the lowest and highest seen that never arrived
    pub fn missing(&self) -> u64 {
        let (Some((&low, _)), Some((_, &high))) =
            (self.ranges.first_key_value(), self.ranges.last_key_value())
        else {
            return 0;
        };
        let span = (high as i128 - low as i128 + 1) as u128;
        span.saturating_sub(self.distinct as u128).min(u64::MAX as u128) as u64
    }
}

/// Running totals for one probing session
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    pub received: u64,
    pub duplicates: u64,
    pub out_of_order: u64,
    pub decode_errors: u64,
    pub lowest_sequence: Option<i64>,
    /// High-water mark: largest sequence ever received
    pub highest_sequence: Option<i64>,
    pub min_latency_ms: Option<f64>,
    pub max_latency_ms: Option<f64>,
    total_latency_ms: f64,
}

impl SessionStats {
    pub fn record(&mut self, report: &QosReport) {
        self.received += 1;
        if report.duplicate {
            self.duplicates += 1;
        }
        if report.is_out_of_order() {
            self.out_of_order += 1;
        }

        let seq = report.sequence;
        self.lowest_sequence = Some(self.lowest_sequence.map_or(seq, |s| s.min(seq)));
        self.highest_sequence = Some(self.highest_sequence.map_or(seq, |s| s.max(seq)));

        let latency = report.latency_ms();
        self.min_latency_ms = Some(self.min_latency_ms.map_or(latency, |l| l.min(latency)));
        self.max_latency_ms = Some(self.max_latency_ms.map_or(latency, |l| l.max(latency)));
        self.total_latency_ms += latency;
    }

    pub fn mean_latency_ms(&self) -> Option<f64> {
        if self.received > 0 {
            Some(self.total_latency_ms / self.received as f64)
        } else {
            None
        }
    }
}

/// Snapshot of a probing session's delivery quality
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub received: u64,
    /// Distinct sequences observed, exact even after history eviction
    /// (None without a delivery history)
    pub unique: Option<u64>,
    pub duplicates: u64,
    pub out_of_order: u64,
    pub decode_errors: u64,
    pub lowest_sequence: Option<i64>,
    pub highest_sequence: Option<i64>,
    /// Sequences between lowest and high-water mark never observed
    pub estimated_lost: Option<u64>,
    pub min_latency_ms: Option<f64>,
    pub max_latency_ms: Option<f64>,
    pub mean_latency_ms: Option<f64>,
    pub complete: bool,
}

impl SessionSummary {
    pub fn loss_rate(&self) -> Option<f64> {
        let lost = self.estimated_lost? as f64;
        let unique = self.unique? as f64;
        let expected = lost + unique;
        if expected > 0.0 {
            Some(lost / expected)
        } else {
            None
        }
    }

    pub fn report(&self) -> String {
        format!(
            "Received: {}, Unique: {}, Duplicates: {}, Out of order: {}, Lost: {}, Latency min/mean/max: {}/{}/{} ms",
            self.received,
            fmt_opt(self.unique),
            self.duplicates,
            self.out_of_order,
            fmt_opt(self.estimated_lost),
            fmt_ms(self.min_latency_ms),
            fmt_ms(self.mean_latency_ms),
            fmt_ms(self.max_latency_ms),
        )
    }
}

fn fmt_opt(value: Option<u64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn fmt_ms(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.3}", v))
}

/// Outcome of one publishing run
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublishStats {
    pub generated: u64,
    pub sent: u64,
    pub generation_failures: u64,
    pub send_failures: u64,
}
