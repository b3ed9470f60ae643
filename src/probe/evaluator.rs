//! Receive-side QoS evaluation.
//!
//! Evaluation is synchronous and never fails. The only state it touches is
//! the caller-supplied [`DeliveryHistory`]; callers sharing one history across
//! threads go through [`evaluate_shared`].

use crate::probe::history::{DeliveryHistory, SharedHistory};
use crate::probe::types::{QosReport, TestMessage};
use chrono::{DateTime, Utc};

/// Evaluate `current` against the previously evaluated message, using the wall clock
pub fn evaluate(
    current: &TestMessage,
    previous: Option<&TestMessage>,
    history: Option<&mut DeliveryHistory>,
) -> QosReport {
    evaluate_at(current, previous, history, Utc::now())
}

/// Evaluate `current` as if received at `now`.
///
/// With no history, duplicate detection is skipped and `duplicate` is always false.
pub fn evaluate_at(
    current: &TestMessage,
    previous: Option<&TestMessage>,
    history: Option<&mut DeliveryHistory>,
    now: DateTime<Utc>,
) -> QosReport {
    let latency = now.signed_duration_since(current.origin_time);

    let last = previous.map(|p| p.sequence).unwrap_or(-1);
    let sequence_delta = current.sequence.wrapping_sub(last).wrapping_sub(1);

    let duplicate = match history {
        Some(history) => history.record_receipt(current),
        None => false,
    };

    QosReport {
        sequence: current.sequence,
        latency,
        sequence_delta,
        duplicate,
    }
}

/// Evaluate against a shared history, holding its lock for the whole call
pub fn evaluate_shared(
    current: &TestMessage,
    previous: Option<&TestMessage>,
    history: &SharedHistory,
) -> QosReport {
    let mut guard = history.lock();
    evaluate(current, previous, Some(&mut *guard))
}
