use crate::metrics::recorder;
use crate::probe::codec::decode;
use crate::probe::error::ProbeResult;
use crate::probe::evaluator::evaluate_at;
use crate::probe::history::DeliveryHistory;
use crate::probe::types::{QosReport, TestMessage};
use crate::session::types::{ProbeConfig, SeenSequences, SessionStats, SessionSummary};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Receiving end of one probing session.
///
/// Owns the delivery history and the last evaluated message, so feeding it
/// from a single task is all the synchronization evaluation needs.
pub struct ProbeSession {
    session_id: String,
    config: ProbeConfig,
    history: Option<DeliveryHistory>,
    previous: Option<TestMessage>,
    stats: SessionStats,
    seen: SeenSequences,
}

impl ProbeSession {
    pub fn new(config: ProbeConfig) -> ProbeResult<Self> {
        config.validate()?;

        let session_id = Uuid::new_v4().to_string();
        let history = config
            .detect_duplicates
            .then(|| DeliveryHistory::with_retention(config.retention));

        info!(
            "Probing session {} started: expecting {} messages",
            session_id, config.count
        );

        Ok(Self {
            session_id,
            config,
            history,
            previous: None,
            stats: SessionStats::default(),
            seen: SeenSequences::default(),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    pub fn history(&self) -> Option<&DeliveryHistory> {
        self.history.as_ref()
    }

    /// Last message evaluated in this session
    pub fn previous(&self) -> Option<&TestMessage> {
        self.previous.as_ref()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Evaluate a received message and make it the new predecessor
    pub fn receive(&mut self, msg: TestMessage) -> QosReport {
        self.receive_at(msg, Utc::now())
    }

    pub fn receive_at(&mut self, msg: TestMessage, now: DateTime<Utc>) -> QosReport {
        let report = evaluate_at(&msg, self.previous.as_ref(), self.history.as_mut(), now);
        self.previous = Some(msg);

        self.stats.record(&report);
        if self.history.is_some() {
            self.seen.insert(report.sequence);
        }

        recorder::record_report(&self.session_id, &report);
        if let Some(history) = &self.history {
            recorder::set_history_entries(&self.session_id, history.len());
        }

        debug!(
            session_id = %self.session_id,
            sequence = report.sequence,
            duplicate = report.duplicate,
            "latency: {:.3} ms, order delta: {}",
            report.latency_ms(),
            report.sequence_delta
        );

        report
    }

    /// Decode and evaluate a raw message from the transport
    pub fn receive_bytes(&mut self, data: &[u8]) -> ProbeResult<QosReport> {
        match decode(data) {
            Ok(msg) => Ok(self.receive(msg)),
            Err(e) => {
                self.stats.decode_errors += 1;
                recorder::record_decode_error(&self.session_id);
                warn!(
                    "Session {}: undecodable test message ({} bytes): {}",
                    self.session_id,
                    data.len(),
                    e
                );
                Err(e)
            }
        }
    }

    /// True once `count` distinct sequences have been received
    /// (or `count` messages of any kind when duplicates are not tracked).
    /// Sequences dropped from a bounded history still count once.
    pub fn is_complete(&self) -> bool {
        let seen = if self.history.is_some() {
            self.seen.len()
        } else {
            self.stats.received
        };
        seen >= self.config.count as u64
    }

    pub fn summary(&self) -> SessionSummary {
        let tracked = self.history.as_ref().map(|_| &self.seen);
        let unique = tracked.map(SeenSequences::len);
        let estimated_lost = tracked.map(SeenSequences::missing);

        SessionSummary {
            session_id: self.session_id.clone(),
            received: self.stats.received,
            unique,
            duplicates: self.stats.duplicates,
            out_of_order: self.stats.out_of_order,
            decode_errors: self.stats.decode_errors,
            lowest_sequence: self.stats.lowest_sequence,
            highest_sequence: self.stats.highest_sequence,
            estimated_lost,
            min_latency_ms: self.stats.min_latency_ms,
            max_latency_ms: self.stats.max_latency_ms,
            mean_latency_ms: self.stats.mean_latency_ms(),
            complete: self.is_complete(),
        }
    }

    /// End the session and return its final summary
    pub fn finish(self) -> SessionSummary {
        let summary = self.summary();
        info!("Probing session {} finished: {}", self.session_id, summary.report());
        summary
    }
}
