use crate::probe::types::TestMessage;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// How long first-seen messages are kept for duplicate detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HistoryRetention {
    /// Keep every first-seen message for the life of the session
    #[default]
    Unbounded,
    /// Keep at most this many entries, evicting the oldest arrival first.
    /// A re-delivery of an evicted sequence is treated as first-seen.
    MaxEntries(usize),
}

/// History guarded for use by several evaluators at once
pub type SharedHistory = Arc<Mutex<DeliveryHistory>>;

/// First-seen message per sequence number for one probing session.
#[derive(Debug, Clone, Default)]
pub struct DeliveryHistory {
    entries: HashMap<i64, TestMessage>,
    arrivals: VecDeque<i64>,
    retention: HistoryRetention,
    evicted: u64,
}

impl DeliveryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(retention: HistoryRetention) -> Self {
        Self {
            retention,
            ..Self::default()
        }
    }

    pub fn retention(&self) -> HistoryRetention {
        self.retention
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, sequence: i64) -> bool {
        self.entries.contains_key(&sequence)
    }

    pub fn get(&self, sequence: i64) -> Option<&TestMessage> {
        self.entries.get(&sequence)
    }

    /// Receipts recorded for a sequence, 0 if never seen (or evicted)
    pub fn delivery_count(&self, sequence: i64) -> u32 {
        self.entries
            .get(&sequence)
            .map(TestMessage::delivery_count)
            .unwrap_or(0)
    }

    /// Number of entries dropped by the retention window
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Sequences currently held, in no particular order
    pub fn sequences(&self) -> impl Iterator<Item = i64> + '_ {
        self.entries.keys().copied()
    }

    pub fn into_shared(self) -> SharedHistory {
        Arc::new(Mutex::new(self))
    }

    /// Record one receipt of `message`, returning whether it was already recorded.
    ///
    /// A first receipt stores a copy with a delivery count of 1; later receipts
    /// bump the stored count. `message` itself is left untouched.
    pub(crate) fn record_receipt(&mut self, message: &TestMessage) -> bool {
        if let Some(stored) = self.entries.get_mut(&message.sequence) {
            let duplicate = stored.delivery_count() > 0;
            stored.record_delivery();
            return duplicate;
        }

        self.make_room();

        let mut first = message.clone();
        first.set_delivery_count(1);
        self.entries.insert(message.sequence, first);
        if let HistoryRetention::MaxEntries(_) = self.retention {
            self.arrivals.push_back(message.sequence);
        }

        false
    }

    fn make_room(&mut self) {
        let HistoryRetention::MaxEntries(max) = self.retention else {
            return;
        };

        while self.entries.len() >= max.max(1) {
            match self.arrivals.pop_front() {
                Some(oldest) => {
                    if self.entries.remove(&oldest).is_some() {
                        self.evicted += 1;
                    }
                }
                None => break,
            }
        }
    }
}
