//! Simulated lossy channel for in-process probing
//!
//! This simulates delivery faults like loss, duplication, reordering and
//! latency without requiring a real broker or tc/netem.

#![allow(dead_code)]

use bytes::Bytes;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Configuration for the lossy channel
#[derive(Debug, Clone)]
pub struct LossyChannelConfig {
    /// Message loss rate (0.0 - 1.0)
    pub loss_rate: f32,
    /// Base latency in milliseconds
    pub latency_ms: u64,
    /// Jitter (variance in latency) in milliseconds
    pub jitter_ms: u64,
    /// Duplicate delivery rate (0.0 - 1.0)
    pub duplicate_rate: f32,
    /// Reorder rate (0.0 - 1.0) - chance a message is held behind its successor
    pub reorder_rate: f32,
    /// Seed for the fault generator so runs are reproducible
    pub seed: u64,
}

impl Default for LossyChannelConfig {
    fn default() -> Self {
        Self {
            loss_rate: 0.0,
            latency_ms: 0,
            jitter_ms: 0,
            duplicate_rate: 0.0,
            reorder_rate: 0.0,
            seed: 0x5eed,
        }
    }
}

impl LossyChannelConfig {
    /// Create a perfect channel (no faults, no latency)
    pub fn perfect() -> Self {
        Self::default()
    }

    /// Create a typical LAN link
    pub fn lan() -> Self {
        Self {
            loss_rate: 0.001,
            latency_ms: 1,
            jitter_ms: 1,
            ..Default::default()
        }
    }

    /// Create a flaky at-least-once broker
    pub fn flaky_broker() -> Self {
        Self {
            loss_rate: 0.05,
            latency_ms: 2,
            jitter_ms: 3,
            duplicate_rate: 0.10,
            reorder_rate: 0.10,
            ..Default::default()
        }
    }

    pub fn with_loss(loss_rate: f32) -> Self {
        Self {
            loss_rate,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Statistics collected by the lossy channel
#[derive(Debug, Default)]
pub struct ChannelStats {
    pub messages_sent: AtomicU64,
    pub messages_lost: AtomicU64,
    pub messages_duplicated: AtomicU64,
    pub messages_reordered: AtomicU64,
    pub messages_delivered: AtomicU64,
    pub total_latency_ms: AtomicU64,
}

impl ChannelStats {
    pub fn get(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }

    pub fn actual_loss_rate(&self) -> f32 {
        let sent = self.messages_sent.load(Ordering::Relaxed);
        let lost = self.messages_lost.load(Ordering::Relaxed);
        if sent > 0 {
            lost as f32 / sent as f32
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Sent: {}, Lost: {} ({:.1}%), Duplicated: {}, Reordered: {}, Delivered: {}",
            self.messages_sent.load(Ordering::Relaxed),
            self.messages_lost.load(Ordering::Relaxed),
            self.actual_loss_rate() * 100.0,
            self.messages_duplicated.load(Ordering::Relaxed),
            self.messages_reordered.load(Ordering::Relaxed),
            self.messages_delivered.load(Ordering::Relaxed),
        )
    }
}

/// A simulated lossy channel
pub struct LossyChannel {
    config: LossyChannelConfig,
    stats: Arc<ChannelStats>,
    rng: Mutex<StdRng>,
    held: Mutex<Option<Bytes>>,
}

impl LossyChannel {
    pub fn new(config: LossyChannelConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            stats: Arc::new(ChannelStats::default()),
            rng: Mutex::new(rng),
            held: Mutex::new(None),
        }
    }

    pub fn stats(&self) -> Arc<ChannelStats> {
        self.stats.clone()
    }

    /// Push one message through the channel.
    ///
    /// Returns what comes out the far end as a result: nothing if the message
    /// was lost or held back, otherwise the message (twice if duplicated)
    /// followed by any message that was held behind it.
    pub async fn send(&self, data: Bytes) -> Vec<Bytes> {
        self.stats.messages_sent.fetch_add(1, Ordering::Relaxed);

        let (lost, duplicated, reorder, latency) = {
            let mut rng = self.rng.lock();
            let lost = rng.gen::<f32>() < self.config.loss_rate;
            let duplicated = rng.gen::<f32>() < self.config.duplicate_rate;
            let reorder = rng.gen::<f32>() < self.config.reorder_rate;
            let jitter = if self.config.jitter_ms > 0 {
                rng.gen_range(0..self.config.jitter_ms)
            } else {
                0
            };
            (lost, duplicated, reorder, self.config.latency_ms + jitter)
        };

        if lost {
            self.stats.messages_lost.fetch_add(1, Ordering::Relaxed);
            return Vec::new();
        }

        {
            let mut held = self.held.lock();
            if reorder && held.is_none() {
                self.stats.messages_reordered.fetch_add(1, Ordering::Relaxed);
                *held = Some(data);
                return Vec::new();
            }
        }

        if latency > 0 {
            self.stats
                .total_latency_ms
                .fetch_add(latency, Ordering::Relaxed);
            sleep(Duration::from_millis(latency)).await;
        }

        let mut out = vec![data.clone()];
        if duplicated {
            self.stats
                .messages_duplicated
                .fetch_add(1, Ordering::Relaxed);
            out.push(data);
        }
        if let Some(late) = self.held.lock().take() {
            out.push(late);
        }

        self.stats
            .messages_delivered
            .fetch_add(out.len() as u64, Ordering::Relaxed);
        out
    }

    /// Release a message still held for reordering
    pub fn flush(&self) -> Option<Bytes> {
        let late = self.held.lock().take();
        if late.is_some() {
            self.stats.messages_delivered.fetch_add(1, Ordering::Relaxed);
        }
        late
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_perfect_channel() {
        let channel = LossyChannel::new(LossyChannelConfig::perfect());
        let data = Bytes::from_static(b"hello");

        let out = channel.send(data.clone()).await;
        assert_eq!(out, vec![data]);

        let stats = channel.stats();
        assert_eq!(ChannelStats::get(&stats.messages_sent), 1);
        assert_eq!(ChannelStats::get(&stats.messages_lost), 0);
    }

    #[tokio::test]
    async fn test_total_loss_channel() {
        let channel = LossyChannel::new(LossyChannelConfig::with_loss(1.0));

        for _ in 0..10 {
            assert!(channel.send(Bytes::from_static(b"x")).await.is_empty());
        }
        assert_eq!(channel.stats().actual_loss_rate(), 1.0);
    }

    #[tokio::test]
    async fn test_reorder_swaps_neighbours() {
        let config = LossyChannelConfig {
            reorder_rate: 1.0,
            ..Default::default()
        };
        let channel = LossyChannel::new(config);

        assert!(channel.send(Bytes::from_static(b"a")).await.is_empty());
        let out = channel.send(Bytes::from_static(b"b")).await;
        assert_eq!(out, vec![Bytes::from_static(b"b"), Bytes::from_static(b"a")]);
        assert!(channel.flush().is_none());
    }

    #[tokio::test]
    async fn test_same_seed_same_faults() {
        let run = |seed| async move {
            let channel = LossyChannel::new(LossyChannelConfig::flaky_broker().with_seed(seed));
            let mut delivered = 0;
            for i in 0..200u32 {
                delivered += channel.send(Bytes::from(i.to_string())).await.len();
            }
            delivered
        };

        assert_eq!(run(11).await, run(11).await);
    }
}
