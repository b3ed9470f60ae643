use crate::metrics::recorder;
use crate::probe::codec::encode;
use crate::probe::error::ProbeResult;
use crate::probe::generator::{EntropySource, Generator, OsEntropy};
use crate::session::types::{ProbeConfig, PublishStats};
use bytes::Bytes;
use std::fmt::Display;
use std::future::Future;
use std::ops::Range;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Sending end of a probing session.
///
/// Generates `count` consecutive test messages and hands each encoded message
/// to a caller-supplied send function. Nothing is retried.
pub struct ProbePublisher<S = OsEntropy> {
    publisher_id: String,
    config: ProbeConfig,
    generator: Generator<S>,
}

impl ProbePublisher<OsEntropy> {
    pub fn new(config: ProbeConfig) -> ProbeResult<Self> {
        Self::with_generator(config, Generator::default())
    }
}

impl<S: EntropySource> ProbePublisher<S> {
    pub fn with_generator(config: ProbeConfig, generator: Generator<S>) -> ProbeResult<Self> {
        config.validate()?;
        Ok(Self {
            publisher_id: Uuid::new_v4().to_string(),
            config,
            generator,
        })
    }

    pub fn publisher_id(&self) -> &str {
        &self.publisher_id
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Sequence numbers this publisher emits, in order
    pub fn sequences(&self) -> Range<i64> {
        self.config.sequences()
    }

    /// Generate, encode and send every message, pausing `interval_ms` between them
    pub async fn run<F, Fut, E>(&self, mut send: F) -> PublishStats
    where
        F: FnMut(Bytes) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
    {
        let mut stats = PublishStats::default();
        let interval = self.config.interval();
        let last = self.sequences().end.saturating_sub(1);

        info!(
            "Publisher {} sending {} test messages ({} byte payloads)",
            self.publisher_id, self.config.count, self.config.payload_size
        );

        for sequence in self.sequences() {
            match self.build(sequence) {
                Ok(data) => {
                    stats.generated += 1;
                    recorder::record_message_generated(
                        &self.publisher_id,
                        self.config.payload_size,
                    );
                    debug!("Publishing test message {}", sequence);

                    match send(data).await {
                        Ok(()) => stats.sent += 1,
                        Err(e) => {
                            stats.send_failures += 1;
                            recorder::record_send_failed(&self.publisher_id);
                            warn!("Failed to send test message {}: {}", sequence, e);
                        }
                    }
                }
                Err(e) => {
                    stats.generation_failures += 1;
                    recorder::record_generation_failed(&self.publisher_id);
                    warn!("Skipping test message {}: {}", sequence, e);
                }
            }

            if !interval.is_zero() && sequence != last {
                sleep(interval).await;
            }
        }

        info!(
            "Publisher {} done: {} sent, {} send failures, {} generation failures",
            self.publisher_id, stats.sent, stats.send_failures, stats.generation_failures
        );
        stats
    }

    fn build(&self, sequence: i64) -> ProbeResult<Bytes> {
        let msg = self.generator.generate(sequence, self.config.payload_size)?;
        encode(&msg)
    }
}
