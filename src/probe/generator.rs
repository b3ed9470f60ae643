use crate::probe::error::{ProbeError, ProbeResult};
use crate::probe::types::TestMessage;
use chrono::Utc;
use parking_lot::Mutex;
use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};
use std::io;

/// Source of random payload bytes.
///
/// Returns the number of bytes written into `buf`; anything short of
/// `buf.len()` fails the generation call that asked for it.
pub trait EntropySource: Send {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Adapts any `rand` generator into an [`EntropySource`]
#[derive(Debug, Clone, Default)]
pub struct RngSource<R>(R);

pub type OsEntropy = RngSource<OsRng>;

pub type SeededEntropy = RngSource<StdRng>;

impl<R: RngCore> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self(rng)
    }
}

impl SeededEntropy {
    /// Deterministic source for reproducible payloads
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl<R: RngCore + Send> EntropySource for RngSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.try_fill_bytes(buf).map_err(io::Error::other)?;
        Ok(buf.len())
    }
}

/// Produces test messages with hex payloads drawn from an injected entropy source.
///
/// The source sits behind a mutex so a single generator can be shared by
/// several producers.
pub struct Generator<S = OsEntropy> {
    source: Mutex<S>,
}

impl<S: EntropySource> Generator<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Mutex::new(source),
        }
    }

    /// Build a message with the given sequence and `payload_size` random bytes
    pub fn generate(&self, sequence: i64, payload_size: usize) -> ProbeResult<TestMessage> {
        let payload = self.random_hex(payload_size)?;
        // Stamp after the payload exists so latency excludes generation cost
        let origin_time = Utc::now();
        Ok(TestMessage::new(sequence, payload, origin_time))
    }

    fn random_hex(&self, size: usize) -> ProbeResult<String> {
        let mut buf = vec![0u8; size];
        let read = self
            .source
            .lock()
            .read(&mut buf)
            .map_err(|e| ProbeError::RandomSource(e.to_string()))?;

        if read != size {
            return Err(ProbeError::ShortRandomRead {
                requested: size,
                read,
            });
        }

        Ok(hex::encode(buf))
    }
}

impl Default for Generator<OsEntropy> {
    fn default() -> Self {
        Self::new(OsEntropy::default())
    }
}
