pub mod codec;
pub mod error;
pub mod evaluator;
pub mod generator;
pub mod history;
pub mod types;

pub use codec::{decode, encode};
pub use error::{ProbeError, ProbeResult};
pub use evaluator::{evaluate, evaluate_at, evaluate_shared};
pub use generator::{EntropySource, Generator, OsEntropy, RngSource, SeededEntropy};
pub use history::{DeliveryHistory, HistoryRetention, SharedHistory};
pub use types::{QosReport, TestMessage};
