//! In-process channel simulation for probing without a real broker
//!
//! Provides a seeded lossy channel that drops, duplicates, delays and
//! reorders encoded test messages.

pub mod lossy_channel;

pub use lossy_channel::{LossyChannel, LossyChannelConfig};

#[allow(unused_imports)]
pub use lossy_channel::ChannelStats;
