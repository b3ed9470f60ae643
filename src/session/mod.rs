pub mod publisher;
pub mod session;
pub mod subscriber;
pub mod types;

pub use publisher::ProbePublisher;
pub use session::ProbeSession;
pub use subscriber::ProbeSubscriber;
pub use types::{ProbeConfig, PublishStats, SeenSequences, SessionStats, SessionSummary};
