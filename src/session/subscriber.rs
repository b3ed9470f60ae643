use crate::probe::error::ProbeResult;
use crate::session::session::ProbeSession;
use crate::session::types::{ProbeConfig, SessionSummary};
use futures::{Stream, StreamExt};
use tracing::info;

/// Feeds received messages into a [`ProbeSession`] until it is complete.
pub struct ProbeSubscriber {
    session: ProbeSession,
}

impl ProbeSubscriber {
    pub fn new(config: ProbeConfig) -> ProbeResult<Self> {
        Ok(Self {
            session: ProbeSession::new(config)?,
        })
    }

    pub fn session(&self) -> &ProbeSession {
        &self.session
    }

    /// Consume raw messages until `count` distinct sequences have arrived or the stream ends.
    ///
    /// Undecodable messages are counted and skipped.
    pub async fn drain<St>(&mut self, mut stream: St) -> SessionSummary
    where
        St: Stream + Unpin,
        St::Item: AsRef<[u8]>,
    {
        while !self.session.is_complete() {
            match stream.next().await {
                Some(data) => {
                    // failures are already counted and logged by the session
                    let _ = self.session.receive_bytes(data.as_ref());
                }
                None => {
                    info!(
                        "Session {}: stream ended before completion",
                        self.session.session_id()
                    );
                    break;
                }
            }
        }

        if self.session.is_complete() {
            info!("Session {} terminating", self.session.session_id());
        }
        self.session.summary()
    }

    pub fn finish(self) -> SessionSummary {
        self.session.finish()
    }
}
