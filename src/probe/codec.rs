//! JSON wire form of [`TestMessage`].
//!
//! Messages travel as a device-shadow style envelope:
//! `{"State":{"Reported":{"N":<sequence>,"S":"<hex payload>","T":"<RFC 3339>"}}}`

use crate::probe::error::ProbeResult;
use crate::probe::types::TestMessage;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireEnvelope {
    #[serde(rename = "State")]
    state: WireState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireState {
    #[serde(rename = "Reported")]
    reported: WireReported,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireReported {
    #[serde(rename = "N")]
    sequence: i64,
    #[serde(rename = "S", default)]
    payload: String,
    #[serde(rename = "T")]
    origin_time: DateTime<Utc>,
}

impl From<TestMessage> for WireEnvelope {
    fn from(msg: TestMessage) -> Self {
        Self {
            state: WireState {
                reported: WireReported {
                    sequence: msg.sequence,
                    payload: msg.payload,
                    origin_time: msg.origin_time,
                },
            },
        }
    }
}

impl From<WireEnvelope> for TestMessage {
    fn from(wire: WireEnvelope) -> Self {
        let r = wire.state.reported;
        TestMessage::new(r.sequence, r.payload, r.origin_time)
    }
}

/// Serialize a message for the transport under test
pub fn encode(msg: &TestMessage) -> ProbeResult<Bytes> {
    Ok(Bytes::from(serde_json::to_vec(msg)?))
}

/// Parse a received message; the result carries no delivery history
pub fn decode(data: &[u8]) -> ProbeResult<TestMessage> {
    Ok(serde_json::from_slice(data)?)
}
