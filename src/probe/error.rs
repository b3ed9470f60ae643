use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Random source error: {0}")]
    RandomSource(String),

    #[error("Short random read: requested {requested} bytes, got {read}")]
    ShortRandomRead { requested: usize, read: usize },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid probe configuration: {0}")]
    InvalidConfig(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl ProbeError {
    /// True for both ways the entropy source can fail a generation call
    pub fn is_random_source_error(&self) -> bool {
        matches!(
            self,
            ProbeError::RandomSource(_) | ProbeError::ShortRandomRead { .. }
        )
    }
}

impl From<serde_json::Error> for ProbeError {
    fn from(err: serde_json::Error) -> Self {
        ProbeError::Serialization(err.to_string())
    }
}

pub type ProbeResult<T> = Result<T, ProbeError>;
