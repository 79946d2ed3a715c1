use thiserror::Error;

/// Session record store errors.
#[derive(Debug, Error)]
pub enum SessionStoreError {
    /// A live record already exists (for create operations).
    #[error("session already exists")]
    AlreadyExists,

    /// Backend unreachable or failing.
    #[error("session store unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for SessionStoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Long-term preference store errors.
#[derive(Debug, Error)]
pub enum PreferenceStoreError {
    #[error("preference store unavailable: {0}")]
    Unavailable(String),
}

/// Engine checkpoint store errors.
#[derive(Debug, Error)]
pub enum CheckpointStoreError {
    #[error("checkpoint store unavailable: {0}")]
    Unavailable(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CheckpointStoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
