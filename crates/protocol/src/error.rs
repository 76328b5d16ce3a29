use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProtocolError>;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Malformed violation key: {0}")]
    MalformedKey(String),

    #[error("Unknown violation cause: {0}")]
    UnknownCause(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
