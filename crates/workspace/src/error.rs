use thiserror::Error;

pub type Result<T> = std::result::Result<T, WorkspaceError>;

#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid workspace glob '{pattern}': {message}")]
    InvalidGlob { pattern: String, message: String },

    #[error("Invalid repository path: {0}")]
    InvalidPath(String),

    #[error("git {command} failed: {message}")]
    Git { command: String, message: String },

    #[error("Unknown revision: {0}")]
    UnknownRevision(String),

    #[error("{0}")]
    Other(String),
}

impl WorkspaceError {
    pub(crate) fn git(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Git {
            command: command.into(),
            message: message.into(),
        }
    }
}
