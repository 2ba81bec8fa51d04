use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// Network, HTTP status, timeout or payload decoding failure.
    #[error("{0}")]
    Request(String),
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("{0}")]
    Config(String),
}

impl SyncError {
    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn message(&self) -> String {
        match self {
            SyncError::Request(msg) => format!("request failed: {msg}"),
            SyncError::Io { path, source } => format!("storage error on {path}: {source}"),
            SyncError::Config(msg) => format!("configuration error: {msg}"),
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SyncError::Request(format!("timed out: {err}"))
        } else {
            SyncError::Request(err.to_string())
        }
    }
}
