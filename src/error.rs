use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failure reading or writing one of the JSON stores on disk.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize {}: {source}", .path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A single backend exchange failed.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{provider} request failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} API error ({status}): {message}")]
    Status {
        provider: &'static str,
        status: u16,
        message: String,
    },
    #[error("failed to decode {provider} response: {source}")]
    Decode {
        provider: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("no response choices returned from {provider}")]
    EmptyReply { provider: &'static str },
    #[error("request timed out after {:.0}s", .0.as_secs_f64())]
    Timeout(Duration),
    #[error("{0}")]
    Other(String),
}

impl BackendError {
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

/// The reply contained no usable `KEY: "value"` lines.
#[derive(Debug, Error)]
#[error("failed to parse any translations from response: {raw}")]
pub struct ParseError {
    pub raw: String,
}

/// Why one translation attempt failed. Both variants are retried.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Debug, Error)]
#[error("translation failed after {attempts} attempts: {last}")]
pub struct RetryExhausted {
    pub attempts: u32,
    #[source]
    pub last: AttemptError,
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("reading messages: {0}")]
    Messages(#[source] StoreError),
    #[error("syncing locale {locale}: translating batch {batch}: {source}")]
    Locale {
        locale: String,
        batch: usize,
        #[source]
        source: RetryExhausted,
    },
    #[error("syncing locale {locale}: {source}")]
    Persist {
        locale: String,
        #[source]
        source: StoreError,
    },
}

impl SyncError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}
