//! Error types for the scanner and its collaborators

use thiserror::Error;

/// Failure of a single HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// Errors raised by [`crate::Scanner::scan_domain`].
///
/// Network trouble never surfaces here; it is folded into the result.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid domain: {0:?}")]
    InvalidDomain(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Failure reported by an [`crate::persist::AuditSink`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    #[error("datastore rejected {table} rows: {message}")]
    Rejected { table: String, message: String },

    #[error("datastore unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the client-driven triggers in [`crate::batch`]
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("client {0} not found")]
    ClientNotFound(String),

    #[error("client store failed: {0}")]
    Store(String),

    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Errors loading a [`crate::ScannerConfig`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
