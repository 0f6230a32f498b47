//! Error types for calls that never complete and for configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to complete a backend call at all. Application-level failures travel inside an
/// [`Envelope`](crate::Envelope) instead.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The base url and endpoint path did not join into a url.
    #[error("invalid endpoint url {url}: {reason}")]
    InvalidUrl {
        /// Offending url text.
        url: String,
        /// Parser message.
        reason: String,
    },
    /// The request body could not be serialized.
    #[error("encoding request body: {0}")]
    Encode(#[from] serde_json::Error),
    /// Connection, timeout or body read failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Failure to load or validate client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("reading config {path}: {source}")]
    Read {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The config file is not valid TOML for [`ClientConfig`](crate::ClientConfig).
    #[error("parsing config {path}: {source}")]
    Parse {
        /// File that was parsed.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
    /// `api_url` is not an absolute http or https url.
    #[error("invalid api url {url}: {reason}")]
    InvalidApiUrl {
        /// Configured value.
        url: String,
        /// Why it was refused.
        reason: String,
    },
    /// A session rule name other than `unauthorized` or `not-ok`.
    #[error("unknown session rule `{0}` (expected `unauthorized` or `not-ok`)")]
    UnknownSessionRule(String),
    /// A request timeout that is not a whole number of seconds.
    #[error("invalid request timeout `{0}`")]
    InvalidTimeout(String),
}
