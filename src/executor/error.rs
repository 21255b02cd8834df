//! HTTP request execution error types.
//!
//! Resolution itself never fails; these errors come from sending a resolved
//! request: an unusable URL, an unreadable body file, the transport, or an
//! ordering cycle.

use crate::graph::OrderError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while executing requests of a parsed file.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Connection failures, DNS errors and other network-level issues.
    #[error("Network error: {0}")]
    Network(String),

    /// The request took longer than the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// The resolved URL could not be parsed.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Only HTTP and HTTPS are supported.
    #[error("Unsupported protocol: {0}")]
    UnsupportedProtocol(String),

    /// A `< path` body file could not be read.
    #[error("Failed to read body file {}: {source}", path.display())]
    BodyFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The transport could not build the request (bad method or header).
    #[error("Request build error: {0}")]
    Build(String),

    /// No request exists at the given index.
    #[error("No request at index {0}")]
    NoSuchRequest(usize),

    #[error(transparent)]
    Order(#[from] OrderError),
}

/// Convert reqwest errors to RequestError.
#[cfg(feature = "native")]
impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RequestError::Timeout
        } else if err.is_builder() {
            RequestError::Build(err.to_string())
        } else {
            RequestError::Network(err.to_string())
        }
    }
}
