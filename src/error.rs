//! Failure taxonomy for upstream calls.
//!
//! Every variant is recovered locally: the fetcher turns it into an empty
//! item list and the resolver into `None`.  The type exists so that logs and
//! the per-source status report can say *why* a source contributed nothing.

use std::time::Duration;

use thiserror::Error;

/// Why an upstream call produced no usable data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection, TLS, or body-read failure.
    #[error("network error: {0}")]
    Network(String),

    /// The call did not finish within its time budget.
    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The upstream answered with a non-success HTTP status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// The body was not JSON, or not the shape we expect.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// An alias could not be mapped to a stable channel id.
    #[error("unresolvable source: {0}")]
    UnresolvableSource(String),
}

impl FetchError {
    /// Whether a second attempt has a reasonable chance of succeeding.
    ///
    /// Network hiccups, timeouts and server-side errors are transient; a 4xx
    /// or a payload we cannot parse will fail the same way again.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Network(_) | FetchError::Timeout(_) => true,
            FetchError::Status(code) => *code >= 500,
            FetchError::MalformedPayload(_) | FetchError::UnresolvableSource(_) => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            FetchError::MalformedPayload(e.to_string())
        } else if let Some(status) = e.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::MalformedPayload(e.to_string())
    }
}
