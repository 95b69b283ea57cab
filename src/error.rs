//! Error types for loading, extracting, and crawling
//!
//! Fetch failures are classified as transient or permanent so the retry
//! loop can fail fast on errors that will not go away.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for library operations
pub type DeclutterResult<T> = Result<T, DeclutterError>;

/// Errors raised while fetching a remote resource
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// The request did not complete in time
    #[error("Request timed out for {url}")]
    Timeout { url: String },

    /// Connection, DNS, or TLS failure
    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    /// The body could not be read
    #[error("Failed to read response body from {url}: {message}")]
    Body { url: String, message: String },
}

impl FetchError {
    /// Classify a reqwest error for `url`
    #[must_use]
    pub fn from_reqwest(url: &str, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout {
                url: url.to_string(),
            };
        }
        if let Some(status) = err.status() {
            return Self::Status {
                url: url.to_string(),
                status: status.as_u16(),
            };
        }
        if err.is_body() || err.is_decode() {
            return Self::Body {
                url: url.to_string(),
                message: err.to_string(),
            };
        }
        Self::Network {
            url: url.to_string(),
            message: err.to_string(),
        }
    }

    /// Whether a later attempt may succeed
    ///
    /// Timeouts, connection failures, truncated bodies, and HTTP 408, 429,
    /// and 5xx are transient. Every other status is permanent.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Status { status, .. } => {
                matches!(status, 408 | 429) || (500..600).contains(status)
            }
            Self::Timeout { .. } | Self::Network { .. } | Self::Body { .. } => true,
        }
    }

    /// HTTP status, when the failure came from one
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Top-level error type
#[derive(Debug, Error)]
pub enum DeclutterError {
    /// The source argument is neither a readable path nor a valid URL
    #[error("Invalid source '{input}': {reason}")]
    InvalidSource { input: String, reason: String },

    /// Reading a local file failed
    #[error("Failed to read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Fetching a remote resource failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The extraction library rejected the document
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// HTML to markdown conversion failed
    #[error("Markdown conversion failed: {0}")]
    Markdown(String),

    /// A sitemap could not be understood
    #[error("Invalid sitemap {url}: {reason}")]
    Sitemap { url: String, reason: String },

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// An unknown property was requested from a parse result
    #[error("Unknown property '{name}' (expected one of: {valid})")]
    UnknownProperty { name: String, valid: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DeclutterError {
    /// Check if the error is transient and the operation should be retried
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Fetch(err) if err.is_transient())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> FetchError {
        FetchError::Status {
            url: "https://example.com".to_string(),
            status: code,
        }
    }

    #[test]
    fn server_errors_and_throttling_are_transient() {
        for code in [408, 429, 500, 502, 503, 504] {
            assert!(status(code).is_transient(), "{code} should be transient");
        }
    }

    #[test]
    fn client_errors_are_permanent() {
        for code in [400, 401, 403, 404, 410] {
            assert!(!status(code).is_transient(), "{code} should be permanent");
        }
    }

    #[test]
    fn only_fetch_errors_propagate_transience() {
        let err = DeclutterError::from(FetchError::Timeout {
            url: "https://example.com".to_string(),
        });
        assert!(err.is_transient());

        let err = DeclutterError::Extraction("no content".to_string());
        assert!(!err.is_transient());
    }
}
