//! Error types for data acquisition
//!
//! Every failure here degrades to "show what we have". The [`ErrorKind`]
//! classification decides whether a failure is surfaced as an advisory or
//! dropped entirely.

/// Failure classes for acquisition errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Fetch failure or timeout; last payload is retained
    TransientNetwork,
    /// Response was not the JSON resource; handled like a network failure
    Validation,
    /// Request was superseded; never surfaced
    Cancellation,
}

/// Errors fetching or validating a JSON resource
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport-level failure
    #[error("network error: {0}")]
    Network(String),

    /// Request exceeded the client timeout
    #[error("request timed out")]
    Timeout,

    /// Non-success HTTP status
    #[error("HTTP {0}")]
    Status(u16),

    /// Content type or body shape says this is not JSON (usually an HTML fallback page)
    #[error("Not JSON (got HTML)")]
    NotJson,

    /// Body claimed to be JSON but did not parse
    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// JSON parsed but was not an object
    #[error("expected a JSON object, got {0}")]
    NotObject(&'static str),

    /// Request was aborted before completion
    #[error("request cancelled")]
    Cancelled,
}

impl FetchError {
    /// Classify this failure
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) | Self::Timeout => ErrorKind::TransientNetwork,
            Self::Status(_) | Self::NotJson | Self::Parse(_) | Self::NotObject(_) => {
                ErrorKind::Validation
            }
            Self::Cancelled => ErrorKind::Cancellation,
        }
    }

    /// Whether this failure must be suppressed
    #[inline]
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        self.kind() == ErrorKind::Cancellation
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Result type alias for fetch operations
pub type FetchResult<T> = Result<T, FetchError>;
