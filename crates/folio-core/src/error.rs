//! Error types for Folio Core
//!
//! Covers configuration loading and wiring of the data layer. Runtime
//! failures inside the page (fetch advisories, font probes, cache writes)
//! never surface here; they are logged and degrade gracefully.

use folio_data::FetchError;
use std::path::PathBuf;

/// Main page error type
#[derive(Debug, thiserror::Error)]
pub enum FolioError {
    /// Invalid configuration value
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed TOML configuration
    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    /// Config file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Fetcher construction failed
    #[error("fetch setup failed: {0}")]
    Fetch(#[from] FetchError),
}

impl FolioError {
    /// Create a configuration error
    #[inline]
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Best-effort font readiness failure; always swallowed by the boot timer
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("font readiness failed: {0}")]
pub struct FontError(pub String);

/// Result alias for page operations
pub type FolioResult<T> = Result<T, FolioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            FolioError::config("pivot_fraction out of range").to_string(),
            "configuration error: pivot_fraction out of range"
        );
        assert_eq!(
            FontError("no font api".to_string()).to_string(),
            "font readiness failed: no font api"
        );
    }

    #[test]
    fn io_error_keeps_source() {
        let err = FolioError::Io {
            path: PathBuf::from("folio.toml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().starts_with("failed to read folio.toml"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
