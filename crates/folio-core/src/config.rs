//! Page configuration
//!
//! Every policy constant of the page lives here with its production default.
//! Values come from defaults, then an optional TOML file, then the
//! `FOLIO_BASE_PATH` / `FOLIO_DATA_URL` environment variables.

use crate::error::{FolioError, FolioResult};
use folio_cache::{Clock, PayloadField, SessionStorage, TtlCache};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Environment variable overriding [`PageConfig::base_path`]
pub const ENV_BASE_PATH: &str = "FOLIO_BASE_PATH";

/// Environment variable overriding [`PageConfig::data_url`]
pub const ENV_DATA_URL: &str = "FOLIO_DATA_URL";

/// Path of the content document relative to the base path
pub const DATA_DOCUMENT_PATH: &str = "/data/data.json";

/// Page configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Deployment base path the page is served under
    pub base_path: String,
    /// Explicit content document URL; derived from `base_path` when unset
    pub data_url: Option<String>,
    /// Session cache prefix for the content document
    pub cache_prefix: String,
    /// Content document TTL in milliseconds
    pub data_ttl_ms: u64,
    /// Session cache prefix for the blog feed
    pub feed_cache_prefix: String,
    /// Blog feed TTL in milliseconds
    pub feed_ttl_ms: u64,
    /// Minimum boot delay in milliseconds
    pub boot_delay_ms: u64,
    /// How long a deep link waits for its target, in milliseconds
    pub deep_link_timeout_ms: u64,
    /// Pivot position as a fraction of the viewport height
    pub pivot_fraction: f64,
    /// Minimum loader duration in milliseconds, forwarded to the loader
    pub loader_min_duration_ms: u64,
    /// Network timeout for the content document, in milliseconds
    pub fetch_timeout_ms: u64,
    /// Reflect the active section into the URL fragment
    pub sync_fragment: bool,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            base_path: "/".to_string(),
            data_url: None,
            cache_prefix: "ty-app-data".to_string(),
            data_ttl_ms: 5 * 60 * 1000,
            feed_cache_prefix: "ty-blog-feed".to_string(),
            feed_ttl_ms: 30 * 60 * 1000,
            boot_delay_ms: 800,
            deep_link_timeout_ms: 5_000,
            pivot_fraction: 0.35,
            loader_min_duration_ms: 2_000,
            fetch_timeout_ms: 10_000,
            sync_fragment: true,
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl PageConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With base path
    #[inline]
    #[must_use]
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// With explicit content document URL
    #[inline]
    #[must_use]
    pub fn with_data_url(mut self, url: impl Into<String>) -> Self {
        self.data_url = Some(url.into());
        self
    }

    /// With boot delay
    #[inline]
    #[must_use]
    pub fn with_boot_delay(mut self, delay: Duration) -> Self {
        self.boot_delay_ms = millis(delay);
        self
    }

    /// With deep-link timeout
    #[inline]
    #[must_use]
    pub fn with_deep_link_timeout(mut self, timeout: Duration) -> Self {
        self.deep_link_timeout_ms = millis(timeout);
        self
    }

    /// With pivot fraction
    #[inline]
    #[must_use]
    pub fn with_pivot_fraction(mut self, fraction: f64) -> Self {
        self.pivot_fraction = fraction;
        self
    }

    /// With fragment reflection on or off
    #[inline]
    #[must_use]
    pub fn with_fragment_sync(mut self, enabled: bool) -> Self {
        self.sync_fragment = enabled;
        self
    }

    /// Content document URL
    #[must_use]
    pub fn data_url(&self) -> String {
        match &self.data_url {
            Some(url) => url.clone(),
            None => format!(
                "{}{DATA_DOCUMENT_PATH}",
                self.base_path.trim_end_matches('/')
            ),
        }
    }

    /// Content document TTL
    #[inline]
    #[must_use]
    pub fn data_ttl(&self) -> Duration {
        Duration::from_millis(self.data_ttl_ms)
    }

    /// Blog feed TTL
    #[inline]
    #[must_use]
    pub fn feed_ttl(&self) -> Duration {
        Duration::from_millis(self.feed_ttl_ms)
    }

    /// Boot delay
    #[inline]
    #[must_use]
    pub fn boot_delay(&self) -> Duration {
        Duration::from_millis(self.boot_delay_ms)
    }

    /// Deep-link timeout
    #[inline]
    #[must_use]
    pub fn deep_link_timeout(&self) -> Duration {
        Duration::from_millis(self.deep_link_timeout_ms)
    }

    /// Minimum loader duration
    #[inline]
    #[must_use]
    pub fn loader_min_duration(&self) -> Duration {
        Duration::from_millis(self.loader_min_duration_ms)
    }

    /// Content document fetch timeout
    #[inline]
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Session cache for the content document
    #[must_use]
    pub fn data_cache(&self, storage: Arc<dyn SessionStorage>, clock: Arc<dyn Clock>) -> TtlCache {
        TtlCache::new(
            storage,
            clock,
            self.cache_prefix.clone(),
            self.data_ttl(),
            PayloadField::Data,
        )
    }

    /// Session cache for the blog feed
    #[must_use]
    pub fn feed_cache(&self, storage: Arc<dyn SessionStorage>, clock: Arc<dyn Clock>) -> TtlCache {
        TtlCache::new(
            storage,
            clock,
            self.feed_cache_prefix.clone(),
            self.feed_ttl(),
            PayloadField::Items,
        )
    }

    /// Parse and validate TOML
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::Toml`] for malformed input and
    /// [`FolioError::Config`] for out-of-range values.
    pub fn from_toml_str(source: &str) -> FolioResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file, then apply environment overrides
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, parsed or validated.
    pub fn load(path: impl AsRef<Path>) -> FolioResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| FolioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?.apply_env();
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded page config");
        Ok(config)
    }

    /// Defaults plus environment overrides
    ///
    /// # Errors
    ///
    /// Fails if an override produces an invalid configuration.
    pub fn from_env() -> FolioResult<Self> {
        let config = Self::default().apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply `FOLIO_BASE_PATH` and `FOLIO_DATA_URL`
    #[must_use]
    pub fn apply_env(self) -> Self {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup`; empty values are ignored
    #[must_use]
    pub fn apply_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        if let Some(base_path) = non_empty(ENV_BASE_PATH) {
            self.base_path = base_path;
        }
        if let Some(url) = non_empty(ENV_DATA_URL) {
            self.data_url = Some(url);
        }
        self
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::Config`] naming the first offending field.
    pub fn validate(&self) -> FolioResult<()> {
        if !self.pivot_fraction.is_finite() || !(0.0..=1.0).contains(&self.pivot_fraction) {
            return Err(FolioError::config(format!(
                "pivot_fraction must be within 0..=1, got {}",
                self.pivot_fraction
            )));
        }
        if self.data_ttl_ms == 0 || self.feed_ttl_ms == 0 {
            return Err(FolioError::config("cache TTLs must be positive"));
        }
        if self.cache_prefix.is_empty() || self.feed_cache_prefix.is_empty() {
            return Err(FolioError::config("cache prefixes must not be empty"));
        }
        if self.fetch_timeout_ms == 0 {
            return Err(FolioError::config("fetch_timeout_ms must be positive"));
        }
        if self.data_url.as_deref().is_some_and(str::is_empty) {
            return Err(FolioError::config("data_url must not be empty when set"));
        }
        Ok(())
    }
}
