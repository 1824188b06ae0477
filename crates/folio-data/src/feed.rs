//! Blog feed loader
//!
//! Reads a JSON-converted RSS feed, keeps the first `max` items and caches
//! them in the session under `"<rssJson>|<max>"`.

use crate::error::{FetchError, FetchResult};
use crate::fetch::Fetcher;
use folio_cache::TtlCache;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Default number of feed items shown
pub const DEFAULT_FEED_ITEMS: usize = 6;

/// Advisory shown when the feed cannot be loaded
pub const FEED_FAILURE_MESSAGE: &str = "Failed to load blog feed.";

/// Feed settings from the page payload's `blog` key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeedConfig {
    /// Whether the blog section is shown
    pub enabled: bool,
    /// URL of the JSON feed
    pub rss_json: String,
    /// Maximum items to keep (0 means the default)
    pub max: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rss_json: String::new(),
            max: DEFAULT_FEED_ITEMS,
        }
    }
}

impl FeedConfig {
    /// Read the `blog` key of a page payload
    #[must_use]
    pub fn from_payload(payload: &Value) -> Option<Self> {
        payload
            .get("blog")
            .and_then(|blog| serde_json::from_value(blog.clone()).ok())
    }

    /// Whether there is anything to fetch
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.enabled && !self.rss_json.is_empty()
    }

    /// Effective item limit
    #[inline]
    #[must_use]
    pub fn limit(&self) -> usize {
        if self.max == 0 {
            DEFAULT_FEED_ITEMS
        } else {
            self.max
        }
    }

    /// Session cache key
    #[inline]
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!("{}|{}", self.rss_json, self.max)
    }
}

/// One feed entry
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeedItem {
    /// Post title
    #[serde(deserialize_with = "null_as_empty")]
    pub title: String,
    /// Post URL
    #[serde(deserialize_with = "null_as_empty")]
    pub link: String,
    /// Post description, possibly HTML
    #[serde(deserialize_with = "null_as_empty")]
    pub description: String,
    /// Publication date as given by the feed
    #[serde(deserialize_with = "null_as_empty")]
    pub pub_date: String,
}

/// Feeds emit `null` for absent fields; treat it like a missing key
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn tag_pattern() -> Option<&'static Regex> {
    static TAGS: OnceLock<Option<Regex>> = OnceLock::new();
    TAGS.get_or_init(|| Regex::new(r"<[^>]+>").ok()).as_ref()
}

impl FeedItem {
    /// Description with HTML tags stripped
    #[must_use]
    pub fn summary(&self) -> String {
        match tag_pattern() {
            Some(tags) => tags.replace_all(&self.description, "").into_owned(),
            None => self.description.clone(),
        }
    }
}

/// Result of a feed load
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedState {
    /// Feed disabled or unconfigured
    Disabled,
    /// Items available (possibly none)
    Ready(Vec<FeedItem>),
    /// Load failed; the section is hidden
    Failed(String),
}

impl FeedState {
    /// Items worth rendering, if any
    #[must_use]
    pub fn visible_items(&self) -> Option<&[FeedItem]> {
        match self {
            Self::Ready(items) if !items.is_empty() => Some(items),
            _ => None,
        }
    }
}

/// Loads and caches the blog feed
#[derive(Clone)]
pub struct FeedLoader {
    fetcher: Arc<dyn Fetcher>,
    cache: TtlCache,
}

impl FeedLoader {
    /// Create loader; `cache` should use [`PayloadField::Items`](folio_cache::PayloadField::Items)
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetcher>, cache: TtlCache) -> Self {
        Self { fetcher, cache }
    }

    /// Items served from the session cache, if still valid
    #[must_use]
    pub fn cached(&self, config: &FeedConfig) -> Option<Vec<FeedItem>> {
        if !config.is_active() {
            return None;
        }
        let items = self.cache.get(&config.cache_key())?;
        Some(parse_items(items))
    }

    /// Fetch the feed and refresh the cache
    pub async fn load(&self, config: &FeedConfig) -> FeedState {
        if !config.is_active() {
            return FeedState::Disabled;
        }

        match self.fetch_items(config).await {
            Ok(items) => {
                let raw = Value::Array(items);
                self.cache.put(&config.cache_key(), &raw);
                FeedState::Ready(parse_items(raw))
            }
            Err(err) => {
                tracing::warn!(url = %config.rss_json, error = %err, "feed fetch failed");
                FeedState::Failed(FEED_FAILURE_MESSAGE.to_string())
            }
        }
    }

    async fn fetch_items(&self, config: &FeedConfig) -> FetchResult<Vec<Value>> {
        let response = self.fetcher.get(&config.rss_json).await?;
        if !response.is_success() {
            return Err(FetchError::Status(response.status));
        }
        let body = response.body.trim_start_matches('\u{feff}').trim();
        let mut document: Value = serde_json::from_str(body)?;

        let items = match document.get_mut("items").map(Value::take) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        };
        Ok(items.into_iter().take(config.limit()).collect())
    }
}

fn parse_items(raw: Value) -> Vec<FeedItem> {
    match raw {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    }
}

impl fmt::Debug for FeedLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedLoader")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
