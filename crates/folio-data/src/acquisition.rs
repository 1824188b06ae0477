//! Data acquisition with stale-serve-then-revalidate
//!
//! On activation the TTL cache is read synchronously. A valid entry is served
//! at once and the network fetch then runs in the background without raising
//! `loading`. Without a cache hit, `loading` stays up until the fetch settles.
//!
//! Every load captures a generation number when it is issued. Activation,
//! reload and unmount bump the generation, and a load only commits if its
//! generation is still current. The check and the commit happen under one
//! lock, so a superseded fetch can never overwrite newer state.

use crate::fetch::{decode_json_object, Fetcher};
use crate::latch::Latch;
use folio_cache::TtlCache;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};

/// Observable acquisition state
#[derive(Debug, Clone, PartialEq)]
pub struct DataSnapshot {
    /// Resource URL currently targeted
    pub url: String,
    /// Last good payload; the empty object until something arrives
    pub payload: Value,
    /// Whether a foreground load is in flight
    pub loading: bool,
    /// Advisory from the most recent failed attempt
    pub error: Option<String>,
    /// Whether `payload` came from the session cache
    pub from_cache: bool,
}

impl DataSnapshot {
    /// Initial state for `url`: empty payload, loading
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            payload: Value::Object(Map::new()),
            loading: true,
            error: None,
            from_cache: false,
        }
    }

    /// Whether the payload is a non-empty object
    #[inline]
    #[must_use]
    pub fn has_data(&self) -> bool {
        self.payload.as_object().is_some_and(|m| !m.is_empty())
    }
}

/// Options for a single load attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadOptions {
    /// Leave `loading` untouched (background revalidation)
    pub skip_loading_state: bool,
}

struct Inner {
    fetcher: Arc<dyn Fetcher>,
    cache: TtlCache,
    generation: Mutex<u64>,
    state: watch::Sender<DataSnapshot>,
    inflight: Mutex<Option<AbortHandle>>,
}

impl Inner {
    /// Apply `update` if `generation` is still current
    fn commit(&self, generation: u64, update: impl FnOnce(&mut DataSnapshot)) -> bool {
        let current = self.generation.lock();
        if *current != generation {
            return false;
        }
        self.state.send_modify(update);
        true
    }

    async fn run(self: Arc<Self>, generation: u64, url: String, options: LoadOptions) {
        self.commit(generation, |s| {
            if !options.skip_loading_state {
                s.loading = true;
            }
            s.error = None;
        });

        let outcome = match self.fetcher.get(&url).await {
            Ok(response) => decode_json_object(&response),
            Err(err) => Err(err),
        };

        match outcome {
            Ok(payload) => {
                self.cache.put(&url, &payload);
                let committed = self.commit(generation, |s| {
                    s.payload = payload;
                    s.loading = false;
                    s.error = None;
                    s.from_cache = false;
                });
                if committed {
                    tracing::debug!(url = %url, generation, "payload refreshed");
                } else {
                    tracing::debug!(url = %url, generation, "discarding superseded payload");
                }
            }
            Err(err) if err.is_cancellation() => {
                tracing::debug!(url = %url, generation, "load cancelled");
                self.commit(generation, |s| s.loading = false);
            }
            Err(err) => {
                tracing::warn!(url = %url, generation, error = %err, "data fetch failed; keeping last payload");
                self.commit(generation, |s| {
                    s.error = Some(err.to_string());
                    s.loading = false;
                });
            }
        }
    }
}

/// Fetches, validates and caches one JSON resource
///
/// Clones share state. Methods that start a load spawn onto the current tokio
/// runtime and return the task handle.
#[derive(Clone)]
pub struct DataAcquisition {
    inner: Arc<Inner>,
}

impl DataAcquisition {
    /// Create acquisition for `url`; nothing is loaded until [`activate`](Self::activate)
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetcher>, cache: TtlCache, url: impl Into<String>) -> Self {
        let (state, _) = watch::channel(DataSnapshot::new(url));
        Self {
            inner: Arc::new(Inner {
                fetcher,
                cache,
                generation: Mutex::new(0),
                state,
                inflight: Mutex::new(None),
            }),
        }
    }

    /// Target `url`: hydrate from cache, then fetch
    ///
    /// Supersedes any in-flight load. Call on mount and whenever the URL
    /// changes.
    pub fn activate(&self, url: impl Into<String>) -> JoinHandle<()> {
        let url = url.into();
        let cached = self.inner.cache.get(&url);
        let mut hydrated = Latch::new();

        let generation = {
            let mut generation = self.inner.generation.lock();
            *generation += 1;
            self.inner.state.send_modify(|s| {
                s.url.clone_from(&url);
                s.error = None;
                if let Some(payload) = cached {
                    s.payload = payload;
                    s.loading = false;
                    s.from_cache = true;
                    hydrated.trip();
                } else {
                    s.loading = true;
                    s.from_cache = false;
                }
            });
            *generation
        };

        if hydrated.is_done() {
            tracing::debug!(url = %url, "hydrated from session cache");
        }

        self.spawn(
            generation,
            url,
            LoadOptions {
                skip_loading_state: hydrated.is_done(),
            },
        )
    }

    /// Fetch the current URL again in the foreground
    pub fn reload(&self) -> JoinHandle<()> {
        self.load(LoadOptions::default())
    }

    /// Fetch the current URL again
    pub fn load(&self, options: LoadOptions) -> JoinHandle<()> {
        let generation = self.bump();
        let url = self.inner.state.borrow().url.clone();
        self.spawn(generation, url, options)
    }

    /// Abandon any in-flight load; its result will never be committed
    pub fn unmount(&self) {
        self.bump();
        if let Some(handle) = self.inner.inflight.lock().take() {
            handle.abort();
        }
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> DataSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Watch state changes
    #[inline]
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DataSnapshot> {
        self.inner.state.subscribe()
    }

    /// Currently targeted URL
    #[inline]
    #[must_use]
    pub fn url(&self) -> String {
        self.inner.state.borrow().url.clone()
    }

    fn bump(&self) -> u64 {
        let mut generation = self.inner.generation.lock();
        *generation += 1;
        *generation
    }

    fn spawn(&self, generation: u64, url: String, options: LoadOptions) -> JoinHandle<()> {
        let task = tokio::spawn(Arc::clone(&self.inner).run(generation, url, options));
        if let Some(previous) = self.inner.inflight.lock().replace(task.abort_handle()) {
            previous.abort();
        }
        task
    }
}

impl fmt::Debug for DataAcquisition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataAcquisition")
            .field("url", &self.inner.state.borrow().url)
            .field("generation", &*self.inner.generation.lock())
            .finish_non_exhaustive()
    }
}
