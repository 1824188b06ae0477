//! Testing utilities for Folio workspace
//!
//! Shared fetchers, fixtures and view helpers.

#![allow(missing_docs)]

use async_trait::async_trait;
use folio_cache::{ManualClock, MemoryStorage, PayloadField, TtlCache};
use folio_core::{MemoryDocument, PageView};
use folio_data::{DataAcquisition, FetchError, FetchResponse, FetchResult, Fetcher};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Semaphore};

pub const DATA_URL: &str = "/data/data.json";
pub const EPOCH_MILLIS: i64 = 1_700_000_000_000;

#[derive(Debug, Clone)]
enum Reply {
    Response(FetchResponse),
    Network(String),
}

#[derive(Debug, Clone)]
struct Script {
    reply: Reply,
    delay: Duration,
    gate: Option<Arc<Semaphore>>,
}

/// Fetcher answering from a per-URL script; delays use tokio time
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, Script>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn json(&self, url: &str, payload: &Value) -> &Self {
        self.json_after(url, payload, Duration::ZERO)
    }

    pub fn json_after(&self, url: &str, payload: &Value, delay: Duration) -> &Self {
        self.script(url, Reply::Response(FetchResponse::json(payload.to_string())), delay)
    }

    /// Answer `url` with `payload` once a permit is added to the returned gate
    pub fn json_gated(&self, url: &str, payload: &Value) -> Arc<Semaphore> {
        self.response_gated(url, FetchResponse::json(payload.to_string()))
    }

    pub fn response(&self, url: &str, response: FetchResponse) -> &Self {
        self.script(url, Reply::Response(response), Duration::ZERO)
    }

    pub fn response_gated(&self, url: &str, response: FetchResponse) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.scripts.lock().insert(
            url.to_string(),
            Script {
                reply: Reply::Response(response),
                delay: Duration::ZERO,
                gate: Some(Arc::clone(&gate)),
            },
        );
        gate
    }

    pub fn html(&self, url: &str) -> &Self {
        self.response(
            url,
            FetchResponse {
                status: 200,
                content_type: Some("text/html; charset=utf-8".to_string()),
                body: "<!doctype html><html><body>fallback</body></html>".to_string(),
            },
        )
    }

    pub fn network_error(&self, url: &str, message: &str) -> &Self {
        self.script(url, Reply::Network(message.to_string()), Duration::ZERO)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn script(&self, url: &str, reply: Reply, delay: Duration) -> &Self {
        self.scripts
            .lock()
            .insert(url.to_string(), Script { reply, delay, gate: None });
        self
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn get(&self, url: &str) -> FetchResult<FetchResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let script = self
            .scripts
            .lock()
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Network(format!("no script for {url}")))?;
        if let Some(gate) = &script.gate {
            gate.acquire()
                .await
                .map_err(|_| FetchError::Network(format!("gate closed for {url}")))?
                .forget();
        }
        if !script.delay.is_zero() {
            tokio::time::sleep(script.delay).await;
        }
        match script.reply {
            Reply::Response(response) => Ok(response),
            Reply::Network(message) => Err(FetchError::Network(message)),
        }
    }
}

/// Session cache over fresh storage with a manual clock
pub fn session_cache() -> (TtlCache, MemoryStorage, ManualClock) {
    let storage = MemoryStorage::new();
    let clock = ManualClock::new(EPOCH_MILLIS);
    let cache = TtlCache::new(
        Arc::new(storage.clone()),
        Arc::new(clock.clone()),
        "ty-app-data",
        Duration::from_secs(300),
        PayloadField::Data,
    );
    (cache, storage, clock)
}

/// Acquisition of [`DATA_URL`] through `fetcher`
pub fn data_acquisition(fetcher: Arc<ScriptedFetcher>, cache: TtlCache) -> DataAcquisition {
    DataAcquisition::new(fetcher, cache, DATA_URL)
}

/// Payload enabling the named optional sections
pub fn site_payload(enabled: &[&str]) -> Value {
    let mut payload = json!({
        "personal": { "name": "Tia Example" },
        "hero": { "headline": "Systems engineer" },
        "projects": { "items": [] },
        "contact": { "form": { "mode": "mailto" } }
    });
    if let Some(map) = payload.as_object_mut() {
        for key in enabled {
            map.insert((*key).to_string(), json!({ "enabled": true }));
        }
    }
    payload
}

/// Document with viewport 1000 and the given anchors mounted
pub fn document(fragment: &str, anchors: &[(&str, f64)]) -> Arc<MemoryDocument> {
    let doc = MemoryDocument::new(1000.0).with_fragment(fragment);
    for (id, offset) in anchors {
        doc.mount(*id, *offset);
    }
    Arc::new(doc)
}

/// Wait until the view satisfies `predicate`, panicking after 30 s of tokio time
pub async fn wait_for_view(
    rx: &mut watch::Receiver<PageView>,
    predicate: impl Fn(&PageView) -> bool,
) -> PageView {
    let wait = rx.wait_for(|view| predicate(view));
    match tokio::time::timeout(Duration::from_secs(30), wait).await {
        Ok(Ok(view)) => view.clone(),
        Ok(Err(_)) => panic!("page view channel closed"),
        Err(_) => panic!("timed out waiting for page view"),
    }
}
