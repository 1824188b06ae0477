//! Page Orchestrator Tests
//!
//! Runs the full event loop under paused tokio time with a headless document
//! and a scripted fetcher.

use folio_cache::TtlCache;
use folio_core::{
    fonts_ready, BootState, DeepLinkOutcome, DeepLinkState, Document, LoaderEvent, MemoryDocument,
    Page, PageConfig, PageEvent, PageView, ScrollBehavior, SectionId,
};
use folio_test_utils::{
    data_acquisition, document, session_cache, site_payload, wait_for_view, ScriptedFetcher,
    DATA_URL,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

const LAYOUT: &[(&str, f64)] = &[("hero", 0.0), ("about", 900.0), ("projects", 1800.0), ("contact", 2700.0)];

struct Harness {
    events: mpsc::Sender<PageEvent>,
    view: watch::Receiver<PageView>,
    doc: Arc<MemoryDocument>,
    fetcher: Arc<ScriptedFetcher>,
    task: JoinHandle<PageView>,
}

impl Harness {
    fn start(fragment: &str, anchors: &[(&str, f64)], payload: &Value, delay: Duration) -> Self {
        let (cache, _, _) = session_cache();
        Self::start_with_cache(fragment, anchors, payload, delay, cache)
    }

    fn start_with_cache(
        fragment: &str,
        anchors: &[(&str, f64)],
        payload: &Value,
        delay: Duration,
        cache: TtlCache,
    ) -> Self {
        let fetcher = ScriptedFetcher::new();
        fetcher.json_after(DATA_URL, payload, delay);
        Self::launch(fragment, anchors, fetcher, cache)
    }

    fn launch(
        fragment: &str,
        anchors: &[(&str, f64)],
        fetcher: Arc<ScriptedFetcher>,
        cache: TtlCache,
    ) -> Self {
        let doc = document(fragment, anchors);
        let data = data_acquisition(fetcher.clone(), cache);
        let page = Page::new(PageConfig::default(), doc.clone(), data);
        let view = page.subscribe();
        let (events, rx) = mpsc::channel(32);
        let task = tokio::spawn(page.run(rx, fonts_ready()));
        Self {
            events,
            view,
            doc,
            fetcher,
            task,
        }
    }

    async fn send(&self, event: PageEvent) {
        self.events.send(event).await.expect("page loop stopped");
    }

    async fn until(&mut self, predicate: impl Fn(&PageView) -> bool) -> PageView {
        wait_for_view(&mut self.view, predicate).await
    }

    async fn teardown(self) -> (PageView, Arc<MemoryDocument>) {
        self.send(PageEvent::Teardown).await;
        let view = self.task.await.expect("page task panicked");
        (view, self.doc)
    }
}

fn id(s: &str) -> SectionId {
    SectionId::new(s)
}

#[tokio::test(start_paused = true)]
async fn deep_link_resolves_when_target_mounts_late() {
    let without_projects: Vec<_> = LAYOUT.iter().copied().filter(|(id, _)| *id != "projects").collect();
    let mut page = Harness::start(
        "#projects",
        &without_projects,
        &site_payload(&["about"]),
        Duration::ZERO,
    );

    let view = page
        .until(|v| matches!(v.deep_link, DeepLinkState::Watching { .. }) && v.nav.len() == 4)
        .await;
    let nav: Vec<_> = view.nav.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(nav, ["hero", "about", "projects", "contact"]);

    tokio::time::sleep(Duration::from_millis(50)).await;
    page.doc.mount("projects", 1800.0);
    page.send(PageEvent::Mutation).await;

    let view = page
        .until(|v| matches!(v.deep_link, DeepLinkState::Done(_)))
        .await;
    assert_eq!(view.active, Some(id("projects")));
    assert_eq!(
        view.deep_link,
        DeepLinkState::Done(DeepLinkOutcome::Jumped(id("projects")))
    );
    assert_eq!(page.doc.scrolls(), [(id("projects"), ScrollBehavior::Instant)]);
    assert_eq!(page.doc.scroll_behavior(), ScrollBehavior::Smooth);
    assert_eq!(page.doc.fragment(), "#projects");

    // the watch window is gone: reaching the old deadline changes nothing
    tokio::time::sleep(Duration::from_secs(6)).await;
    page.send(PageEvent::Mutation).await;
    let (view, doc) = page.teardown().await;
    assert_eq!(view.active, Some(id("projects")));
    assert_eq!(doc.scrolls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn deep_link_abandoned_after_timeout() {
    let mut page = Harness::start("#contact", &LAYOUT[..3], &site_payload(&[]), Duration::ZERO);

    tokio::time::sleep(Duration::from_secs(6)).await;
    let view = page
        .until(|v| matches!(v.deep_link, DeepLinkState::Done(_)))
        .await;
    assert_eq!(
        view.deep_link,
        DeepLinkState::Done(DeepLinkOutcome::Abandoned(id("contact")))
    );
    assert_eq!(view.active, Some(SectionId::hero()));
    assert!(page.doc.scrolls().is_empty());
    page.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn boot_waits_for_slow_data() {
    let mut page = Harness::start("", LAYOUT, &site_payload(&[]), Duration::from_secs(2));

    tokio::time::sleep(Duration::from_millis(1_000)).await;
    let view = page.view.borrow().clone();
    assert_eq!(view.boot, BootState::Pending);
    assert!(view.loading);
    assert!(!view.loader.can_finish);
    assert_eq!(view.loader.logs[1], "[NET]  fetching /data.json…");

    let view = page.until(|v| v.boot == BootState::Ready).await;
    assert!(!view.loading);
    assert!(view.loader.can_finish);
    assert!(view.loader.show);
    assert_eq!(view.loader.min_duration, Duration::from_secs(2));
    assert_eq!(page.fetcher.calls(), 1);
    page.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn cache_hit_boots_without_waiting_for_revalidation() {
    let (cache, _, _) = session_cache();
    cache.write(DATA_URL, &site_payload(&["tech"])).unwrap();
    let mut page = Harness::start_with_cache(
        "",
        LAYOUT,
        &site_payload(&["tech", "about"]),
        Duration::from_secs(10),
        cache,
    );

    let view = page.until(|v| v.boot == BootState::Ready).await;
    assert!(!view.loading);
    assert!(view.nav.iter().any(|c| c.id.as_str() == "tech"));
    assert!(!view.nav.iter().any(|c| c.id.as_str() == "about"));

    let view = page
        .until(|v| v.nav.iter().any(|c| c.id.as_str() == "about"))
        .await;
    assert_eq!(view.boot, BootState::Ready);
    page.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn loader_progress_drives_veil_until_done() {
    let mut page = Harness::start("", LAYOUT, &site_payload(&[]), Duration::ZERO);
    page.until(|v| v.boot == BootState::Ready).await;

    page.send(PageEvent::Loader(LoaderEvent::Progress(50.0))).await;
    let view = page
        .until(|v| v.veil.is_some_and(|veil| veil.blur_px < 6.0))
        .await;
    let veil = view.veil.unwrap();
    assert!((veil.opacity - 0.65).abs() < 1e-9);
    assert!((veil.scale - 0.99).abs() < 1e-9);
    assert!((veil.blur_px - 3.0).abs() < 1e-9);
    assert!(!view.revealed);

    page.send(PageEvent::Loader(LoaderEvent::Done)).await;
    let view = page.until(|v| v.revealed).await;
    assert_eq!(view.veil, None);
    assert!(!view.loader.show);

    page.send(PageEvent::Loader(LoaderEvent::Progress(10.0))).await;
    page.send(PageEvent::Reload).await;
    let (view, _) = page.teardown().await;
    assert!(view.revealed);
    assert_eq!(view.veil, None);
}

#[tokio::test(start_paused = true)]
async fn loader_opt_out_reveals_on_boot() {
    let mut payload = site_payload(&[]);
    payload["useLoader"] = json!(false);
    let mut page = Harness::start("", LAYOUT, &payload, Duration::ZERO);

    let view = page.until(|v| v.revealed).await;
    assert_eq!(view.boot, BootState::Ready);
    assert!(!view.loader.show);
    assert_eq!(view.veil, None);
    page.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn scroll_is_coalesced_into_one_frame() {
    let mut page = Harness::start("", LAYOUT, &site_payload(&[]), Duration::ZERO);
    page.until(|v| !v.loading).await;

    page.doc.scroll_to(1600.0);
    page.send(PageEvent::Scroll).await;
    page.send(PageEvent::Scroll).await;
    let view = page.until(|v| v.frame_requested).await;
    assert_eq!(view.active, Some(SectionId::hero()));

    page.send(PageEvent::AnimationFrame).await;
    let view = page.until(|v| !v.frame_requested).await;
    assert_eq!(view.active, Some(id("projects")));
    assert_eq!(page.doc.fragment(), "#projects");

    page.doc.scroll_to(0.0);
    page.send(PageEvent::Resize).await;
    let view = page.until(|v| v.active == Some(SectionId::hero())).await;
    assert!(!view.frame_requested);
    page.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn nav_click_scrolls_smoothly() {
    let mut page = Harness::start("", LAYOUT, &site_payload(&[]), Duration::ZERO);
    page.until(|v| !v.loading).await;

    page.send(PageEvent::Select(id("contact"))).await;
    let view = page.until(|v| v.active == Some(id("contact"))).await;
    assert_eq!(view.active, Some(id("contact")));
    assert_eq!(page.doc.scrolls(), [(id("contact"), ScrollBehavior::Smooth)]);
    assert_eq!(page.doc.fragment(), "#contact");
    page.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn fetch_failure_shows_fallback() {
    let fetcher = ScriptedFetcher::new();
    fetcher.network_error(DATA_URL, "offline");
    let (cache, _, _) = session_cache();
    let mut page = Harness::launch("", LAYOUT, fetcher, cache);

    let view = page.until(|v| v.revealed).await;
    assert_eq!(view.error.as_deref(), Some("network error: offline"));
    assert!(!view.loading);
    assert!(!view.loader.show);
    let nav: Vec<_> = view.nav.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(nav, ["hero", "projects", "contact"]);
    page.teardown().await;
}

#[tokio::test(start_paused = true)]
async fn teardown_detaches_everything() {
    let mut page = Harness::start("#contact", &LAYOUT[..2], &site_payload(&[]), Duration::ZERO);
    page.until(|v| matches!(v.deep_link, DeepLinkState::Watching { .. }))
        .await;
    assert_eq!(page.doc.scroll_behavior(), ScrollBehavior::Smooth);

    let (view, doc) = page.teardown().await;
    assert_eq!(view.deep_link, DeepLinkState::Pending);
    assert_eq!(doc.scroll_behavior(), ScrollBehavior::Unset);

    doc.mount("contact", 2700.0);
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert!(doc.scrolls().is_empty());
}
