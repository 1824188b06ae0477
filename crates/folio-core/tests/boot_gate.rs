//! Readiness gate tests
//!
//! Polls the page loop by hand with tokio-test to observe the boot phase
//! staying pending while either the timer or the foreground load is
//! outstanding.

use folio_core::{fonts_ready, BootState, FontError, FontReady, Page, PageConfig, PageEvent, PageView};
use folio_test_utils::{data_acquisition, document, session_cache, site_payload, ScriptedFetcher, DATA_URL};
use std::future::Future;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_test::task::{self, Spawn};
use tokio_test::{assert_pending, assert_ready};

struct Booting<F> {
    run: Spawn<F>,
    events: mpsc::Sender<PageEvent>,
    view: watch::Receiver<PageView>,
}

fn boot(data_delay: Duration, fonts: FontReady) -> Booting<impl Future<Output = PageView>> {
    let fetcher = ScriptedFetcher::new();
    fetcher.json_after(DATA_URL, &site_payload(&[]), data_delay);
    let (cache, _, _) = session_cache();
    let page = Page::new(
        PageConfig::default(),
        document("", &[("hero", 0.0)]),
        data_acquisition(fetcher, cache),
    );
    let view = page.subscribe();
    let (events, rx) = mpsc::channel(8);
    Booting {
        run: task::spawn(page.run(rx, fonts)),
        events,
        view,
    }
}

impl<F: Future<Output = PageView>> Booting<F> {
    fn phase(&self) -> BootState {
        self.view.borrow().boot
    }

    fn finish(mut self) -> PageView {
        self.events
            .try_send(PageEvent::Teardown)
            .expect("event queue full");
        assert_ready!(self.run.poll())
    }
}

async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn gate_opens_after_timer_and_data() {
    let mut page = boot(Duration::from_millis(1_500), fonts_ready());
    assert_pending!(page.run.poll());
    assert_eq!(page.phase(), BootState::Pending);

    tokio::time::sleep(Duration::from_millis(900)).await;
    assert_pending!(page.run.poll());
    assert_eq!(page.phase(), BootState::Pending);
    assert!(page.view.borrow().loading);

    tokio::time::sleep(Duration::from_millis(700)).await;
    assert!(page.run.is_woken());
    assert_pending!(page.run.poll());
    assert_eq!(page.phase(), BootState::Ready);

    let view = page.finish();
    assert_eq!(view.boot, BootState::Ready);
    assert!(!view.loading);
}

#[tokio::test(start_paused = true)]
async fn fast_data_still_waits_for_boot_delay() {
    let mut page = boot(Duration::ZERO, fonts_ready());
    assert_pending!(page.run.poll());

    settle().await;
    assert_pending!(page.run.poll());
    assert!(!page.view.borrow().loading);
    assert_eq!(page.phase(), BootState::Pending);

    tokio::time::sleep(Duration::from_millis(800)).await;
    assert_pending!(page.run.poll());
    assert_eq!(page.phase(), BootState::Ready);
    page.finish();
}

#[tokio::test(start_paused = true)]
async fn rejected_fonts_do_not_hold_the_gate() {
    let fonts: FontReady = Box::pin(async { Err(FontError("document.fonts missing".to_string())) });
    let mut page = boot(Duration::ZERO, fonts);
    assert_pending!(page.run.poll());

    tokio::time::sleep(Duration::from_millis(800)).await;
    assert_pending!(page.run.poll());
    assert_eq!(page.phase(), BootState::Ready);
    page.finish();
}

#[tokio::test(start_paused = true)]
async fn teardown_before_boot_leaves_gate_pending() {
    let mut page = boot(Duration::from_secs(60), fonts_ready());
    assert_pending!(page.run.poll());

    let view = page.finish();
    assert_eq!(view.boot, BootState::Pending);
}
