//! Property tests for active-section evaluation

use folio_core::{
    evaluate, nav_candidates, Evaluation, LayoutSnapshot, MemoryDocument, NavigationSynchronizer,
    Trigger,
};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

const SECTIONS: [&str; 7] = ["hero", "about", "resume", "tech", "projects", "portfolio", "contact"];
const PAYLOAD_KEYS: [&str; 4] = ["about", "resume", "techStack", "portfolio"];

fn payload(flags: &[bool]) -> Value {
    let map: Map<String, Value> = PAYLOAD_KEYS
        .iter()
        .zip(flags)
        .map(|(key, enabled)| ((*key).to_string(), json!({ "enabled": enabled })))
        .collect();
    Value::Object(map)
}

fn layout() -> impl Strategy<Value = (Vec<Option<f64>>, f64, f64)> {
    (
        prop::collection::vec(prop::option::of(0.0f64..6_000.0), SECTIONS.len()),
        0.0f64..8_000.0,
        1.0f64..2_000.0,
    )
}

fn mount(offsets: &[Option<f64>], scroll_y: f64, viewport: f64) -> MemoryDocument {
    let doc = MemoryDocument::new(viewport);
    doc.scroll_to(scroll_y);
    for (id, offset) in SECTIONS.iter().zip(offsets) {
        if let Some(offset) = offset {
            doc.mount(*id, *offset);
        }
    }
    doc
}

proptest! {
    #[test]
    fn active_is_always_an_enabled_candidate(
        flags in prop::collection::vec(any::<bool>(), PAYLOAD_KEYS.len()),
        (offsets, scroll_y, viewport) in layout(),
        fragment in prop::sample::select(vec!["", "#hero", "#about", "#tech", "#nope"]),
    ) {
        let candidates = nav_candidates(&payload(&flags));
        let doc = mount(&offsets, scroll_y, viewport);
        let mut nav = NavigationSynchronizer::new(candidates, fragment, 0.35);

        for trigger in [Trigger::Resize, Trigger::Scroll, Trigger::AnimationFrame, Trigger::Mutation] {
            nav.handle(trigger, &doc);
            let active = nav.active().expect("hero is always a candidate");
            prop_assert!(nav.is_candidate(active.as_str()), "{active} is not a candidate");
        }
    }

    #[test]
    fn evaluation_is_idempotent(
        flags in prop::collection::vec(any::<bool>(), PAYLOAD_KEYS.len()),
        (offsets, scroll_y, viewport) in layout(),
    ) {
        let doc = mount(&offsets, scroll_y, viewport);
        let mut nav = NavigationSynchronizer::new(nav_candidates(&payload(&flags)), "", 0.35);

        nav.evaluate_now(&doc);
        let first = nav.active().cloned();
        prop_assert_eq!(nav.evaluate_now(&doc), Evaluation::Unchanged);
        prop_assert_eq!(nav.active().cloned(), first);
    }

    #[test]
    fn synchronizer_agrees_with_pure_evaluation(
        flags in prop::collection::vec(any::<bool>(), PAYLOAD_KEYS.len()),
        (offsets, scroll_y, viewport) in layout(),
    ) {
        let candidates = nav_candidates(&payload(&flags));
        let doc = mount(&offsets, scroll_y, viewport);
        let snapshot = LayoutSnapshot::capture(&doc, &candidates);
        let mut nav = NavigationSynchronizer::new(candidates, "", 0.35);
        nav.evaluate_now(&doc);

        if let Some(expected) = evaluate(&snapshot, 0.35) {
            prop_assert_eq!(nav.active(), Some(&expected));
            let pivot = snapshot.pivot(0.35);
            let chosen = snapshot.anchors.iter().find(|a| a.id == expected).unwrap();
            prop_assert!(chosen.offset_top <= pivot || chosen.id == snapshot.anchors[0].id);
        }
    }
}
