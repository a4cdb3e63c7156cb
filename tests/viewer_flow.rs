use std::collections::HashMap;
use std::time::{Duration, Instant};

use pagelight::Viewer;
use pagelight::matches::{ElementId, MatchedElement, PageRasterInfo};
use pagelight::pdf::{LoadError, PageData, Phase, RenderConfig};
use pagelight::test_utils::{FakeBackend, FakePdf};

const SETTLE: Duration = Duration::from_secs(5);

fn config(workers: usize, prefetch_radius: usize) -> RenderConfig {
    RenderConfig {
        workers,
        prefetch_radius,
        ..RenderConfig::default()
    }
}

fn elements() -> Vec<MatchedElement> {
    vec![
        MatchedElement::new("a", 1)
            .with_pdf_box([72.0, 72.0, 144.0, 144.0])
            .with_label("Aspirin"),
        MatchedElement::new("b", 2).with_pixel_box([100.0, 100.0, 200.0, 300.0]),
        MatchedElement::new("c", 3).with_pdf_box([10.0, 10.0, 20.0, 20.0]),
    ]
}

fn order() -> Vec<ElementId> {
    vec!["a".into(), "b".into(), "c".into()]
}

fn open(pdf: &FakePdf, config: RenderConfig) -> Viewer<FakeBackend> {
    let mut viewer = Viewer::new(FakeBackend, config);
    let mut rasters = HashMap::new();
    rasters.insert(2, PageRasterInfo::new(1000.0, 1400.0));
    viewer.set_matches(elements(), rasters, order());
    viewer.open_document(&pdf.to_bytes()).unwrap();
    assert!(viewer.settle(SETTLE), "viewer did not settle");
    viewer
}

fn displayed_page(viewer: &Viewer<FakeBackend>) -> Option<usize> {
    viewer.displayed().map(PageData::page_number)
}

/// Keep applying results for `duration`
fn drain_for(viewer: &mut Viewer<FakeBackend>, duration: Duration) {
    let deadline = Instant::now() + duration;
    while Instant::now() < deadline {
        let _ = viewer.wait(Duration::from_millis(20));
    }
}

#[test]
fn late_render_of_superseded_page_is_discarded() {
    let mut viewer = open(&FakePdf::new(3).slow(2, 300), config(2, 0));

    viewer.select_page(2);
    viewer.select_page(3);
    assert!(viewer.settle(SETTLE));
    assert_eq!(displayed_page(&viewer), Some(3));

    // The slow page 2 render finishes afterwards and must not replace page 3
    drain_for(&mut viewer, Duration::from_millis(600));
    assert_eq!(displayed_page(&viewer), Some(3));
    assert_eq!(viewer.current_page(), 3);
    assert_eq!(viewer.phase(), Phase::PageReady);
}

#[test]
fn renders_from_replaced_document_are_discarded() {
    let mut viewer = open(&FakePdf::new(3).slow(2, 300), config(2, 0));
    viewer.select_page(2);

    viewer
        .open_document(&FakePdf::new(2).size(100.0, 100.0).to_bytes())
        .unwrap();
    assert!(viewer.settle(SETTLE));
    drain_for(&mut viewer, Duration::from_millis(600));

    let page = viewer.displayed().unwrap();
    assert_eq!(page.page_number(), 1);
    assert_eq!((page.viewport.width_px, page.viewport.height_px), (200, 200));
    assert_eq!(viewer.page_count(), Some(2));
}

#[test]
fn empty_document_is_rejected_synchronously() {
    let mut viewer = Viewer::new(FakeBackend, RenderConfig::default());
    assert!(matches!(viewer.open_document(&[]), Err(LoadError::Empty)));
    assert_eq!(viewer.phase(), Phase::Unloaded);
}

#[test]
fn unreadable_document_returns_to_unloaded() {
    let mut viewer = Viewer::new(FakeBackend, RenderConfig::default());
    viewer.open_document(b"%PDF-1.7 truncated").unwrap();
    assert!(viewer.settle(SETTLE));

    assert_eq!(viewer.phase(), Phase::Unloaded);
    assert!(viewer.last_error().is_some());
    assert!(!viewer.is_loaded());
    assert!(viewer.displayed().is_none());
}

#[test]
fn document_without_pages_fails_to_load() {
    let mut viewer = Viewer::new(FakeBackend, RenderConfig::default());
    viewer.open_document(&FakePdf::new(0).to_bytes()).unwrap();
    assert!(viewer.settle(SETTLE));

    assert_eq!(viewer.phase(), Phase::Unloaded);
    assert!(viewer.last_error().unwrap().contains("no pages"));
}

#[test]
fn render_failure_keeps_previous_page() {
    let mut viewer = open(&FakePdf::new(3).failing(2), config(2, 0));
    assert_eq!(displayed_page(&viewer), Some(1));

    viewer.select_page(2);
    assert!(viewer.settle(SETTLE));
    assert_eq!(viewer.phase(), Phase::RenderFailed);
    assert_eq!(viewer.current_page(), 2);
    assert_eq!(displayed_page(&viewer), Some(1));
    assert!(viewer.last_error().unwrap().contains("damaged"));

    viewer.select_page(3);
    assert!(viewer.settle(SETTLE));
    assert_eq!(viewer.phase(), Phase::PageReady);
    assert_eq!(displayed_page(&viewer), Some(3));
    assert!(viewer.last_error().is_none());
}

#[test]
fn highlight_moves_current_page_to_element() {
    let mut viewer = open(&FakePdf::new(3), config(2, 1));

    viewer.highlight_external(&"c".into());
    assert_eq!(viewer.current_page(), 3);
    assert!(viewer.settle(SETTLE));
    assert_eq!(displayed_page(&viewer), Some(3));

    viewer.toggle(&"b".into());
    assert_eq!(viewer.current_page(), 2);
    assert_eq!(viewer.highlighted(), Some(&"b".into()));
}

#[test]
fn overlay_tracks_displayed_page_while_render_in_flight() {
    let mut viewer = open(&FakePdf::new(3).slow(2, 300), config(1, 0));

    viewer.select_page(2);
    let boxes = viewer.overlay();
    assert_eq!(boxes.len(), 1);
    assert_eq!(boxes[0].page_number, 1);

    assert!(viewer.settle(SETTLE));
    let boxes = viewer.overlay();
    assert_eq!(boxes[0].element_id.as_str(), "b");
    // 1000x1400 raster onto 1224x1584
    assert!((boxes[0].rect.left - 122.4).abs() < 1e-6);
}

#[test]
fn highlight_on_missing_page_surfaces_render_error() {
    let mut viewer = open(&FakePdf::new(3), config(2, 0));
    let mut elements = elements();
    elements.push(MatchedElement::new("ghost", 9).with_pdf_box([0.0, 0.0, 1.0, 1.0]));
    viewer.set_matches(elements, HashMap::new(), order());

    viewer.highlight_external(&"ghost".into());
    assert_eq!(viewer.current_page(), 9);
    assert!(viewer.settle(SETTLE));
    assert_eq!(viewer.phase(), Phase::RenderFailed);
    assert!(viewer.last_error().unwrap().contains("out of range"));
    assert_eq!(displayed_page(&viewer), Some(1));
}

#[test]
fn navigation_wraps_and_highlights() {
    let mut viewer = open(&FakePdf::new(3), config(2, 0));
    assert_eq!(viewer.position().to_string(), "0 / 3");

    viewer.prev_match();
    assert_eq!(viewer.highlighted(), Some(&"c".into()));
    assert_eq!(viewer.current_page(), 3);

    viewer.next_match();
    assert_eq!(viewer.highlighted(), Some(&"a".into()));
    assert_eq!(viewer.position().to_string(), "1 / 3");

    for _ in 0..3 {
        viewer.next_match();
    }
    assert_eq!(viewer.highlighted(), Some(&"a".into()));
    assert_eq!(viewer.current_page(), 1);
}

#[test]
fn navigation_without_matches_is_noop() {
    let mut viewer = open(&FakePdf::new(3), config(2, 0));
    viewer.set_matches(vec![], HashMap::new(), vec![]);

    viewer.next_match();
    viewer.prev_match();
    assert_eq!(viewer.highlighted(), None);
    assert_eq!(viewer.current_page(), 1);
    assert_eq!(viewer.position().to_string(), "0 / 0");
}

#[test]
fn new_document_resets_selection() {
    let mut viewer = open(&FakePdf::new(3), config(2, 0));
    viewer.next_match();
    viewer.next_match();
    assert!(viewer.settle(SETTLE));

    viewer.open_document(&FakePdf::new(3).to_bytes()).unwrap();
    assert_eq!(viewer.highlighted(), None);
    assert_eq!(viewer.position().to_string(), "0 / 3");
    assert_eq!(viewer.current_page(), 1);
    assert!(viewer.displayed().is_none());

    assert!(viewer.settle(SETTLE));
    assert_eq!(displayed_page(&viewer), Some(1));
}

#[test]
fn neighbours_are_prefetched() {
    let mut viewer = open(&FakePdf::new(3), config(2, 1));

    let deadline = Instant::now() + SETTLE;
    while !viewer.is_page_cached(2) && Instant::now() < deadline {
        let _ = viewer.wait(Duration::from_millis(20));
    }
    assert!(viewer.is_page_cached(2));
    assert!(!viewer.is_page_cached(3));
}

#[test]
fn close_releases_document() {
    let mut viewer = open(&FakePdf::new(3), config(2, 0));
    viewer.close_document();
    assert_eq!(viewer.phase(), Phase::Unloaded);
    assert!(!viewer.is_loaded());
    assert!(viewer.overlay().is_empty());
}
