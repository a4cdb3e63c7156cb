//! Viewer: document rendering, match overlay, highlight and navigation
//! wired together on one event thread.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::highlight::HighlightController;
use crate::matches::{ElementId, MatchIndex, MatchedElement, PageRasterInfo};
use crate::navigation::{NavPosition, NavigationController};
use crate::overlay::{build_overlay, hit_test, OverlayBox};
use crate::pdf::{
    Command, DocumentBackend, Effect, LoadError, PageData, Phase, RenderConfig, RenderEvent,
    RenderService, ViewerState,
};

pub struct Viewer<B: DocumentBackend> {
    service: RenderService<B>,
    state: ViewerState,
    index: MatchIndex,
    rasters: HashMap<usize, PageRasterInfo>,
    highlight: HighlightController,
    navigation: NavigationController,
}

impl<B: DocumentBackend> Viewer<B> {
    #[must_use]
    pub fn new(backend: B, config: RenderConfig) -> Self {
        Self {
            service: RenderService::with_config(backend, config),
            state: ViewerState::new(),
            index: MatchIndex::default(),
            rasters: HashMap::new(),
            highlight: HighlightController::new(),
            navigation: NavigationController::default(),
        }
    }

    /// Replace the current document.
    ///
    /// The previous document's renders are discarded and the highlight and
    /// navigation cursor are reset. The page count arrives later through
    /// [`pump`](Self::pump).
    pub fn open_document(&mut self, bytes: &[u8]) -> Result<(), LoadError> {
        self.apply_command(Command::DocumentOpened);

        match self.service.load(bytes) {
            Ok(generation) => {
                debug!("Opened document as generation {}", generation.0);
                Ok(())
            }
            Err(err) => {
                self.apply_command(Command::DocumentFailed(err.to_string()));
                Err(err)
            }
        }
    }

    pub fn close_document(&mut self) {
        self.apply_command(Command::Close);
    }

    /// Install a new match set.
    ///
    /// `order` is the navigation order; ids missing from `elements` are
    /// dropped from it. The highlight survives only if its element is still
    /// present, and the current page follows it to its page.
    pub fn set_matches(
        &mut self,
        elements: Vec<MatchedElement>,
        rasters: HashMap<usize, PageRasterInfo>,
        order: Vec<ElementId>,
    ) {
        self.index = MatchIndex::build(elements);
        self.rasters = rasters;

        let requested = order.len();
        let order: Vec<ElementId> = order
            .into_iter()
            .filter(|id| self.index.get(id).is_some())
            .collect();
        if order.len() < requested {
            warn!(
                "Dropped {} navigation entries without a matching element",
                requested - order.len()
            );
        }
        self.navigation.set_order(order);

        let kept = self
            .highlight
            .highlighted()
            .and_then(|id| self.index.get(id))
            .map(|element| (element.element_id.clone(), element.page_number));
        match kept {
            Some((id, page)) => {
                self.navigation.sync_to(&id);
                self.follow(page);
            }
            None => self.highlight.clear(),
        }
        info!(
            "Installed {} matches on {} pages",
            self.index.len(),
            self.index.pages().len()
        );
    }

    /// Go to `page_number`, clamped to the document
    pub fn select_page(&mut self, page_number: usize) {
        let page = match self.state.page_count {
            Some(count) => page_number.clamp(1, count.max(1)),
            None => page_number.max(1),
        };
        self.apply_command(Command::GoToPage(page));
    }

    pub fn next_page(&mut self) {
        self.select_page(self.state.current_page.saturating_add(1));
    }

    pub fn prev_page(&mut self) {
        self.select_page(self.state.current_page.saturating_sub(1));
    }

    /// Toggle the highlight of a drawn element; unknown ids are ignored
    pub fn toggle(&mut self, element_id: &ElementId) {
        let Some(page_number) = self.index.get(element_id).map(|e| e.page_number) else {
            debug!("Ignoring toggle for unknown element {element_id}");
            return;
        };
        match self.highlight.toggle(element_id, page_number) {
            Some(page) => {
                self.navigation.sync_to(element_id);
                self.follow(page);
            }
            None => self.navigation.reset(),
        }
    }

    /// Toggle the match under the navigation cursor, or highlight the first
    /// match when there is no cursor.
    pub fn toggle_current(&mut self) {
        match self.navigation.current().cloned() {
            Some(element_id) => self.toggle(&element_id),
            None => self.next_match(),
        }
    }

    /// Toggle whatever box lies under a viewport-pixel position
    pub fn toggle_at(&mut self, x: f64, y: f64) -> Option<ElementId> {
        let boxes = self.overlay();
        let element_id = hit_test(&boxes, x, y)?.element_id.clone();
        self.toggle(&element_id);
        Some(element_id)
    }

    /// Highlight an element picked outside the page view
    pub fn highlight_external(&mut self, element_id: &ElementId) {
        if let Some(page) = self.highlight.set_external(element_id, &self.index) {
            self.navigation.sync_to(element_id);
            self.follow(page);
        }
    }

    pub fn clear_highlight(&mut self) {
        self.highlight.clear();
        self.navigation.reset();
    }

    pub fn next_match(&mut self) {
        if let Some(element_id) = self.navigation.next() {
            self.highlight_external(&element_id);
        }
    }

    pub fn prev_match(&mut self) {
        if let Some(element_id) = self.navigation.prev() {
            self.highlight_external(&element_id);
        }
    }

    /// Apply every finished render without blocking.
    ///
    /// Returns whether anything changed.
    pub fn pump(&mut self) -> bool {
        let events = self.service.poll();
        self.handle_events(events)
    }

    /// Block up to `timeout` for render results, then apply them
    pub fn wait(&mut self, timeout: Duration) -> bool {
        let events = self.service.wait(timeout);
        self.handle_events(events)
    }

    /// Block until the current page is on screen or failed, or `timeout`
    /// passes. Returns whether the viewer settled.
    pub fn settle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let _ = self.pump();
            if self.is_settled() {
                return true;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            let _ = self.wait(remaining.min(Duration::from_millis(50)));
        }
    }

    fn is_settled(&self) -> bool {
        if self.service.is_rendering() {
            return false;
        }
        match self.state.phase {
            Phase::Unloaded | Phase::RenderFailed => true,
            Phase::Loading => false,
            Phase::PageReady => self.state.displayed_page() == Some(self.state.current_page),
        }
    }

    /// Boxes for the page on screen, in viewport pixels of that render
    #[must_use]
    pub fn overlay(&self) -> Vec<OverlayBox> {
        let Some(page) = self.state.displayed.as_deref() else {
            return vec![];
        };
        build_overlay(&self.index, page, &self.rasters, self.highlight.highlighted())
    }

    #[must_use]
    pub fn position(&self) -> NavPosition {
        self.navigation.position()
    }

    #[must_use]
    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    #[must_use]
    pub fn current_page(&self) -> usize {
        self.state.current_page
    }

    #[must_use]
    pub fn page_count(&self) -> Option<usize> {
        self.state.page_count
    }

    #[must_use]
    pub fn displayed(&self) -> Option<&PageData> {
        self.state.displayed.as_deref()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.state.last_error.as_deref()
    }

    #[must_use]
    pub fn highlighted(&self) -> Option<&ElementId> {
        self.highlight.highlighted()
    }

    #[must_use]
    pub fn highlighted_element(&self) -> Option<&MatchedElement> {
        self.highlight.highlighted().and_then(|id| self.index.get(id))
    }

    #[must_use]
    pub fn index(&self) -> &MatchIndex {
        &self.index
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.service.is_loaded()
    }

    #[must_use]
    pub fn is_page_cached(&self, page_number: usize) -> bool {
        self.service.is_page_cached(page_number)
    }

    /// Make `page` current without clamping, so the highlighted element's
    /// page is always the requested one.
    fn follow(&mut self, page: usize) {
        self.apply_command(Command::GoToPage(page));
    }

    fn handle_events(&mut self, events: Vec<RenderEvent>) -> bool {
        let changed = !events.is_empty();
        for event in events {
            let cmd = match event {
                RenderEvent::Loaded { page_count } => Command::DocumentLoaded { page_count },
                RenderEvent::LoadFailed(err) => Command::DocumentFailed(err.to_string()),
                RenderEvent::PageReady(data) => Command::PageRendered(data),
                RenderEvent::PageFailed { page_number, error } => Command::PageFailed {
                    page_number,
                    message: error.to_string(),
                },
            };
            self.apply_command(cmd);
        }
        changed
    }

    fn apply_command(&mut self, cmd: Command) {
        let effects = self.state.apply(cmd);
        self.execute_effects(effects);
    }

    fn execute_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::ResetSelection => {
                    self.highlight.clear();
                    self.navigation.reset();
                }

                Effect::RenderCurrentPage => {
                    let page_number = self.state.current_page;
                    if let Err(err) = self.service.request_page(page_number) {
                        self.apply_command(Command::PageFailed {
                            page_number,
                            message: err.to_string(),
                        });
                    }
                }

                Effect::UpdatePrefetch => {
                    self.service.schedule_prefetch(self.state.current_page);
                }

                Effect::ReleaseDocument => {
                    self.service.unload();
                }
            }
        }
    }
}
