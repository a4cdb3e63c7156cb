//! Viewer state machine
//!
//! Every transition is triggered by a named [`Command`] and answers with the
//! [`Effect`]s the owner must carry out. Nothing here talks to workers.

use std::sync::Arc;

use super::types::PageData;

/// Lifecycle phase of the viewer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Phase {
    /// No document
    #[default]
    Unloaded,
    /// Document opening, or first page not yet rendered
    Loading,
    /// The current page is on screen
    PageReady,
    /// The current page failed to render; the previous page (if any) stays
    RenderFailed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Unloaded => "No document",
            Phase::Loading => "Loading",
            Phase::PageReady => "Ready",
            Phase::RenderFailed => "Render failed",
        }
    }
}

/// Current render state for a document
#[derive(Clone, Debug, Default)]
pub struct ViewerState {
    pub phase: Phase,

    /// Page the viewer wants on screen (1-indexed)
    pub current_page: usize,

    /// Total page count, known once the document is loaded
    pub page_count: Option<usize>,

    /// Page actually on screen; lags `current_page` while a render is in flight
    pub displayed: Option<Arc<PageData>>,

    /// Last load or render failure, for display
    pub last_error: Option<String>,
}

impl ViewerState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current_page: 1,
            ..Self::default()
        }
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::DocumentOpened => {
                let had_document = self.phase != Phase::Unloaded;
                *self = Self {
                    phase: Phase::Loading,
                    ..Self::new()
                };
                if had_document {
                    vec![Effect::ReleaseDocument, Effect::ResetSelection]
                } else {
                    vec![Effect::ResetSelection]
                }
            }

            Command::DocumentLoaded { page_count } => {
                if self.phase != Phase::Loading {
                    return vec![];
                }
                self.page_count = Some(page_count);
                self.current_page = self.current_page.max(1);
                vec![Effect::RenderCurrentPage, Effect::UpdatePrefetch]
            }

            Command::DocumentFailed(message) => {
                *self = Self {
                    last_error: Some(message),
                    ..Self::new()
                };
                vec![Effect::ReleaseDocument]
            }

            Command::GoToPage(page) => {
                if self.current_page == page {
                    return vec![];
                }
                self.current_page = page;
                match self.phase {
                    // Picked up once the page count arrives
                    Phase::Unloaded | Phase::Loading if self.page_count.is_none() => vec![],
                    _ => vec![Effect::RenderCurrentPage, Effect::UpdatePrefetch],
                }
            }

            Command::PageRendered(data) => {
                if data.page_number() != self.current_page {
                    return vec![];
                }
                self.displayed = Some(data);
                self.phase = Phase::PageReady;
                self.last_error = None;
                vec![]
            }

            Command::PageFailed {
                page_number,
                message,
            } => {
                if page_number != self.current_page || self.phase == Phase::Unloaded {
                    return vec![];
                }
                self.phase = Phase::RenderFailed;
                self.last_error = Some(message);
                vec![]
            }

            Command::Close => {
                let had_document = self.phase != Phase::Unloaded;
                *self = Self::new();
                if had_document {
                    vec![Effect::ReleaseDocument, Effect::ResetSelection]
                } else {
                    vec![]
                }
            }
        }
    }

    /// Page number of the page on screen
    #[must_use]
    pub fn displayed_page(&self) -> Option<usize> {
        self.displayed.as_ref().map(|page| page.page_number())
    }
}

/// Commands that modify viewer state
#[derive(Clone, Debug)]
pub enum Command {
    /// New document bytes were handed to the renderer
    DocumentOpened,
    /// Renderer reported the document's page count
    DocumentLoaded { page_count: usize },
    /// Renderer could not open the document
    DocumentFailed(String),
    /// Make `page` the current page
    GoToPage(usize),
    /// A render for the current generation finished
    PageRendered(Arc<PageData>),
    /// A render for the current generation failed
    PageFailed { page_number: usize, message: String },
    /// Tear the session down
    Close,
}

/// Effects produced by state changes
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Drop highlight and navigation cursor
    ResetSelection,
    /// Render the current page
    RenderCurrentPage,
    /// Update prefetch queue around the current page
    UpdatePrefetch,
    /// Release the document session and its staged bytes
    ReleaseDocument,
}
