//! Highlighted element tracking
//!
//! Both operations return the page the viewer has to show so that the
//! highlighted element is always on the current page.

use log::debug;

use crate::matches::{ElementId, MatchIndex};

#[derive(Debug, Default)]
pub struct HighlightController {
    highlighted: Option<ElementId>,
}

impl HighlightController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn highlighted(&self) -> Option<&ElementId> {
        self.highlighted.as_ref()
    }

    #[must_use]
    pub fn is_highlighted(&self, element_id: &ElementId) -> bool {
        self.highlighted.as_ref() == Some(element_id)
    }

    /// Click on a drawn box: clear if it is already highlighted, otherwise
    /// highlight it and ask for `page_number`.
    pub fn toggle(&mut self, element_id: &ElementId, page_number: usize) -> Option<usize> {
        if self.is_highlighted(element_id) {
            self.highlighted = None;
            None
        } else {
            self.highlighted = Some(element_id.clone());
            Some(page_number)
        }
    }

    /// Highlight request from outside the page (results list, navigation).
    ///
    /// Unknown ids are ignored.
    pub fn set_external(&mut self, element_id: &ElementId, index: &MatchIndex) -> Option<usize> {
        let Some(element) = index.get(element_id) else {
            debug!("Ignoring highlight request for unknown element {element_id}");
            return None;
        };
        self.highlighted = Some(element.element_id.clone());
        Some(element.page_number)
    }

    pub fn clear(&mut self) {
        self.highlighted = None;
    }
}
