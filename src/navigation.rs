//! Cursor over the caller-ordered list of matches

use std::fmt;

use crate::matches::ElementId;

/// Position indicator: `current / total`, with `current == 0` when no
/// match is selected
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavPosition {
    pub current: usize,
    pub total: usize,
}

impl fmt::Display for NavPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.current, self.total)
    }
}

/// Steps through matches, wrapping around at both ends.
///
/// From "no cursor", `next` lands on the first match and `prev` on the last.
#[derive(Debug, Default)]
pub struct NavigationController {
    ordered: Vec<ElementId>,
    current: Option<usize>,
}

impl NavigationController {
    #[must_use]
    pub fn new(ordered: Vec<ElementId>) -> Self {
        Self {
            ordered,
            current: None,
        }
    }

    /// Replace the ordering and drop the cursor
    pub fn set_order(&mut self, ordered: Vec<ElementId>) {
        self.ordered = ordered;
        self.current = None;
    }

    /// Move forward; `None` (and no change) when there are no matches
    pub fn next(&mut self) -> Option<ElementId> {
        let len = self.ordered.len();
        if len == 0 {
            return None;
        }
        let index = match self.current {
            Some(index) => (index + 1) % len,
            None => 0,
        };
        self.current = Some(index);
        self.ordered.get(index).cloned()
    }

    /// Move backward; `None` (and no change) when there are no matches
    pub fn prev(&mut self) -> Option<ElementId> {
        let len = self.ordered.len();
        if len == 0 {
            return None;
        }
        let index = match self.current {
            Some(index) => (index + len - 1) % len,
            None => len - 1,
        };
        self.current = Some(index);
        self.ordered.get(index).cloned()
    }

    /// Put the cursor on `element_id` if it is one of the matches
    pub fn sync_to(&mut self, element_id: &ElementId) {
        if let Some(index) = self.ordered.iter().position(|id| id == element_id) {
            self.current = Some(index);
        }
    }

    /// Drop the cursor, keeping the ordering
    pub fn reset(&mut self) {
        self.current = None;
    }

    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    #[must_use]
    pub fn current(&self) -> Option<&ElementId> {
        self.current.and_then(|index| self.ordered.get(index))
    }

    #[must_use]
    pub fn position(&self) -> NavPosition {
        NavPosition {
            current: self.current.map_or(0, |index| index + 1),
            total: self.ordered.len(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nav(ids: &[&str]) -> NavigationController {
        NavigationController::new(ids.iter().map(|&id| ElementId::new(id)).collect())
    }

    #[test]
    fn empty_sequence_is_noop() {
        let mut nav = nav(&[]);
        assert_eq!(nav.next(), None);
        assert_eq!(nav.prev(), None);
        assert_eq!(nav.current_index(), None);
        assert_eq!(nav.position().to_string(), "0 / 0");
    }

    #[test]
    fn first_steps_from_no_cursor() {
        let mut forward = nav(&["a", "b", "c"]);
        assert_eq!(forward.next(), Some("a".into()));

        let mut backward = nav(&["a", "b", "c"]);
        assert_eq!(backward.prev(), Some("c".into()));
    }

    #[test]
    fn next_wraps_around() {
        let mut nav = nav(&["a", "b", "c"]);
        let _ = nav.next();
        let start = nav.current_index();
        for _ in 0..3 {
            let _ = nav.next();
        }
        assert_eq!(nav.current_index(), start);
    }

    #[test]
    fn prev_wraps_around() {
        let mut nav = nav(&["a", "b", "c"]);
        let _ = nav.next();
        assert_eq!(nav.prev(), Some("c".into()));
        assert_eq!(nav.prev(), Some("b".into()));
    }

    #[test]
    fn position_indicator() {
        let mut nav = nav(&["a", "b"]);
        assert_eq!(nav.position(), NavPosition { current: 0, total: 2 });
        let _ = nav.next();
        let _ = nav.next();
        assert_eq!(nav.position().to_string(), "2 / 2");
    }

    #[test]
    fn sync_to_known_and_unknown() {
        let mut nav = nav(&["a", "b", "c"]);
        nav.sync_to(&"b".into());
        assert_eq!(nav.current(), Some(&"b".into()));
        nav.sync_to(&"zzz".into());
        assert_eq!(nav.current(), Some(&"b".into()));
        nav.reset();
        assert_eq!(nav.current(), None);
        assert_eq!(nav.len(), 3);
    }
}
