//! Per-page grouping of matched elements

use std::collections::HashMap;

use log::warn;

use super::element::{ElementId, MatchedElement};

/// Elements grouped by page, in the order they were supplied.
///
/// Built once per element collection; lookups by page or id are O(1).
#[derive(Debug, Default)]
pub struct MatchIndex {
    elements: Vec<MatchedElement>,
    by_page: HashMap<usize, Vec<usize>>,
    by_id: HashMap<ElementId, usize>,
}

impl MatchIndex {
    /// Index `elements`, skipping any with page number 0
    pub fn build(elements: impl IntoIterator<Item = MatchedElement>) -> Self {
        let mut index = Self::default();

        for element in elements {
            if element.page_number == 0 {
                warn!(
                    "Skipping element {} with invalid page number 0",
                    element.element_id
                );
                continue;
            }

            let slot = index.elements.len();
            index
                .by_page
                .entry(element.page_number)
                .or_default()
                .push(slot);
            // First occurrence wins for duplicate ids
            index
                .by_id
                .entry(element.element_id.clone())
                .or_insert(slot);
            index.elements.push(element);
        }

        index
    }

    /// Elements on `page_number`, in insertion order
    #[must_use]
    pub fn for_page(&self, page_number: usize) -> Vec<&MatchedElement> {
        self.by_page
            .get(&page_number)
            .map(|slots| slots.iter().map(|&slot| &self.elements[slot]).collect())
            .unwrap_or_default()
    }

    /// Look up an element by id
    #[must_use]
    pub fn get(&self, element_id: &ElementId) -> Option<&MatchedElement> {
        self.by_id.get(element_id).map(|&slot| &self.elements[slot])
    }

    /// Pages that carry at least one element, ascending
    #[must_use]
    pub fn pages(&self) -> Vec<usize> {
        let mut pages: Vec<usize> = self.by_page.keys().copied().collect();
        pages.sort_unstable();
        pages
    }

    #[must_use]
    pub fn elements(&self) -> &[MatchedElement] {
        &self.elements
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(elements: &[&MatchedElement]) -> Vec<String> {
        elements
            .iter()
            .map(|e| e.element_id.as_str().to_string())
            .collect()
    }

    #[test]
    fn groups_by_page_preserving_order() {
        let index = MatchIndex::build(vec![
            MatchedElement::new("c", 2),
            MatchedElement::new("a", 1),
            MatchedElement::new("d", 2),
            MatchedElement::new("b", 1),
        ]);

        assert_eq!(ids(&index.for_page(1)), vec!["a", "b"]);
        assert_eq!(ids(&index.for_page(2)), vec!["c", "d"]);
        assert!(index.for_page(3).is_empty());
        assert_eq!(index.pages(), vec![1, 2]);
    }

    #[test]
    fn lookup_by_id() {
        let index = MatchIndex::build(vec![
            MatchedElement::new("a", 1),
            MatchedElement::new("b", 4),
        ]);
        assert_eq!(index.get(&"b".into()).map(|e| e.page_number), Some(4));
        assert!(index.get(&"zzz".into()).is_none());
    }

    #[test]
    fn duplicate_ids_resolve_to_first() {
        let index = MatchIndex::build(vec![
            MatchedElement::new("a", 1),
            MatchedElement::new("a", 3),
        ]);
        assert_eq!(index.get(&"a".into()).map(|e| e.page_number), Some(1));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn page_zero_is_dropped() {
        let index = MatchIndex::build(vec![
            MatchedElement::new("bad", 0),
            MatchedElement::new("ok", 1),
        ]);
        assert_eq!(index.len(), 1);
        assert!(index.get(&"bad".into()).is_none());
    }
}
