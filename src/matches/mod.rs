//! Matched elements and their per-page index

mod element;
mod extraction;
mod index;

pub use element::{BBox, ElementId, MatchedElement, PageRasterInfo};
pub use extraction::Extraction;
pub use index::MatchIndex;
