//! Page-rendering primitive seam
//!
//! Workers only talk to documents through [`DocumentBackend`]. The default
//! backend is MuPDF; tests plug in a synthetic one.

use std::path::Path;

use super::request::{LoadError, RenderError};
use super::types::PageData;

/// Opens documents and rasterizes their pages.
///
/// A backend value is cloned into every worker thread. `Document` never
/// crosses threads: each worker opens its own copy from the staged file.
pub trait DocumentBackend: Clone + Send + 'static {
    type Document;

    /// Open the document staged at `path`
    fn open(&self, path: &Path) -> Result<Self::Document, LoadError>;

    /// Number of pages in an opened document
    fn page_count(&self, doc: &Self::Document) -> Result<usize, LoadError>;

    /// Render `page_number` (1-indexed) at `scale`.
    ///
    /// The returned viewport must be measured in pixels of
    /// `scale * 96/72` per document point.
    fn render_page(
        &self,
        doc: &Self::Document,
        page_number: usize,
        scale: f32,
    ) -> Result<PageData, RenderError>;
}
