//! Extraction result file
//!
//! ```json
//! {
//!   "elements": [{"element_id": "e1", "page_number": 1, "bbox_pdf": [72, 72, 144, 144]}],
//!   "pages": [{"page_number": 1, "width_px": 1700, "height_px": 2200}]
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::element::{ElementId, MatchedElement, PageRasterInfo};

#[derive(Deserialize)]
struct PageEntry {
    page_number: usize,
    #[serde(flatten)]
    raster: PageRasterInfo,
}

#[derive(Deserialize)]
struct RawExtraction {
    #[serde(default)]
    elements: Vec<MatchedElement>,
    #[serde(default)]
    pages: Vec<PageEntry>,
}

/// Elements and per-page raster sizes for one document
#[derive(Debug, Default)]
pub struct Extraction {
    pub elements: Vec<MatchedElement>,
    pub pages: HashMap<usize, PageRasterInfo>,
}

impl Extraction {
    pub fn from_json_str(content: &str) -> anyhow::Result<Self> {
        let raw: RawExtraction = serde_json::from_str(content)?;
        let pages = raw
            .pages
            .into_iter()
            .map(|entry| (entry.page_number, entry.raster))
            .collect();
        Ok(Self {
            elements: raw.elements,
            pages,
        })
    }

    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let extraction = Self::from_json_str(&content)?;
        log::info!(
            "Loaded {} elements and {} page sizes from {path:?}",
            extraction.elements.len(),
            extraction.pages.len()
        );
        Ok(extraction)
    }

    /// Navigation order: by page, then top edge, then left edge.
    ///
    /// Positions come from the document-point box when valid (higher `y1` is
    /// nearer the top), else the raster-pixel box. Elements without a usable
    /// box go last on their page; ties keep pipeline order.
    #[must_use]
    pub fn reading_order(&self) -> Vec<ElementId> {
        let mut ordered: Vec<(&MatchedElement, (f64, f64))> = self
            .elements
            .iter()
            .filter(|element| element.page_number > 0)
            .map(|element| (element, reading_position(element)))
            .collect();
        ordered.sort_by(|(a, pos_a), (b, pos_b)| {
            a.page_number
                .cmp(&b.page_number)
                .then(pos_a.0.total_cmp(&pos_b.0))
                .then(pos_a.1.total_cmp(&pos_b.1))
        });
        ordered
            .into_iter()
            .map(|(element, _)| element.element_id.clone())
            .collect()
    }
}

/// `(vertical, horizontal)` sort key, smaller is earlier
fn reading_position(element: &MatchedElement) -> (f64, f64) {
    if let Some(bbox) = element.pdf_box() {
        let bbox = bbox.normalized();
        return (-bbox.y1, bbox.x0);
    }
    if let Some(bbox) = element.pixel_box() {
        let bbox = bbox.normalized();
        return (bbox.y0, bbox.x0);
    }
    (f64::INFINITY, f64::INFINITY)
}
