//! Highlight overlay for the displayed page

pub mod mapper;
mod paint;

use std::collections::HashMap;

use log::debug;

use crate::matches::{ElementId, MatchIndex, PageRasterInfo};
use crate::pdf::PageData;

pub use mapper::{map_element, Rect};
pub use paint::{paint_overlay, OverlayStyle};

/// One drawable box on the displayed page
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayBox {
    pub element_id: ElementId,
    pub page_number: usize,
    /// Viewport pixels of the displayed render
    pub rect: Rect,
    pub highlighted: bool,
}

/// Map every element of the displayed page.
///
/// Elements that cannot be mapped are left out; the rest are still drawn.
#[must_use]
pub fn build_overlay(
    index: &MatchIndex,
    page: &PageData,
    rasters: &HashMap<usize, PageRasterInfo>,
    highlighted: Option<&ElementId>,
) -> Vec<OverlayBox> {
    let page_number = page.page_number();
    let raster = rasters.get(&page_number);
    let base_height = Some(page.handle.base_height());

    index
        .for_page(page_number)
        .into_iter()
        .filter_map(|element| {
            let Some(rect) = map_element(element, &page.viewport, base_height, raster) else {
                debug!(
                    "No usable coordinates for element {} on page {page_number}",
                    element.element_id
                );
                return None;
            };
            Some(OverlayBox {
                element_id: element.element_id.clone(),
                page_number,
                rect,
                highlighted: highlighted == Some(&element.element_id),
            })
        })
        .collect()
}

/// Topmost box under a viewport-pixel position (later boxes draw on top)
#[must_use]
pub fn hit_test(boxes: &[OverlayBox], x: f64, y: f64) -> Option<&OverlayBox> {
    boxes.iter().rev().find(|b| b.rect.contains(x, y))
}
