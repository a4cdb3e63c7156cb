//! Bounding box to viewport transformation
//!
//! Two source spaces are supported:
//!
//! - document points (`bbox_pdf`), origin bottom-left, 1/72 inch per unit;
//! - raster pixels (`bbox_pixel`), origin top-left, in the pipeline's own
//!   rasterization of the page.
//!
//! Both end up in viewport pixels, origin top-left. Document points are
//! preferred whenever they can be used.

use crate::matches::{BBox, MatchedElement, PageRasterInfo};
use crate::pdf::Viewport;

/// Rectangle in viewport pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Whether the point lies inside (edges included)
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right() && y >= self.top && y <= self.bottom()
    }

    /// Scale every coordinate by `factor`
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            left: self.left * factor,
            top: self.top * factor,
            width: self.width * factor,
            height: self.height * factor,
        }
    }
}

/// Map an element onto the current viewport.
///
/// `base_page_height` is the page height in document points; `raster` is the
/// pipeline's raster size for the element's page. Returns `None` when neither
/// source box can be used, which means "do not draw", not an error.
#[must_use]
pub fn map_element(
    element: &MatchedElement,
    viewport: &Viewport,
    base_page_height: Option<f64>,
    raster: Option<&PageRasterInfo>,
) -> Option<Rect> {
    if let (Some(bbox), Some(height)) = (element.pdf_box(), base_page_height) {
        return Some(map_pdf_box(bbox, viewport, height));
    }

    let bbox = element.pixel_box()?;
    let (raster_width, raster_height) = raster?.dimensions()?;
    Some(map_pixel_box(bbox, viewport, raster_width, raster_height))
}

/// Document points to viewport pixels, flipping the vertical axis
#[must_use]
pub fn map_pdf_box(bbox: BBox, viewport: &Viewport, base_page_height: f64) -> Rect {
    let bbox = bbox.normalized();
    let ratio = viewport.point_ratio();

    let left = bbox.x0 * ratio;
    let right = bbox.x1 * ratio;
    let top = (base_page_height - bbox.y1) * ratio;
    let bottom = (base_page_height - bbox.y0) * ratio;

    Rect {
        left,
        top,
        width: right - left,
        height: bottom - top,
    }
}

/// Raster pixels to viewport pixels, scaling each axis independently
#[must_use]
pub fn map_pixel_box(
    bbox: BBox,
    viewport: &Viewport,
    raster_width: f64,
    raster_height: f64,
) -> Rect {
    let bbox = bbox.normalized();
    let scale_x = f64::from(viewport.width_px) / raster_width;
    let scale_y = f64::from(viewport.height_px) / raster_height;

    Rect {
        left: bbox.x0 * scale_x,
        top: bbox.y0 * scale_y,
        width: (bbox.x1 - bbox.x0) * scale_x,
        height: (bbox.y1 - bbox.y0) * scale_y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_rect(rect: Rect, left: f64, top: f64, width: f64, height: f64) {
        assert!((rect.left - left).abs() < EPS, "left {} != {left}", rect.left);
        assert!((rect.top - top).abs() < EPS, "top {} != {top}", rect.top);
        assert!(
            (rect.width - width).abs() < EPS,
            "width {} != {width}",
            rect.width
        );
        assert!(
            (rect.height - height).abs() < EPS,
            "height {} != {height}",
            rect.height
        );
    }

    fn letter_viewport() -> Viewport {
        Viewport {
            scale: 1.5,
            width_px: 1224,
            height_px: 1584,
        }
    }

    #[test]
    fn pdf_box_on_letter_page() {
        let element = MatchedElement::new("e", 1).with_pdf_box([72.0, 72.0, 144.0, 144.0]);
        let rect = map_element(&element, &letter_viewport(), Some(792.0), None).unwrap();
        assert_rect(rect, 144.0, 1296.0, 144.0, 144.0);
    }

    #[test]
    fn pixel_box_rescaled_per_axis() {
        let viewport = Viewport {
            scale: 1.5,
            width_px: 750,
            height_px: 1050,
        };
        let raster = PageRasterInfo::new(1000.0, 1400.0);
        let element = MatchedElement::new("e", 1).with_pixel_box([100.0, 100.0, 200.0, 300.0]);
        let rect = map_element(&element, &viewport, None, Some(&raster)).unwrap();
        assert_rect(rect, 75.0, 75.0, 75.0, 150.0);
    }

    #[test]
    fn pdf_box_wins_over_pixel_box() {
        // Deliberately inconsistent boxes: the pixel one would land at the origin
        let element = MatchedElement::new("e", 1)
            .with_pdf_box([72.0, 72.0, 144.0, 144.0])
            .with_pixel_box([0.0, 0.0, 10.0, 10.0]);
        let raster = PageRasterInfo::new(1224.0, 1584.0);
        let rect = map_element(&element, &letter_viewport(), Some(792.0), Some(&raster)).unwrap();
        assert_rect(rect, 144.0, 1296.0, 144.0, 144.0);
    }

    #[test]
    fn falls_back_to_pixel_box_without_page_height() {
        let element = MatchedElement::new("e", 1)
            .with_pdf_box([72.0, 72.0, 144.0, 144.0])
            .with_pixel_box([0.0, 0.0, 10.0, 10.0]);
        let raster = PageRasterInfo::new(1224.0, 1584.0);
        let rect = map_element(&element, &letter_viewport(), None, Some(&raster)).unwrap();
        assert_rect(rect, 0.0, 0.0, 10.0, 10.0);
    }

    #[test]
    fn falls_back_to_pixel_box_when_pdf_box_malformed() {
        let mut element = MatchedElement::new("e", 1).with_pixel_box([0.0, 0.0, 10.0, 10.0]);
        element.bbox_pdf = Some(vec![1.0, 2.0, 3.0]);
        let raster = PageRasterInfo::new(1224.0, 1584.0);
        let rect = map_element(&element, &letter_viewport(), Some(792.0), Some(&raster));
        assert!(rect.is_some());
    }

    #[test]
    fn nothing_usable_maps_to_none() {
        let bare = MatchedElement::new("e", 1);
        assert!(map_element(&bare, &letter_viewport(), Some(792.0), None).is_none());

        let pixel_only = MatchedElement::new("e", 1).with_pixel_box([0.0, 0.0, 10.0, 10.0]);
        assert!(map_element(&pixel_only, &letter_viewport(), Some(792.0), None).is_none());

        let zero_raster = PageRasterInfo::new(0.0, 0.0);
        assert!(
            map_element(&pixel_only, &letter_viewport(), None, Some(&zero_raster)).is_none()
        );

        let pdf_only = MatchedElement::new("e", 1).with_pdf_box([0.0, 0.0, 10.0, 10.0]);
        assert!(map_element(&pdf_only, &letter_viewport(), None, None).is_none());
    }

    #[test]
    fn inverted_boxes_are_normalized() {
        let element = MatchedElement::new("e", 1).with_pdf_box([144.0, 144.0, 72.0, 72.0]);
        let rect = map_element(&element, &letter_viewport(), Some(792.0), None).unwrap();
        assert_rect(rect, 144.0, 1296.0, 144.0, 144.0);

        let viewport = Viewport {
            scale: 1.5,
            width_px: 750,
            height_px: 1050,
        };
        let raster = PageRasterInfo::new(1000.0, 1400.0);
        let element = MatchedElement::new("e", 1).with_pixel_box([200.0, 300.0, 100.0, 100.0]);
        let rect = map_element(&element, &viewport, None, Some(&raster)).unwrap();
        assert_rect(rect, 75.0, 75.0, 75.0, 150.0);
    }

    #[test]
    fn mapping_is_deterministic() {
        let element = MatchedElement::new("e", 1).with_pdf_box([10.5, 20.25, 30.0, 40.0]);
        let a = map_element(&element, &letter_viewport(), Some(792.0), None);
        let b = map_element(&element, &letter_viewport(), Some(792.0), None);
        assert_eq!(a, b);
    }

    #[test]
    fn rect_contains_edges() {
        let rect = Rect {
            left: 10.0,
            top: 10.0,
            width: 5.0,
            height: 5.0,
        };
        assert!(rect.contains(10.0, 15.0));
        assert!(!rect.contains(15.1, 12.0));
        assert_eq!(rect.scaled(2.0).right(), 30.0);
    }
}
