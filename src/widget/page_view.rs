//! Page preview drawn with half-block cells
//!
//! Each terminal cell shows two vertically stacked pixels: the upper one as
//! the foreground of `▀`, the lower one as the background.

use image::RgbImage;
use image::imageops::{self, FilterType};
use log::debug;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Color;

use crate::overlay::{OverlayBox, OverlayStyle, paint_overlay};
use crate::pdf::PageData;

const UPPER_HALF_BLOCK: &str = "▀";

/// Where the fitted image landed last time it was drawn
#[derive(Clone, Copy, Debug, PartialEq)]
struct Placement {
    /// Top-left cell of the image
    x: u16,
    y: u16,
    /// Image size in half-block pixels
    width_px: u32,
    height_px: u32,
    /// Half-block pixels per viewport pixel
    factor: f64,
}

struct FittedPage {
    page_number: usize,
    viewport_size: (u32, u32),
    area_size: (u16, u16),
    boxes: Vec<OverlayBox>,
    style: OverlayStyle,
    image: RgbImage,
    factor: f64,
}

impl FittedPage {
    fn matches(
        &self,
        page: &PageData,
        area: Rect,
        boxes: &[OverlayBox],
        style: &OverlayStyle,
    ) -> bool {
        self.page_number == page.page_number()
            && self.viewport_size == (page.viewport.width_px, page.viewport.height_px)
            && self.area_size == (area.width, area.height)
            && self.boxes == boxes
            && self.style == *style
    }
}

/// Draws the displayed page and maps clicks back onto it.
///
/// The downscaled image is cached until the page, area, or boxes change.
#[derive(Default)]
pub struct PageView {
    fitted: Option<FittedPage>,
    placement: Option<Placement>,
}

impl PageView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(
        &mut self,
        buf: &mut Buffer,
        area: Rect,
        page: &PageData,
        boxes: &[OverlayBox],
        style: &OverlayStyle,
    ) {
        if area.width == 0 || area.height == 0 {
            self.placement = None;
            return;
        }

        let stale = !self
            .fitted
            .as_ref()
            .is_some_and(|fitted| fitted.matches(page, area, boxes, style));
        if stale {
            self.fitted = fit_page(page, area, boxes, style);
        }
        let Some(fitted) = &self.fitted else {
            self.placement = None;
            return;
        };

        let (width_px, height_px) = fitted.image.dimensions();
        let used_rows = height_px.div_ceil(2) as u16;
        let placement = Placement {
            x: area.x + (area.width.saturating_sub(width_px as u16)) / 2,
            y: area.y + (area.height.saturating_sub(used_rows)) / 2,
            width_px,
            height_px,
            factor: fitted.factor,
        };

        for row in 0..used_rows {
            for col in 0..width_px as u16 {
                let upper = fitted.image.get_pixel(u32::from(col), u32::from(row) * 2);
                let lower_y = u32::from(row) * 2 + 1;
                let lower = if lower_y < height_px {
                    *fitted.image.get_pixel(u32::from(col), lower_y)
                } else {
                    *upper
                };
                let cell = &mut buf[(placement.x + col, placement.y + row)];
                cell.set_symbol(UPPER_HALF_BLOCK)
                    .set_fg(to_color(upper.0))
                    .set_bg(to_color(lower.0));
            }
        }

        self.placement = Some(placement);
    }

    /// Viewport-pixel position under a terminal cell, if the cell shows
    /// part of the page
    #[must_use]
    pub fn cell_to_viewport(&self, column: u16, row: u16) -> Option<(f64, f64)> {
        let placement = self.placement?;
        let col = u32::from(column.checked_sub(placement.x)?);
        let row = u32::from(row.checked_sub(placement.y)?);
        if col >= placement.width_px || row * 2 >= placement.height_px {
            return None;
        }
        // Centre of the cell in half-block pixels
        let px = f64::from(col) + 0.5;
        let py = f64::from(row) * 2.0 + 1.0;
        Some((px / placement.factor, py / placement.factor))
    }

    /// Forget the cached image and placement
    pub fn reset(&mut self) {
        self.fitted = None;
        self.placement = None;
    }
}

fn fit_page(
    page: &PageData,
    area: Rect,
    boxes: &[OverlayBox],
    style: &OverlayStyle,
) -> Option<FittedPage> {
    let source = page.surface.to_rgb_image()?;
    let (vw, vh) = source.dimensions();
    if vw == 0 || vh == 0 {
        return None;
    }

    let max_w = f64::from(area.width);
    let max_h = f64::from(area.height) * 2.0;
    let factor = (max_w / f64::from(vw)).min(max_h / f64::from(vh));
    let width = ((f64::from(vw) * factor).floor() as u32).max(1);
    let height = ((f64::from(vh) * factor).floor() as u32).max(1);

    let mut image = imageops::resize(&source, width, height, FilterType::Triangle);
    paint_overlay(&mut image, boxes, factor, style);
    debug!(
        "Fitted page {} from {vw}x{vh} to {width}x{height}",
        page.page_number()
    );

    Some(FittedPage {
        page_number: page.page_number(),
        viewport_size: (vw, vh),
        area_size: (area.width, area.height),
        boxes: boxes.to_vec(),
        style: *style,
        image,
        factor,
    })
}

fn to_color([r, g, b]: [u8; 3]) -> Color {
    Color::Rgb(r, g, b)
}
