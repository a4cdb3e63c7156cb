//! Painting overlay boxes into RGB images

use image::{Rgb, RgbImage};

use super::OverlayBox;

/// Colours and stroke used when painting boxes
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayStyle {
    pub outline: [u8; 3],
    pub highlight: [u8; 3],
    /// Stroke width in target pixels
    pub thickness: u32,
    /// Opacity of the fill behind a highlighted box
    pub fill_alpha: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            outline: [0x3B, 0x82, 0xF6],
            highlight: [0xF5, 0x9E, 0x0B],
            thickness: 2,
            fill_alpha: 0.35,
        }
    }
}

/// Paint `boxes` onto `img`.
///
/// `factor` converts viewport pixels to image pixels (1.0 when painting on
/// the full render). Boxes are clipped to the image.
pub fn paint_overlay(
    img: &mut RgbImage,
    boxes: &[OverlayBox],
    factor: f64,
    style: &OverlayStyle,
) {
    for overlay_box in boxes {
        let Some(area) = PixelArea::clip(img, overlay_box, factor) else {
            continue;
        };

        if overlay_box.highlighted {
            fill(img, &area, style.highlight, style.fill_alpha);
            stroke(img, &area, style.highlight, style.thickness.saturating_add(1));
        } else {
            stroke(img, &area, style.outline, style.thickness);
        }
    }
}

/// Half-open pixel span `[x0, x1) x [y0, y1)`
struct PixelArea {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl PixelArea {
    fn clip(img: &RgbImage, overlay_box: &OverlayBox, factor: f64) -> Option<Self> {
        let rect = overlay_box.rect.scaled(factor);
        let (width, height) = img.dimensions();
        let max_x = f64::from(width);
        let max_y = f64::from(height);

        let x0 = rect.left.floor().clamp(0.0, max_x);
        let y0 = rect.top.floor().clamp(0.0, max_y);
        // Keep at least one pixel so tiny boxes stay visible
        let x1 = rect.right().ceil().max(x0 + 1.0).clamp(0.0, max_x);
        let y1 = rect.bottom().ceil().max(y0 + 1.0).clamp(0.0, max_y);

        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some(Self {
            x0: x0 as u32,
            y0: y0 as u32,
            x1: x1 as u32,
            y1: y1 as u32,
        })
    }
}

fn fill(img: &mut RgbImage, area: &PixelArea, color: [u8; 3], alpha: f32) {
    let alpha = alpha.clamp(0.0, 1.0);
    for y in area.y0..area.y1 {
        for x in area.x0..area.x1 {
            let px = img.get_pixel_mut(x, y);
            for (channel, &target) in px.0.iter_mut().zip(color.iter()) {
                let blended = f32::from(*channel) * (1.0 - alpha) + f32::from(target) * alpha;
                *channel = blended.round() as u8;
            }
        }
    }
}

fn stroke(img: &mut RgbImage, area: &PixelArea, color: [u8; 3], thickness: u32) {
    let t = thickness.max(1);
    for y in area.y0..area.y1 {
        for x in area.x0..area.x1 {
            let on_edge =
                x < area.x0 + t || x + t >= area.x1 || y < area.y0 + t || y + t >= area.y1;
            if on_edge {
                img.put_pixel(x, y, Rgb(color));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::Rect;

    fn overlay_box(left: f64, top: f64, width: f64, height: f64, highlighted: bool) -> OverlayBox {
        OverlayBox {
            element_id: "e".into(),
            page_number: 1,
            rect: Rect {
                left,
                top,
                width,
                height,
            },
            highlighted,
        }
    }

    #[test]
    fn outline_leaves_interior_untouched() {
        let mut img = RgbImage::from_pixel(20, 20, Rgb([255, 255, 255]));
        let style = OverlayStyle::default();
        paint_overlay(&mut img, &[overlay_box(2.0, 2.0, 10.0, 10.0, false)], 1.0, &style);

        assert_eq!(img.get_pixel(2, 2).0, style.outline);
        assert_eq!(img.get_pixel(7, 7).0, [255, 255, 255]);
        assert_eq!(img.get_pixel(15, 15).0, [255, 255, 255]);
    }

    #[test]
    fn highlighted_box_is_filled() {
        let mut img = RgbImage::from_pixel(20, 20, Rgb([255, 255, 255]));
        let style = OverlayStyle::default();
        paint_overlay(&mut img, &[overlay_box(2.0, 2.0, 10.0, 10.0, true)], 1.0, &style);

        assert_ne!(img.get_pixel(7, 7).0, [255, 255, 255]);
    }

    #[test]
    fn boxes_are_scaled_and_clipped() {
        let mut img = RgbImage::from_pixel(10, 10, Rgb([0, 0, 0]));
        let style = OverlayStyle::default();
        paint_overlay(&mut img, &[overlay_box(10.0, 10.0, 100.0, 100.0, false)], 0.5, &style);

        assert_eq!(img.get_pixel(5, 5).0, style.outline);
        assert_eq!(img.get_pixel(4, 4).0, [0, 0, 0]);

        // Entirely outside: nothing painted, no panic
        paint_overlay(&mut img, &[overlay_box(500.0, 500.0, 10.0, 10.0, false)], 1.0, &style);
    }
}
