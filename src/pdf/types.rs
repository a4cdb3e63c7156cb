//! Core types for PDF rendering

/// Points per inch in PDF user space
pub const POINTS_PER_INCH: f64 = 72.0;

/// Device pixels per inch of the viewport (CSS reference pixel)
pub const PIXELS_PER_INCH: f64 = 96.0;

/// Viewport pixels per document point at scale 1.0
pub const POINT_TO_PIXEL: f64 = PIXELS_PER_INCH / POINTS_PER_INCH;

/// Session-wide display scale used when no setting overrides it
pub const DEFAULT_RENDER_SCALE: f32 = 1.5;

/// Current render of one page at the session scale.
///
/// Recreated every time the displayed page changes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Display scale the page was rendered at
    pub scale: f32,
    /// Rendered width in viewport pixels
    pub width_px: u32,
    /// Rendered height in viewport pixels
    pub height_px: u32,
}

impl Viewport {
    /// Viewport pixels per document point for this render
    #[must_use]
    pub fn point_ratio(&self) -> f64 {
        POINT_TO_PIXEL * f64::from(self.scale)
    }
}

/// Geometry of a loaded page in document points.
///
/// This is what the renderer hands out for coordinate queries: the page
/// measured at the reference unit scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageHandle {
    /// Page number (1-indexed)
    pub page_number: usize,
    /// Page width in points
    pub width_pt: f32,
    /// Page height in points
    pub height_pt: f32,
}

impl PageHandle {
    /// Page height in document points, used to flip the vertical axis
    #[must_use]
    pub fn base_height(&self) -> f64 {
        f64::from(self.height_pt)
    }

    /// Viewport this page gets when rendered at `scale`
    #[must_use]
    pub fn viewport_at(&self, scale: f32) -> Viewport {
        let mag = POINT_TO_PIXEL * f64::from(scale);
        Viewport {
            scale,
            width_px: (f64::from(self.width_pt) * mag).round().max(1.0) as u32,
            height_px: (f64::from(self.height_pt) * mag).round().max(1.0) as u32,
        }
    }
}

/// Decoded bitmap of a rendered page.
///
/// RGB, 3 bytes per pixel, rows packed without padding.
#[derive(Clone, PartialEq, Eq)]
pub struct RasterSurface {
    /// Raw RGB pixel data
    pub pixels: Vec<u8>,
    /// Surface width in pixels
    pub width_px: u32,
    /// Surface height in pixels
    pub height_px: u32,
}

impl RasterSurface {
    /// A surface filled with a single colour
    #[must_use]
    pub fn filled(width_px: u32, height_px: u32, rgb: [u8; 3]) -> Self {
        let len = width_px as usize * height_px as usize;
        let mut pixels = Vec::with_capacity(len * 3);
        for _ in 0..len {
            pixels.extend_from_slice(&rgb);
        }
        Self {
            pixels,
            width_px,
            height_px,
        }
    }

    /// Convert into an `image` buffer for resizing and painting
    #[must_use]
    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        image::RgbImage::from_raw(self.width_px, self.height_px, self.pixels.clone())
    }
}

impl std::fmt::Debug for RasterSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterSurface")
            .field("width_px", &self.width_px)
            .field("height_px", &self.height_px)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Complete rendered page data
#[derive(Clone, Debug)]
pub struct PageData {
    /// Viewport the page was rendered into
    pub viewport: Viewport,
    /// Page geometry for coordinate queries
    pub handle: PageHandle,
    /// Rendered pixels
    pub surface: RasterSurface,
}

impl PageData {
    /// Page number (1-indexed)
    #[must_use]
    pub fn page_number(&self) -> usize {
        self.handle.page_number
    }
}
