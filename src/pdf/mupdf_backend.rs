//! MuPDF-backed page rendering

use std::path::Path;

use mupdf::{Colorspace, Document, Matrix, Pixmap};

use super::backend::DocumentBackend;
use super::request::{LoadError, RenderError};
use super::types::{PageData, PageHandle, RasterSurface, Viewport, POINT_TO_PIXEL};

/// Renders pages with MuPDF
#[derive(Clone, Copy, Debug, Default)]
pub struct MupdfBackend;

impl DocumentBackend for MupdfBackend {
    type Document = Document;

    fn open(&self, path: &Path) -> Result<Document, LoadError> {
        Ok(Document::open(path.to_string_lossy().as_ref())?)
    }

    fn page_count(&self, doc: &Document) -> Result<usize, LoadError> {
        let count = doc.page_count()?;
        Ok(count.max(0) as usize)
    }

    fn render_page(
        &self,
        doc: &Document,
        page_number: usize,
        scale: f32,
    ) -> Result<PageData, RenderError> {
        let index = page_number
            .checked_sub(1)
            .ok_or_else(|| RenderError::generic("page numbers start at 1"))?;
        let page = doc.load_page(index as i32)?;

        let bounds = page.bounds()?;
        let handle = PageHandle {
            page_number,
            width_pt: bounds.x1 - bounds.x0,
            height_pt: bounds.y1 - bounds.y0,
        };

        let mag = (POINT_TO_PIXEL * f64::from(scale)) as f32;
        let rgb = Colorspace::device_rgb();
        let pixmap = page.to_pixmap(&Matrix::new_scale(mag, mag), &rgb, false, false)?;

        let pixels = pixmap_to_rgb(&pixmap)?;
        let viewport = Viewport {
            scale,
            width_px: pixmap.width(),
            height_px: pixmap.height(),
        };

        Ok(PageData {
            viewport,
            handle,
            surface: RasterSurface {
                pixels,
                width_px: viewport.width_px,
                height_px: viewport.height_px,
            },
        })
    }
}

fn pixmap_to_rgb(pixmap: &Pixmap) -> Result<Vec<u8>, RenderError> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(RenderError::generic(format!(
            "Unsupported pixmap format: {n} channels"
        )));
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = width * n;
    let expected_min = stride.saturating_mul(height);
    if samples.len() < expected_min || row_bytes > stride {
        return Err(RenderError::generic("Pixmap buffer size mismatch"));
    }

    let mut out = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        let row_start = y * stride;
        let row = &samples[row_start..row_start + row_bytes];
        if n == 3 {
            out.extend_from_slice(row);
        } else {
            for px in row.chunks_exact(n) {
                out.extend_from_slice(&px[..3]);
            }
        }
    }

    Ok(out)
}
