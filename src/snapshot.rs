//! Headless render of one page with its overlay into a PNG

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use image::{ImageFormat, RgbImage};
use log::info;

use crate::matches::ElementId;
use crate::overlay::{OverlayBox, OverlayStyle, paint_overlay};
use crate::pdf::{DocumentBackend, PageData, Phase};
use crate::viewer::Viewer;

/// What to capture once the document is open
#[derive(Clone, Debug, Default)]
pub struct SnapshotRequest {
    /// Page to show; ignored when `highlight` is set
    pub page: Option<usize>,
    /// Element to highlight; its page is shown
    pub highlight: Option<ElementId>,
}

/// Full-resolution render with overlay boxes painted on top
#[must_use]
pub fn compose_snapshot(
    page: &PageData,
    boxes: &[OverlayBox],
    style: &OverlayStyle,
) -> Option<RgbImage> {
    let mut image = page.surface.to_rgb_image()?;
    paint_overlay(&mut image, boxes, 1.0, style);
    Some(image)
}

/// Drive `viewer` to the requested page and write it to `output`.
///
/// The document must already be opened on `viewer`.
pub fn write_snapshot<B: DocumentBackend>(
    viewer: &mut Viewer<B>,
    request: &SnapshotRequest,
    style: &OverlayStyle,
    output: &Path,
    timeout: Duration,
) -> Result<()> {
    if !viewer.settle(timeout) {
        bail!("timed out waiting for the document to load");
    }
    if viewer.phase() == Phase::Unloaded {
        bail!(
            "document could not be loaded: {}",
            viewer.last_error().unwrap_or("unknown error")
        );
    }

    if let Some(element_id) = &request.highlight {
        viewer.highlight_external(element_id);
        if viewer.highlighted() != Some(element_id) {
            bail!("no match with id {element_id}");
        }
    } else if let Some(page) = request.page {
        viewer.select_page(page);
    }

    if !viewer.settle(timeout) {
        bail!("timed out waiting for page {}", viewer.current_page());
    }
    if viewer.phase() == Phase::RenderFailed {
        bail!(
            "page {} failed to render: {}",
            viewer.current_page(),
            viewer.last_error().unwrap_or("unknown error")
        );
    }

    let page = viewer
        .displayed()
        .context("no page is displayed")?;
    let boxes = viewer.overlay();
    let image = compose_snapshot(page, &boxes, style).context("page surface is malformed")?;
    image
        .save_with_format(output, ImageFormat::Png)
        .with_context(|| format!("writing snapshot to {output:?}"))?;

    info!(
        "Wrote page {} with {} boxes to {output:?}",
        page.page_number(),
        boxes.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::matches::MatchedElement;
    use crate::pdf::RenderConfig;
    use crate::test_utils::{FakeBackend, FakePdf};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn viewer(pdf: &FakePdf) -> Viewer<FakeBackend> {
        let mut viewer = Viewer::new(FakeBackend, RenderConfig::default());
        viewer.set_matches(
            vec![
                MatchedElement::new("a", 1).with_pdf_box([72.0, 72.0, 144.0, 144.0]),
                MatchedElement::new("b", 2).with_pdf_box([0.0, 0.0, 306.0, 396.0]),
            ],
            HashMap::new(),
            vec!["a".into(), "b".into()],
        );
        viewer.open_document(&pdf.to_bytes()).unwrap();
        viewer
    }

    #[test]
    fn highlighted_snapshot_shows_element_page() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("page.png");
        let mut viewer = viewer(&FakePdf::new(3));
        let style = OverlayStyle::default();
        let request = SnapshotRequest {
            page: None,
            highlight: Some("b".into()),
        };

        write_snapshot(&mut viewer, &request, &style, &output, TIMEOUT).unwrap();

        let image = image::open(&output).unwrap().to_rgb8();
        assert_eq!(image.dimensions(), (1224, 1584));
        // Bottom-left quarter of the page is the highlighted box
        assert_eq!(image.get_pixel(0, 1583).0, style.highlight);
        assert_eq!(image.get_pixel(1000, 100).0, [255, 255, 255]);
    }

    #[test]
    fn unknown_highlight_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut viewer = viewer(&FakePdf::new(3));
        let request = SnapshotRequest {
            page: None,
            highlight: Some("zzz".into()),
        };
        let result = write_snapshot(
            &mut viewer,
            &request,
            &OverlayStyle::default(),
            &dir.path().join("x.png"),
            TIMEOUT,
        );
        assert!(result.is_err());
    }

    #[test]
    fn failing_page_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut viewer = viewer(&FakePdf::new(3).failing(2));
        let request = SnapshotRequest {
            page: Some(2),
            highlight: None,
        };
        let err = write_snapshot(
            &mut viewer,
            &request,
            &OverlayStyle::default(),
            &dir.path().join("x.png"),
            TIMEOUT,
        )
        .unwrap_err();
        assert!(err.to_string().contains("page 2"));
    }
}
