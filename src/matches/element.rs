//! Matched elements as produced by the extraction pipeline

use serde::{Deserialize, Deserializer, Serialize};

/// Opaque element identity
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ElementId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Axis-aligned box `[x0, y0, x1, y1]` in some source coordinate space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BBox {
    #[must_use]
    pub const fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Accepts exactly four finite numbers
    #[must_use]
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        let &[x0, y0, x1, y1] = values else {
            return None;
        };
        if values.iter().all(|v| v.is_finite()) {
            Some(Self { x0, y0, x1, y1 })
        } else {
            None
        }
    }

    /// Swap inverted edges so that `x0 <= x1` and `y0 <= y1`
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            x0: self.x0.min(self.x1),
            y0: self.y0.min(self.y1),
            x1: self.x0.max(self.x1),
            y1: self.y0.max(self.y1),
        }
    }

    #[must_use]
    pub fn to_array(self) -> [f64; 4] {
        [self.x0, self.y0, self.x1, self.y1]
    }
}

/// An element located on a page by the extraction pipeline.
///
/// Box fields keep whatever shape the pipeline sent; [`pdf_box`](Self::pdf_box)
/// and [`pixel_box`](Self::pixel_box) validate on access.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchedElement {
    pub element_id: ElementId,

    /// 1-indexed page the element was found on
    pub page_number: usize,

    /// Document points, origin bottom-left
    #[serde(
        default,
        deserialize_with = "lenient_box",
        skip_serializing_if = "Option::is_none"
    )]
    pub bbox_pdf: Option<Vec<f64>>,

    /// Raster pixels, origin top-left
    #[serde(
        default,
        deserialize_with = "lenient_box",
        skip_serializing_if = "Option::is_none"
    )]
    pub bbox_pixel: Option<Vec<f64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl MatchedElement {
    pub fn new(element_id: impl Into<ElementId>, page_number: usize) -> Self {
        Self {
            element_id: element_id.into(),
            page_number,
            bbox_pdf: None,
            bbox_pixel: None,
            label: None,
        }
    }

    #[must_use]
    pub fn with_pdf_box(mut self, bbox: [f64; 4]) -> Self {
        self.bbox_pdf = Some(bbox.to_vec());
        self
    }

    #[must_use]
    pub fn with_pixel_box(mut self, bbox: [f64; 4]) -> Self {
        self.bbox_pixel = Some(bbox.to_vec());
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Document-point box, if present and well-formed
    #[must_use]
    pub fn pdf_box(&self) -> Option<BBox> {
        self.bbox_pdf.as_deref().and_then(BBox::from_slice)
    }

    /// Raster-pixel box, if present and well-formed
    #[must_use]
    pub fn pixel_box(&self) -> Option<BBox> {
        self.bbox_pixel.as_deref().and_then(BBox::from_slice)
    }

    /// Label for display, falling back to the id
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(self.element_id.as_str())
    }
}

/// Dimensions of the image the pipeline rasterized a page into
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PageRasterInfo {
    #[serde(default)]
    pub width_px: Option<f64>,
    #[serde(default)]
    pub height_px: Option<f64>,
}

impl PageRasterInfo {
    #[must_use]
    pub fn new(width_px: f64, height_px: f64) -> Self {
        Self {
            width_px: Some(width_px),
            height_px: Some(height_px),
        }
    }

    /// Both dimensions, when present, finite and positive
    #[must_use]
    pub fn dimensions(&self) -> Option<(f64, f64)> {
        let usable = |v: Option<f64>| v.filter(|v| v.is_finite() && *v > 0.0);
        Some((usable(self.width_px)?, usable(self.height_px)?))
    }
}

/// Box arrays are taken as sent: a non-numeric entry becomes NaN so the box
/// fails validation later instead of failing the whole document.
fn lenient_box<'de, D>(deserializer: D) -> Result<Option<Vec<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::Array(items)) => Some(
            items
                .iter()
                .map(|item| item.as_f64().unwrap_or(f64::NAN))
                .collect(),
        ),
        Some(_) => Some(Vec::new()),
    })
}
