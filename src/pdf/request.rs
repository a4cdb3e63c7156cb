//! Render request and response types

use std::sync::Arc;

use super::types::PageData;

/// Render generation attached to every load and page request.
///
/// Strictly increasing over the life of a [`super::RenderService`]; a
/// response is applied only while its generation is still the latest one
/// issued for its kind of request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

impl Generation {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Request sent to render workers
#[derive(Debug)]
pub enum RenderRequest {
    /// Render a page for display (high priority)
    Page {
        generation: Generation,
        page_number: usize,
        scale: f32,
    },

    /// Render a page into the cache only (low priority)
    Prefetch {
        generation: Generation,
        page_number: usize,
        scale: f32,
    },

    /// Shutdown the worker
    Shutdown,
}

/// Document could not be loaded
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("document is empty")]
    Empty,

    #[error("failed to stage document: {0}")]
    Staging(#[from] std::io::Error),

    #[cfg(feature = "pdf")]
    #[error("PDF engine: {0}")]
    Pdf(#[from] mupdf::error::Error),

    #[error("document has no pages")]
    NoPages,

    #[error("{detail}")]
    Unreadable { detail: String },
}

impl LoadError {
    pub fn unreadable(msg: impl Into<String>) -> Self {
        Self::Unreadable { detail: msg.into() }
    }
}

/// A single page could not be rasterized
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no document loaded")]
    NotLoaded,

    #[error("page {page_number} is out of range (document has {page_count} pages)")]
    PageOutOfRange {
        page_number: usize,
        page_count: usize,
    },

    #[cfg(feature = "pdf")]
    #[error("PDF engine: {0}")]
    Pdf(#[from] mupdf::error::Error),

    #[error("{detail}")]
    Generic { detail: String },
}

impl RenderError {
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic { detail: msg.into() }
    }
}

/// Response from render workers
#[derive(Debug)]
pub enum RenderResponse {
    /// Document opened (sent once per load by the first worker)
    DocumentInfo {
        generation: Generation,
        page_count: usize,
    },

    /// Document could not be opened
    LoadFailed {
        generation: Generation,
        error: LoadError,
    },

    /// Rendered page data
    Page {
        generation: Generation,
        data: Arc<PageData>,
    },

    /// Page landed in the cache
    Prefetched {
        generation: Generation,
        page_number: usize,
    },

    /// Error during rendering
    Error {
        generation: Generation,
        page_number: usize,
        error: RenderError,
    },
}

impl RenderResponse {
    #[must_use]
    pub fn generation(&self) -> Generation {
        match self {
            Self::DocumentInfo { generation, .. }
            | Self::LoadFailed { generation, .. }
            | Self::Page { generation, .. }
            | Self::Prefetched { generation, .. }
            | Self::Error { generation, .. } => *generation,
        }
    }
}
