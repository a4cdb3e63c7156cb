//! PDF rendering infrastructure

mod backend;
mod cache;
#[cfg(feature = "pdf")]
mod mupdf_backend;
mod request;
mod service;
mod state;
mod types;
mod worker;

pub use backend::DocumentBackend;
pub use cache::{CacheKey, PageCache};
#[cfg(feature = "pdf")]
pub use mupdf_backend::MupdfBackend;
pub use request::{Generation, LoadError, RenderError, RenderRequest, RenderResponse};
pub use service::{RenderConfig, RenderEvent, RenderService};
pub use state::{Command, Effect, Phase, ViewerState};
pub use types::*;

/// Render worker threads per document
pub const DEFAULT_WORKERS: usize = 2;
/// Rendered pages kept per document
pub const DEFAULT_CACHE_SIZE: usize = 8;
/// Pages rendered ahead on each side of the current page
pub const DEFAULT_PREFETCH_RADIUS: usize = 1;
