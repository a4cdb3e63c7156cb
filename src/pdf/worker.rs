//! PDF render worker - runs in separate thread(s)

use std::path::Path;
use std::sync::{Arc, Mutex};

use flume::{Receiver, Sender};
use log::{debug, warn};

use super::backend::DocumentBackend;
use super::cache::{CacheKey, PageCache};
use super::request::{Generation, RenderError, RenderRequest, RenderResponse};

/// Everything a worker needs besides its channels
pub struct WorkerSetup<B> {
    pub backend: B,
    /// Generation of the load this worker serves
    pub load_generation: Generation,
    /// Whether this worker reports document info (exactly one per load does)
    pub reports_info: bool,
    pub cache: Arc<Mutex<PageCache>>,
}

/// Main worker function - runs in a dedicated thread
#[expect(
    clippy::needless_pass_by_value,
    reason = "Values moved into thread, need ownership"
)]
pub fn render_worker<B: DocumentBackend>(
    setup: WorkerSetup<B>,
    doc_path: &Path,
    requests: Receiver<RenderRequest>,
    responses: Sender<RenderResponse>,
) {
    let WorkerSetup {
        backend,
        load_generation,
        reports_info,
        cache,
    } = setup;

    let opened = backend
        .open(doc_path)
        .and_then(|doc| backend.page_count(&doc).map(|count| (doc, count)));

    let (doc, page_count) = match opened {
        Ok((_, 0)) => {
            if reports_info {
                let _ = responses.send(RenderResponse::LoadFailed {
                    generation: load_generation,
                    error: super::LoadError::NoPages,
                });
            }
            return;
        }
        Ok(opened) => opened,
        Err(error) => {
            if reports_info {
                let _ = responses.send(RenderResponse::LoadFailed {
                    generation: load_generation,
                    error,
                });
            } else {
                debug!("Secondary worker could not open document: {error}");
            }
            return;
        }
    };

    if reports_info {
        let _ = responses.send(RenderResponse::DocumentInfo {
            generation: load_generation,
            page_count,
        });
    }

    for request in requests {
        match request {
            RenderRequest::Page {
                generation,
                page_number,
                scale,
            } => {
                let response = match render_cached(&backend, &doc, page_number, scale, &cache) {
                    Ok(data) => RenderResponse::Page { generation, data },
                    Err(error) => {
                        warn!("Failed to render page {page_number}: {error}");
                        RenderResponse::Error {
                            generation,
                            page_number,
                            error,
                        }
                    }
                };
                let _ = responses.send(response);
            }

            RenderRequest::Prefetch {
                generation,
                page_number,
                scale,
            } => {
                let response = match render_cached(&backend, &doc, page_number, scale, &cache) {
                    Ok(_) => RenderResponse::Prefetched {
                        generation,
                        page_number,
                    },
                    Err(error) => RenderResponse::Error {
                        generation,
                        page_number,
                        error,
                    },
                };
                let _ = responses.send(response);
            }

            RenderRequest::Shutdown => break,
        }
    }
}

fn render_cached<B: DocumentBackend>(
    backend: &B,
    doc: &B::Document,
    page_number: usize,
    scale: f32,
    cache: &Arc<Mutex<PageCache>>,
) -> Result<Arc<super::PageData>, RenderError> {
    let key = CacheKey::new(page_number, scale);

    let cached = cache
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .get(&key);
    if let Some(cached) = cached {
        return Ok(cached);
    }

    let data = backend.render_page(doc, page_number, scale)?;
    Ok(cache
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .insert(key, data))
}
