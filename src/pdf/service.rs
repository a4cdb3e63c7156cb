//! Render service - manages the document session, workers and cache

use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use flume::{Receiver, Sender};
use log::{debug, info, warn};
use tempfile::NamedTempFile;

use super::backend::DocumentBackend;
use super::cache::{CacheKey, PageCache};
use super::request::{Generation, LoadError, RenderError, RenderRequest, RenderResponse};
use super::types::{PageData, DEFAULT_RENDER_SCALE};
use super::worker::{render_worker, WorkerSetup};
use super::{DEFAULT_CACHE_SIZE, DEFAULT_PREFETCH_RADIUS, DEFAULT_WORKERS};

/// Tuning for a [`RenderService`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderConfig {
    /// Session-wide display scale
    pub scale: f32,
    pub workers: usize,
    pub cache_size: usize,
    /// Pages on each side of the current page to render ahead
    pub prefetch_radius: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_RENDER_SCALE,
            workers: DEFAULT_WORKERS,
            cache_size: DEFAULT_CACHE_SIZE,
            prefetch_radius: DEFAULT_PREFETCH_RADIUS,
        }
    }
}

/// Render outcome that is still current when polled
#[derive(Debug)]
pub enum RenderEvent {
    Loaded { page_count: usize },
    LoadFailed(LoadError),
    PageReady(Arc<PageData>),
    PageFailed { page_number: usize, error: RenderError },
}

/// One loaded document: staged bytes, worker queue and page cache.
///
/// Dropping the session stops its workers and deletes the staged file.
struct DocumentSession {
    staged: NamedTempFile,
    request_tx: Sender<RenderRequest>,
    cache: Arc<Mutex<PageCache>>,
    load_generation: Generation,
    page_count: Option<usize>,
    num_workers: usize,
}

impl Drop for DocumentSession {
    fn drop(&mut self) {
        for _ in 0..self.num_workers {
            let _ = self.request_tx.send(RenderRequest::Shutdown);
        }
        debug!("Released staged document {:?}", self.staged.path());
    }
}

/// Loads documents and renders their pages on worker threads.
///
/// Results are only handed out by [`poll`](Self::poll) and
/// [`wait`](Self::wait), and only while their generation is current.
pub struct RenderService<B: DocumentBackend> {
    backend: B,
    config: RenderConfig,
    session: Option<DocumentSession>,
    response_tx: Sender<RenderResponse>,
    response_rx: Receiver<RenderResponse>,
    next_generation: u64,
    latest_render: Option<Generation>,
    render_pending: bool,
    prefetch_in_flight: HashMap<usize, Generation>,
}

impl<B: DocumentBackend> RenderService<B> {
    /// Create a render service with custom configuration
    #[must_use]
    pub fn with_config(backend: B, config: RenderConfig) -> Self {
        let (response_tx, response_rx) = flume::unbounded();
        Self {
            backend,
            config,
            session: None,
            response_tx,
            response_rx,
            next_generation: 1,
            latest_render: None,
            render_pending: false,
            prefetch_in_flight: HashMap::new(),
        }
    }

    /// Start loading a document.
    ///
    /// Any previous document is released first, so its in-flight renders can
    /// no longer be applied. Opening happens on a worker; the outcome arrives
    /// as [`RenderEvent::Loaded`] or [`RenderEvent::LoadFailed`].
    pub fn load(&mut self, bytes: &[u8]) -> Result<Generation, LoadError> {
        self.unload();

        if bytes.is_empty() {
            return Err(LoadError::Empty);
        }

        let mut staged = tempfile::Builder::new()
            .prefix("pagelight-")
            .suffix(".pdf")
            .tempfile()?;
        staged.write_all(bytes)?;
        staged.flush()?;

        let load_generation = self.next_generation();
        let cache = Arc::new(Mutex::new(PageCache::new(self.config.cache_size)));

        // flume gives MPMC: every worker pulls from the same request queue.
        let (request_tx, request_rx) = flume::unbounded();
        let num_workers = self.config.workers.max(1);

        for worker_idx in 0..num_workers {
            let setup = WorkerSetup {
                backend: self.backend.clone(),
                load_generation,
                reports_info: worker_idx == 0,
                cache: cache.clone(),
            };
            let path = staged.path().to_path_buf();
            let rx = request_rx.clone();
            let tx = self.response_tx.clone();

            std::thread::spawn(move || {
                render_worker(setup, &path, rx, tx);
            });
        }

        info!(
            "Loading document ({} bytes, generation {}, {num_workers} workers)",
            bytes.len(),
            load_generation.0
        );

        self.session = Some(DocumentSession {
            staged,
            request_tx,
            cache,
            load_generation,
            page_count: None,
            num_workers,
        });

        Ok(load_generation)
    }

    /// Release the current document, discarding every in-flight render
    pub fn unload(&mut self) {
        if self.session.take().is_some() {
            debug!("Unloaded document");
        }
        self.latest_render = None;
        self.render_pending = false;
        self.prefetch_in_flight.clear();
    }

    /// Whether a document session exists (loading or loaded)
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.session.is_some()
    }

    /// Page count, once the document finished opening
    #[must_use]
    pub fn page_count(&self) -> Option<usize> {
        self.session.as_ref().and_then(|s| s.page_count)
    }

    /// Whether the latest display render has not answered yet
    #[must_use]
    pub fn is_rendering(&self) -> bool {
        self.render_pending
    }

    /// Request `page_number` (1-indexed) for display.
    ///
    /// Supersedes any display render still in flight.
    pub fn request_page(&mut self, page_number: usize) -> Result<Generation, RenderError> {
        let page_count = self.page_count().ok_or(RenderError::NotLoaded)?;
        if page_number == 0 || page_number > page_count {
            return Err(RenderError::PageOutOfRange {
                page_number,
                page_count,
            });
        }

        let generation = self.next_generation();
        let scale = self.config.scale;
        self.send(RenderRequest::Page {
            generation,
            page_number,
            scale,
        });
        self.latest_render = Some(generation);
        self.render_pending = true;
        self.prefetch_in_flight.remove(&page_number);

        Ok(generation)
    }

    /// Queue neighbours of `page_number` that are neither cached nor in flight
    pub fn schedule_prefetch(&mut self, page_number: usize) {
        let Some(page_count) = self.page_count() else {
            return;
        };

        for offset in 1..=self.config.prefetch_radius {
            let after = page_number + offset;
            if after <= page_count {
                self.maybe_prefetch(after);
            }
            if page_number > offset {
                self.maybe_prefetch(page_number - offset);
            }
        }
    }

    fn maybe_prefetch(&mut self, page_number: usize) {
        if self.prefetch_in_flight.contains_key(&page_number) || self.is_page_cached(page_number)
        {
            return;
        }

        let generation = self.next_generation();
        let scale = self.config.scale;
        self.send(RenderRequest::Prefetch {
            generation,
            page_number,
            scale,
        });
        self.prefetch_in_flight.insert(page_number, generation);
    }

    /// Check if a page is cached at the session scale
    #[must_use]
    pub fn is_page_cached(&self, page_number: usize) -> bool {
        let Some(session) = &self.session else {
            return false;
        };
        let key = CacheKey::new(page_number, self.config.scale);
        session
            .cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains(&key)
    }

    /// Collect current results without blocking
    pub fn poll(&mut self) -> Vec<RenderEvent> {
        let mut events = vec![];
        while let Ok(response) = self.response_rx.try_recv() {
            if let Some(event) = self.accept(response) {
                events.push(event);
            }
        }
        events
    }

    /// Block up to `timeout` for the next response, then drain the queue.
    ///
    /// May return an empty list when only stale responses arrived.
    pub fn wait(&mut self, timeout: Duration) -> Vec<RenderEvent> {
        let mut events = vec![];
        if let Ok(response) = self.response_rx.recv_timeout(timeout) {
            if let Some(event) = self.accept(response) {
                events.push(event);
            }
        }
        events.extend(self.poll());
        events
    }

    fn accept(&mut self, response: RenderResponse) -> Option<RenderEvent> {
        let generation = response.generation();
        match response {
            RenderResponse::DocumentInfo { page_count, .. } => {
                let session = self.current_session(generation)?;
                session.page_count = Some(page_count);
                info!("Document loaded with {page_count} pages");
                Some(RenderEvent::Loaded { page_count })
            }

            RenderResponse::LoadFailed { error, .. } => {
                self.current_session(generation)?;
                warn!("Failed to load document: {error}");
                self.unload();
                Some(RenderEvent::LoadFailed(error))
            }

            RenderResponse::Page { data, .. } => {
                if self.latest_render != Some(generation) {
                    debug!(
                        "Discarding stale render of page {} (generation {})",
                        data.page_number(),
                        generation.0
                    );
                    return None;
                }
                self.render_pending = false;
                Some(RenderEvent::PageReady(data))
            }

            RenderResponse::Error {
                page_number, error, ..
            } => {
                if self.latest_render == Some(generation) {
                    self.render_pending = false;
                    return Some(RenderEvent::PageFailed { page_number, error });
                }
                self.finish_prefetch(page_number, generation);
                debug!("Discarding render error for page {page_number}: {error}");
                None
            }

            RenderResponse::Prefetched { page_number, .. } => {
                self.finish_prefetch(page_number, generation);
                None
            }
        }
    }

    fn current_session(&mut self, generation: Generation) -> Option<&mut DocumentSession> {
        match self.session.as_mut() {
            Some(session) if session.load_generation == generation => Some(session),
            _ => {
                debug!("Discarding response for stale load generation {}", generation.0);
                None
            }
        }
    }

    fn finish_prefetch(&mut self, page_number: usize, generation: Generation) {
        if self.prefetch_in_flight.get(&page_number) == Some(&generation) {
            self.prefetch_in_flight.remove(&page_number);
        }
    }

    fn send(&self, request: RenderRequest) {
        if let Some(session) = &self.session {
            let _ = session.request_tx.send(request);
        }
    }

    fn next_generation(&mut self) -> Generation {
        let generation = Generation::new(self.next_generation);
        self.next_generation += 1;
        generation
    }
}
