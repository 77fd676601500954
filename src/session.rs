//! Application-level controller: one document at a time, from file pick to
//! downloads.
//!
//! ```text
//!          open ok          Completed
//!  Idle ──────────▶ Processing ──────▶ Result
//!   ▲                  │  │              │
//!   │    Cancelled     │  │ error        │ open / reset
//!   └──────────────────┘  ▼              │
//!   ▲                   Error ◀──────────┘ (next open may fail)
//!   └──── reset ─────────┘
//! ```
//!
//! A [`Session`] owns the [`SelectionStore`] and drives a fresh
//! [`PagePipeline`] on a blocking worker for every file. The worker builds
//! its renderer through the session's [`RendererFactory`], so a pdfium
//! binding never leaves the thread that created it.

use crate::config::{ConversionConfig, DEFAULT_BASE_NAME};
use crate::download::{DownloadDispatcher, DownloadSink};
use crate::error::{AppError, Pdf2JpgError};
use crate::images::ImageStore;
use crate::output::{ConversionStats, ConvertedPage, PageId, ProcessingState, RunOutcome};
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::input::{base_name, resolve_local, validate_media_type};
use crate::pipeline::render::{PdfiumRenderer, RendererFactory};
use crate::pipeline::runner::PagePipeline;
use crate::progress::{ConversionProgressCallback, ProgressCallback};
use crate::selection::SelectionStore;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tracing::{debug, info, warn};

/// What the front end should be showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppStatus {
    /// Waiting for a file.
    Idle,
    /// A run is in progress; see [`Session::processing`].
    Processing,
    /// Pages are available for selection and download.
    Result,
    /// The last run failed; see [`Session::error`].
    Error,
}

/// Cancels whichever run is active when [`cancel`](Canceller::cancel) is
/// called. Cheap to clone and safe to use from any thread.
#[derive(Debug, Clone)]
pub struct Canceller {
    active: Arc<Mutex<CancelToken>>,
    processing: Arc<Mutex<ProcessingState>>,
}

impl Canceller {
    pub fn cancel(&self) {
        lock(&self.active).cancel();
    }

    /// Progress of the active run.
    pub fn processing(&self) -> ProcessingState {
        *lock(&self.processing)
    }
}

pub struct Session {
    config: ConversionConfig,
    renderer: RendererFactory,
    images: ImageStore,
    store: SelectionStore,
    status: AppStatus,
    processing: Arc<Mutex<ProcessingState>>,
    failure: Option<Pdf2JpgError>,
    base_name: String,
    active: Arc<Mutex<CancelToken>>,
    last_stats: Option<ConversionStats>,
}

impl Session {
    pub fn new(config: ConversionConfig, renderer: RendererFactory) -> Self {
        Self {
            config,
            renderer,
            images: ImageStore::new(),
            store: SelectionStore::new(),
            status: AppStatus::Idle,
            processing: Arc::new(Mutex::new(ProcessingState::default())),
            failure: None,
            base_name: DEFAULT_BASE_NAME.to_string(),
            active: Arc::new(Mutex::new(CancelToken::new())),
            last_stats: None,
        }
    }

    /// A session rendering with pdfium, bound from the default locations.
    pub fn with_pdfium(config: ConversionConfig) -> Self {
        Self::new(config, PdfiumRenderer::factory(None))
    }

    /// Open a local file. Its media type is derived from the extension.
    ///
    /// The run's cancel token is installed before the file is read, so a
    /// [`Canceller`] fired during the read stops this open.
    pub async fn open_path(&mut self, path: &Path) -> Result<AppStatus, Pdf2JpgError> {
        let file = resolve_local(path)?;
        let token = self.arm();
        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::PermissionDenied => Pdf2JpgError::PermissionDenied {
                    path: file.path.clone(),
                },
                _ => Pdf2JpgError::FileNotFound {
                    path: file.path.clone(),
                },
            })?;
        self.convert(token, &file.file_name, bytes).await
    }

    /// Convert an in-memory file.
    ///
    /// Returns `Err` only when the declared media type is not PDF; the
    /// session is left untouched in that case. Every other failure is
    /// recorded and reported through [`status`](Self::status) and
    /// [`error`](Self::error).
    ///
    /// Dropping the returned future cancels the run and puts the session
    /// back to `Idle`.
    pub async fn open_bytes(
        &mut self,
        file_name: &str,
        media_type: &str,
        bytes: Vec<u8>,
    ) -> Result<AppStatus, Pdf2JpgError> {
        validate_media_type(file_name, media_type)?;
        let token = self.arm();
        self.convert(token, file_name, bytes).await
    }

    /// Install a fresh token as the one [`Canceller`] targets.
    fn arm(&self) -> CancelToken {
        let token = CancelToken::new();
        *lock(&self.active) = token.clone();
        token
    }

    async fn convert(
        &mut self,
        token: CancelToken,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<AppStatus, Pdf2JpgError> {
        self.reset();
        if token.is_cancelled() {
            info!("Open of '{}' cancelled before conversion", file_name);
            return Ok(self.status);
        }
        self.base_name = base_name(file_name);
        self.status = AppStatus::Processing;

        let mut config = self.config.clone();
        config.progress_callback = Some(Arc::new(SessionProgress {
            processing: self.processing.clone(),
            token: token.clone(),
            inner: self.config.progress_callback.clone(),
        }));

        info!("Converting '{}' ({} bytes)", file_name, bytes.len());
        let start = Instant::now();
        let factory = self.renderer.clone();
        let images = self.images.clone();
        let source_name = self.base_name.clone();
        let worker_token = token.clone();

        let mut guard = RunGuard {
            session: &mut *self,
            token: token.clone(),
            armed: true,
        };
        let result = tokio::task::spawn_blocking(move || -> Result<RunOutcome, Pdf2JpgError> {
            let renderer = factory()?;
            let mut pipeline = PagePipeline::new(&*renderer, images, &config);
            let outcome = pipeline
                .load_document(bytes)
                .and_then(|_| pipeline.run(&source_name, &worker_token));
            pipeline.destroy();
            outcome
        })
        .await
        .map_err(|e| Pdf2JpgError::Internal(format!("conversion worker failed: {e}")))
        .and_then(|r| r);
        guard.armed = false;
        drop(guard);

        match result {
            Ok(RunOutcome::Completed(pages)) => {
                let stats = ConversionStats {
                    total_pages: pages.len(),
                    total_jpeg_bytes: pages.iter().map(|p| p.image.len() as u64).sum(),
                    duration_ms: start.elapsed().as_millis() as u64,
                };
                info!(
                    "Converted {} pages ({} bytes JPEG) in {}ms",
                    stats.total_pages, stats.total_jpeg_bytes, stats.duration_ms
                );
                self.store.replace(pages);
                self.last_stats = Some(stats);
                self.status = AppStatus::Result;
            }
            Ok(RunOutcome::Cancelled) => {
                info!("Conversion cancelled");
                self.reset();
            }
            Err(e) if token.is_cancelled() => {
                debug!("Ignoring error from cancelled run: {}", e);
                self.reset();
            }
            Err(e) => {
                warn!("Conversion failed: {}", e);
                self.failure = Some(e);
                self.status = AppStatus::Error;
            }
        }

        Ok(self.status)
    }

    /// Handle for cancelling the active run from elsewhere.
    pub fn canceller(&self) -> Canceller {
        Canceller {
            active: self.active.clone(),
            processing: self.processing.clone(),
        }
    }

    /// Back to `Idle`: pages released, error cleared, progress zeroed.
    pub fn reset(&mut self) {
        self.store.clear();
        self.failure = None;
        self.last_stats = None;
        *lock(&self.processing) = ProcessingState::default();
        self.base_name = DEFAULT_BASE_NAME.to_string();
        self.status = AppStatus::Idle;
    }

    pub fn toggle_page(&mut self, id: &PageId) -> bool {
        self.store.toggle(id)
    }

    pub fn toggle_all(&mut self) -> bool {
        self.store.toggle_all()
    }

    pub fn set_all(&mut self, selected: bool) {
        self.store.set_all(selected);
    }

    /// A dispatcher over `sink` using the configured pacing.
    pub fn dispatcher<S: DownloadSink>(&self, sink: S) -> DownloadDispatcher<S> {
        DownloadDispatcher::new(sink, self.config.download_pacing)
    }

    /// Save one page. Returns `false` when no page has that id.
    pub fn download_single<S: DownloadSink>(
        &self,
        dispatcher: &DownloadDispatcher<S>,
        id: &PageId,
    ) -> Result<bool, Pdf2JpgError> {
        match self.store.get(id) {
            Some(page) => dispatcher.download_one(page).map(|_| true),
            None => {
                warn!("Download ignored: no page with id {}", id);
                Ok(false)
            }
        }
    }

    pub async fn download_selected<S: DownloadSink>(
        &self,
        dispatcher: &DownloadDispatcher<S>,
    ) -> Result<usize, Pdf2JpgError> {
        dispatcher.download_selected(&self.store).await
    }

    pub fn status(&self) -> AppStatus {
        self.status
    }

    pub fn processing(&self) -> ProcessingState {
        *lock(&self.processing)
    }

    /// User-facing description of the last failure.
    pub fn error(&self) -> Option<AppError> {
        self.failure.as_ref().map(AppError::from)
    }

    /// The underlying error of the last failure.
    pub fn failure(&self) -> Option<&Pdf2JpgError> {
        self.failure.as_ref()
    }

    pub fn take_failure(&mut self) -> Option<Pdf2JpgError> {
        self.failure.take()
    }

    pub fn pages(&self) -> &[ConvertedPage] {
        self.store.pages()
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.store
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn stats(&self) -> Option<&ConversionStats> {
        self.last_stats.as_ref()
    }

    pub fn images(&self) -> &ImageStore {
        &self.images
    }
}

/// Held across the worker await. If the awaiting future is dropped, the
/// run is cancelled and the session goes back to `Idle`.
struct RunGuard<'s> {
    session: &'s mut Session,
    token: CancelToken,
    armed: bool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            debug!("Conversion abandoned by caller, cancelling worker");
            self.token.cancel();
            self.session.reset();
        }
    }
}

/// Mirrors pipeline progress into the session, then forwards it. A
/// cancelled run stops writing into the session.
struct SessionProgress {
    processing: Arc<Mutex<ProcessingState>>,
    token: CancelToken,
    inner: Option<ProgressCallback>,
}

impl SessionProgress {
    fn mirror(&self, current: usize, total: usize) {
        if !self.token.is_cancelled() {
            *lock(&self.processing) = ProcessingState { current, total };
        }
    }
}

impl ConversionProgressCallback for SessionProgress {
    fn on_conversion_start(&self, total_pages: usize) {
        self.mirror(0, total_pages);
        if let Some(cb) = &self.inner {
            cb.on_conversion_start(total_pages);
        }
    }

    fn on_page_complete(&self, page_num: usize, total_pages: usize) {
        self.mirror(page_num, total_pages);
        if let Some(cb) = &self.inner {
            cb.on_page_complete(page_num, total_pages);
        }
    }

    fn on_conversion_cancelled(&self, completed: usize, total_pages: usize) {
        if let Some(cb) = &self.inner {
            cb.on_conversion_cancelled(completed, total_pages);
        }
    }

    fn on_conversion_failed(&self, page_num: usize, error: &str) {
        if let Some(cb) = &self.inner {
            cb.on_conversion_failed(page_num, error);
        }
    }

    fn on_conversion_complete(&self, total_pages: usize) {
        if let Some(cb) = &self.inner {
            cb.on_conversion_complete(total_pages);
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}
