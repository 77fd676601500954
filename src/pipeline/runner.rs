//! The page pipeline: load a document, then convert it page by page.
//!
//! ```text
//! Unloaded ──load──▶ Loading ──▶ Ready ──run──▶ Running ──▶ Completed
//!                       │                          ├──────▶ Cancelled
//!                       └──▶ LoadError             └──────▶ RunError
//!
//! LoadError | Completed | Cancelled | RunError ──destroy──▶ Unloaded
//! ```
//!
//! A run is all-or-nothing. Pages are produced lazily by [`PageRun`]; the
//! caller of [`PagePipeline::run`] gets either every page or none, and the
//! image handles of a discarded run are released as the partial vector is
//! dropped.

use crate::config::ConversionConfig;
use crate::error::Pdf2JpgError;
use crate::images::ImageStore;
use crate::output::{ConvertedPage, PageId, RunOutcome};
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::encode::encode_jpeg;
use crate::pipeline::render::{DocumentHandle, Renderer};
use crate::progress::{NoopProgressCallback, ProgressCallback};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

static NEXT_RUN_ID: AtomicU64 = AtomicU64::new(1);

/// Where the pipeline is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Unloaded,
    Loading,
    Ready { page_count: usize },
    LoadError,
    Running { current: usize, total: usize },
    Completed,
    Cancelled,
    RunError,
}

/// Drives a [`Renderer`] over one document at a time.
pub struct PagePipeline<'r> {
    renderer: &'r dyn Renderer,
    images: ImageStore,
    document: Option<Box<dyn DocumentHandle + 'r>>,
    state: PipelineState,
    max_pages: usize,
    dpi_scale: f32,
    jpeg_quality: u8,
    page_yield: Duration,
    progress: ProgressCallback,
}

impl<'r> PagePipeline<'r> {
    pub fn new(renderer: &'r dyn Renderer, images: ImageStore, config: &ConversionConfig) -> Self {
        Self {
            renderer,
            images,
            document: None,
            state: PipelineState::Unloaded,
            max_pages: config.max_pages,
            dpi_scale: config.dpi_scale,
            jpeg_quality: config.jpeg_quality,
            page_yield: config.page_yield,
            progress: config
                .progress_callback
                .clone()
                .unwrap_or_else(|| Arc::new(NoopProgressCallback)),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn has_document(&self) -> bool {
        self.document.is_some()
    }

    /// Parse `bytes` and check the page count.
    ///
    /// On any failure the document (if parsed) is released before returning
    /// and the pipeline rests in `LoadError` until [`destroy`](Self::destroy).
    pub fn load_document(&mut self, bytes: Vec<u8>) -> Result<usize, Pdf2JpgError> {
        if self.state != PipelineState::Unloaded || self.document.is_some() {
            return Err(Pdf2JpgError::PipelineBusy);
        }

        self.state = PipelineState::Loading;
        debug!("Loading document ({} bytes)", bytes.len());

        let document = match self.renderer.load(bytes) {
            Ok(document) => document,
            Err(e) => {
                warn!("Document load failed: {}", e);
                self.state = PipelineState::LoadError;
                return Err(e);
            }
        };

        let page_count = document.page_count();
        if page_count > self.max_pages {
            drop(document);
            self.state = PipelineState::LoadError;
            return Err(Pdf2JpgError::TooManyPages {
                pages: page_count,
                max: self.max_pages,
            });
        }
        if page_count == 0 {
            drop(document);
            self.state = PipelineState::LoadError;
            return Err(Pdf2JpgError::EmptyDocument);
        }

        info!("Document ready: {} pages", page_count);
        self.document = Some(document);
        self.state = PipelineState::Ready { page_count };
        Ok(page_count)
    }

    /// Start a lazy run over every page of the loaded document.
    ///
    /// Only valid in `Ready`; a run cannot be restarted.
    pub fn pages<'p>(
        &'p mut self,
        source_name: &str,
        cancel: &CancelToken,
    ) -> Result<PageRun<'p, 'r>, Pdf2JpgError> {
        let total = match self.state {
            PipelineState::Ready { page_count } => page_count,
            state => {
                return Err(Pdf2JpgError::Internal(format!(
                    "cannot start a run in state {:?}",
                    state
                )))
            }
        };

        let run_id = NEXT_RUN_ID.fetch_add(1, Ordering::Relaxed);
        self.state = PipelineState::Running { current: 0, total };
        self.progress.on_conversion_start(total);
        info!("Run {} started: {} pages", run_id, total);

        Ok(PageRun {
            pipeline: self,
            cancel: cancel.clone(),
            source_name: source_name.to_string(),
            run_id,
            next_page: 1,
            total,
            finished: false,
            cancelled: false,
        })
    }

    /// Convert every page, or nothing.
    pub fn run(
        &mut self,
        source_name: &str,
        cancel: &CancelToken,
    ) -> Result<RunOutcome, Pdf2JpgError> {
        let mut run = self.pages(source_name, cancel)?;
        let mut pages = Vec::with_capacity(run.total());

        for page in run.by_ref() {
            // On error `pages` is dropped here, releasing every handle of this run.
            pages.push(page?);
        }

        if run.is_cancelled() {
            drop(pages);
            return Ok(RunOutcome::Cancelled);
        }
        Ok(RunOutcome::Completed(pages))
    }

    /// Release the document. A no-op when none is held.
    pub fn destroy(&mut self) {
        if self.document.take().is_some() {
            debug!("Document released");
        }
        self.state = PipelineState::Unloaded;
    }

    fn convert_page(
        &self,
        page_num: usize,
        run_id: u64,
        source_name: &str,
    ) -> Result<ConvertedPage, Pdf2JpgError> {
        let document = self
            .document
            .as_ref()
            .ok_or_else(|| Pdf2JpgError::Internal("no document loaded".into()))?;

        let image = document
            .render_page(page_num, self.dpi_scale)
            .map_err(|detail| Pdf2JpgError::RenderFailed {
                page: page_num,
                detail,
            })?;

        let jpeg = encode_jpeg(&image, self.jpeg_quality).map_err(|e| {
            Pdf2JpgError::RenderFailed {
                page: page_num,
                detail: format!("JPEG encoding failed: {}", e),
            }
        })?;

        Ok(ConvertedPage {
            id: PageId::new(page_num, run_id),
            page_num,
            image: self.images.insert(jpeg),
            width: image.width(),
            height: image.height(),
            source_name: source_name.to_string(),
            selected: true,
        })
    }
}

/// Lazy, finite, non-restartable sequence of converted pages.
///
/// Yields pages in ascending order. Ends early (and for good) on
/// cancellation or after yielding an error.
pub struct PageRun<'p, 'r> {
    pipeline: &'p mut PagePipeline<'r>,
    cancel: CancelToken,
    source_name: String,
    run_id: u64,
    next_page: usize,
    total: usize,
    finished: bool,
    cancelled: bool,
}

impl PageRun<'_, '_> {
    pub fn total(&self) -> usize {
        self.total
    }

    /// Pages produced so far.
    pub fn completed(&self) -> usize {
        self.next_page - 1
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl Iterator for PageRun<'_, '_> {
    type Item = Result<ConvertedPage, Pdf2JpgError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        if self.cancel.is_cancelled() {
            self.finished = true;
            self.cancelled = true;
            self.pipeline.state = PipelineState::Cancelled;
            self.pipeline
                .progress
                .on_conversion_cancelled(self.completed(), self.total);
            info!(
                "Run {} cancelled after {}/{} pages",
                self.run_id,
                self.completed(),
                self.total
            );
            return None;
        }

        if self.next_page > self.total {
            self.finished = true;
            self.pipeline.state = PipelineState::Completed;
            self.pipeline.progress.on_conversion_complete(self.total);
            info!("Run {} complete: {} pages", self.run_id, self.total);
            return None;
        }

        let page_num = self.next_page;
        match self
            .pipeline
            .convert_page(page_num, self.run_id, &self.source_name)
        {
            Ok(page) => {
                self.next_page += 1;
                self.pipeline.state = PipelineState::Running {
                    current: page_num,
                    total: self.total,
                };
                self.pipeline.progress.on_page_complete(page_num, self.total);
                if !self.pipeline.page_yield.is_zero() {
                    std::thread::sleep(self.pipeline.page_yield);
                }
                Some(Ok(page))
            }
            Err(e) => {
                self.finished = true;
                self.pipeline.state = PipelineState::RunError;
                self.pipeline
                    .progress
                    .on_conversion_failed(page_num, &e.to_string());
                warn!("Run {} failed on page {}: {}", self.run_id, page_num, e);
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            (0, Some(0))
        } else {
            (0, Some(self.total + 1 - self.next_page))
        }
    }
}
