//! One-call conversion entry points.
//!
//! These wrap a [`Session`]: open the file, convert every page, save every
//! page into a directory. Use [`Session`] directly for selection, single-page
//! downloads or cancellation.

use crate::config::ConversionConfig;
use crate::download::DirectorySink;
use crate::error::Pdf2JpgError;
use crate::output::ConversionStats;
use crate::pipeline::render::RendererFactory;
use crate::session::{AppStatus, Session};
use std::path::Path;
use tracing::info;

/// Convert a local PDF and write `{base}_pNN.jpg` for every page into
/// `out_dir`, using pdfium from the default locations.
///
/// # Errors
/// The first failure of the run: an input error, a document error
/// ([`Pdf2JpgError::TooManyPages`], [`Pdf2JpgError::PasswordProtected`], …),
/// or [`Pdf2JpgError::OutputWriteFailed`].
pub async fn convert_to_dir(
    input: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, Pdf2JpgError> {
    let session = Session::with_pdfium(config.clone());
    convert_with(session, input.as_ref(), out_dir.as_ref()).await
}

/// Same as [`convert_to_dir`] with a caller-supplied renderer.
pub async fn convert_to_dir_with(
    renderer: RendererFactory,
    input: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, Pdf2JpgError> {
    let session = Session::new(config.clone(), renderer);
    convert_with(session, input.as_ref(), out_dir.as_ref()).await
}

/// Synchronous wrapper around [`convert_to_dir`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, Pdf2JpgError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2JpgError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_to_dir(input, out_dir, config))
}

async fn convert_with(
    mut session: Session,
    input: &Path,
    out_dir: &Path,
) -> Result<ConversionStats, Pdf2JpgError> {
    match session.open_path(input).await? {
        AppStatus::Result => {}
        AppStatus::Error => {
            return Err(session
                .take_failure()
                .unwrap_or_else(|| Pdf2JpgError::Internal("run failed without an error".into())));
        }
        status => {
            return Err(Pdf2JpgError::Internal(format!(
                "conversion ended in state {:?}",
                status
            )));
        }
    }

    let dispatcher = session.dispatcher(DirectorySink::new(out_dir));
    let saved = session.download_selected(&dispatcher).await?;
    info!("Wrote {} images to {}", saved, out_dir.display());

    Ok(session.stats().cloned().unwrap_or_default())
}
