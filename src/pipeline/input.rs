//! Input validation: accept a file only when it declares the PDF media type.
//!
//! The check runs before any pipeline interaction. A file that declares
//! `application/pdf` but contains something else still gets through here and
//! is rejected by the renderer as `InvalidDocument`.

use crate::config::DEFAULT_BASE_NAME;
use crate::error::Pdf2JpgError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The only accepted media type.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

static PDF_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.pdf$").expect("valid regex"));

/// A local file the user picked, with its declared media type.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub path: PathBuf,
    /// Final path component, e.g. `report.pdf`.
    pub file_name: String,
    /// Media type declared by the file's extension.
    pub media_type: String,
}

/// Resolve a local path, validating existence, readability and declared type.
pub fn resolve_local(path: &Path) -> Result<SelectedFile, Pdf2JpgError> {
    if !path.exists() {
        return Err(Pdf2JpgError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2JpgError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(Pdf2JpgError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let media_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    validate_media_type(&file_name, &media_type)?;

    debug!("Resolved local PDF: {}", path.display());
    Ok(SelectedFile {
        path: path.to_path_buf(),
        file_name,
        media_type,
    })
}

/// Reject anything that does not declare `application/pdf`.
pub fn validate_media_type(file_name: &str, media_type: &str) -> Result<(), Pdf2JpgError> {
    if media_type.trim().eq_ignore_ascii_case(PDF_MEDIA_TYPE) {
        Ok(())
    } else {
        Err(Pdf2JpgError::UnsupportedFileType {
            file_name: file_name.to_string(),
            media_type: media_type.to_string(),
        })
    }
}

/// Base name for output files: the file name without a trailing `.pdf`
/// (any case), or `converted` when nothing is left.
pub fn base_name(file_name: &str) -> String {
    let stripped = PDF_SUFFIX.replace(file_name, "");
    if stripped.is_empty() {
        DEFAULT_BASE_NAME.to_string()
    } else {
        stripped.into_owned()
    }
}
