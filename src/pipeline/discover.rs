//! Discovery: turn a directory or an upload set into [`SourceItem`]s.
//!
//! Directory mode lists the directory once (no recursion) and keeps every
//! regular file, following symlinks. Nothing is read yet; the bytes of a
//! file are only loaded when the assembly stage decodes it, so a failed
//! filter never touches file contents.
//!
//! Upload mode is stricter: a client that sends `notes.txt` made a mistake,
//! so an upload with an unsupported extension fails the request instead of
//! being filtered out silently.

use crate::config::{format_list, ImageFormat};
use crate::error::Img2PdfError;
use crate::request::{ImageSource, UploadedImage};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

/// Where a discovered image's bytes live.
#[derive(Debug, Clone)]
pub enum ItemOrigin {
    File(PathBuf),
    Memory(Vec<u8>),
}

/// One discovered image awaiting conversion.
#[derive(Debug, Clone)]
pub struct SourceItem {
    /// Filename used for sorting, messages and logs.
    pub name: String,
    pub origin: ItemOrigin,
    /// Format derived from the extension; `None` when unsupported.
    pub format: Option<ImageFormat>,
    /// Last-modified time. Only filesystem items carry one.
    pub modified: Option<SystemTime>,
}

impl SourceItem {
    /// Load the item's bytes. Files are opened, read and closed here.
    pub fn read_bytes(&self) -> io::Result<Cow<'_, [u8]>> {
        match &self.origin {
            ItemOrigin::File(path) => std::fs::read(path).map(Cow::Owned),
            ItemOrigin::Memory(bytes) => Ok(Cow::Borrowed(bytes)),
        }
    }
}

/// Enumerate the candidate items of a request source.
///
/// `allowed` is the service's format set; it only matters for uploads,
/// which are rejected when their extension falls outside it.
pub fn discover(
    source: ImageSource,
    allowed: &BTreeSet<ImageFormat>,
) -> Result<Vec<SourceItem>, Img2PdfError> {
    match source {
        ImageSource::Directory(dir) => discover_directory(&dir),
        ImageSource::Uploads(files) => discover_uploads(files, allowed),
    }
}

/// List the regular files directly inside `dir`.
pub fn discover_directory(dir: &Path) -> Result<Vec<SourceItem>, Img2PdfError> {
    if dir.as_os_str().is_empty() {
        return Err(Img2PdfError::InvalidInput(
            "input_dir must not be empty".into(),
        ));
    }

    let meta = std::fs::metadata(dir).map_err(|e| map_dir_error(dir, e))?;
    if !meta.is_dir() {
        return Err(Img2PdfError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| map_dir_error(dir, e))?;

    let mut items = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| map_dir_error(dir, e))?;
        let path = entry.path();

        // fs::metadata follows symlinks; a dangling link is just skipped.
        let meta = match std::fs::metadata(&path) {
            Ok(m) => m,
            Err(e) => {
                debug!("Skipping unreadable entry {}: {}", path.display(), e);
                continue;
            }
        };
        if !meta.is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        items.push(SourceItem {
            format: ImageFormat::from_filename(&name),
            modified: meta.modified().ok(),
            origin: ItemOrigin::File(path),
            name,
        });
    }

    debug!("Discovered {} files in {}", items.len(), dir.display());
    Ok(items)
}

/// Validate an upload set and wrap it as items, preserving upload order.
pub fn discover_uploads(
    files: Vec<UploadedImage>,
    allowed: &BTreeSet<ImageFormat>,
) -> Result<Vec<SourceItem>, Img2PdfError> {
    if files.is_empty() {
        return Err(Img2PdfError::InvalidInput("No files provided".into()));
    }

    let mut items = Vec::with_capacity(files.len());
    for (idx, file) in files.into_iter().enumerate() {
        if file.filename.trim().is_empty() {
            return Err(Img2PdfError::InvalidInput(format!(
                "Uploaded file #{} has no filename",
                idx + 1
            )));
        }

        let format = ImageFormat::from_filename(&file.filename).filter(|f| allowed.contains(f));
        if format.is_none() {
            let extension = Path::new(&file.filename)
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
                .unwrap_or_default();
            return Err(Img2PdfError::UnsupportedFormat {
                filename: file.filename,
                extension,
                supported: format_list(allowed),
            });
        }

        items.push(SourceItem {
            name: file.filename,
            origin: ItemOrigin::Memory(file.bytes),
            format,
            modified: None,
        });
    }

    debug!("Accepted {} uploaded files", items.len());
    Ok(items)
}

fn map_dir_error(dir: &Path, e: io::Error) -> Img2PdfError {
    let path = dir.to_path_buf();
    match e.kind() {
        io::ErrorKind::NotFound => Img2PdfError::DirectoryNotFound { path },
        io::ErrorKind::PermissionDenied => Img2PdfError::PermissionDenied { path },
        _ => Img2PdfError::Internal(format!("Failed to list '{}': {}", dir.display(), e)),
    }
}
