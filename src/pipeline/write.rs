//! Output: persist an assembled PDF.
//!
//! The bytes go to a temporary file in the destination directory and are
//! renamed over the destination afterwards, so readers never observe a
//! half-written PDF and a failed write leaves any previous file untouched.
//!
//! New files get the usual `0o666 & !umask` mode; a replaced file keeps its
//! permissions.

use crate::error::Img2PdfError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Write `bytes` to `path`, creating parent directories.
///
/// Returns the absolute destination path (symlinks are not resolved).
pub fn write_pdf(path: &Path, bytes: &[u8]) -> Result<PathBuf, Img2PdfError> {
    let fail = |source: std::io::Error| Img2PdfError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if path.as_os_str().is_empty() {
        return Err(Img2PdfError::InvalidInput(
            "output_pdf_path must not be empty".into(),
        ));
    }

    let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            std::fs::create_dir_all(parent).map_err(fail)?;
            parent
        }
        None => Path::new("."),
    };

    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }

    // Dropped (and deleted) on every early return below.
    let mut tmp = builder.tempfile_in(parent).map_err(fail)?;
    if let Ok(existing) = std::fs::metadata(path) {
        if existing.is_file() {
            tmp.as_file()
                .set_permissions(existing.permissions())
                .map_err(fail)?;
        }
    }
    tmp.write_all(bytes).map_err(fail)?;
    tmp.as_file().sync_all().map_err(fail)?;
    tmp.persist(path).map_err(|e| fail(e.error))?;

    let absolute = std::path::absolute(path).map_err(fail)?;
    debug!("Wrote {} bytes to {}", bytes.len(), absolute.display());
    Ok(absolute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("a/b/c/out.pdf");
        let written = write_pdf(&out, b"%PDF-1.5\n").unwrap();
        assert!(written.is_absolute());
        assert_eq!(std::fs::read(&out).unwrap(), b"%PDF-1.5\n");
        let leftovers = std::fs::read_dir(tmp.path().join("a/b/c")).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn replaces_existing_file() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out.pdf");
        std::fs::write(&out, b"old").unwrap();
        write_pdf(&out, b"new").unwrap();
        assert_eq!(std::fs::read(&out).unwrap(), b"new");
    }

    #[cfg(unix)]
    #[test]
    fn new_file_gets_default_mode() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = TempDir::new().unwrap();
        let reference = tmp.path().join("reference");
        std::fs::write(&reference, b"x").unwrap();
        let out = tmp.path().join("out.pdf");
        write_pdf(&out, b"%PDF").unwrap();

        let mode = |p: &Path| std::fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&out), mode(&reference));
    }

    #[cfg(unix)]
    #[test]
    fn replaced_file_keeps_its_mode() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out.pdf");
        std::fs::write(&out, b"old").unwrap();
        std::fs::set_permissions(&out, std::fs::Permissions::from_mode(0o640)).unwrap();

        write_pdf(&out, b"new").unwrap();
        let mode = std::fs::metadata(&out).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }

    #[test]
    fn directory_destination_is_a_write_error() {
        let tmp = TempDir::new().unwrap();
        let err = write_pdf(tmp.path(), b"%PDF").unwrap_err();
        assert!(matches!(err, Img2PdfError::OutputWriteFailed { .. }), "got {err:?}");
    }

    #[test]
    fn parent_that_is_a_file_is_a_write_error() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        let err = write_pdf(&blocker.join("out.pdf"), b"%PDF").unwrap_err();
        assert!(matches!(err, Img2PdfError::OutputWriteFailed { .. }), "got {err:?}");
    }

    #[test]
    fn empty_path_is_invalid_input() {
        let err = write_pdf(Path::new(""), b"%PDF").unwrap_err();
        assert!(matches!(err, Img2PdfError::InvalidInput(_)));
    }
}
