//! Error types for the edgequake-img2pdf library.
//!
//! Every failure the converter can report is a variant of [`Img2PdfError`].
//! Variants are grouped by the pipeline stage that raises them so a log line
//! or an HTTP error body already tells you where the request died.
//!
//! The boundary layers (the HTTP handlers, the CLI and
//! [`crate::convert::Converter::convert_to_result`]) never let an error
//! escape: they turn it into a [`crate::output::ConversionResult`] with
//! `success = false`. [`Img2PdfError::is_client_error`] decides whether the
//! HTTP surface answers 400 or 500.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-img2pdf library.
#[derive(Debug, Error)]
pub enum Img2PdfError {
    // ── Request errors ────────────────────────────────────────────────────
    /// A request field is missing or malformed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The input directory does not exist.
    #[error("Directory '{}' does not exist", path.display())]
    DirectoryNotFound { path: PathBuf },

    /// The input path exists but is not a directory.
    #[error("'{}' is not a directory", path.display())]
    NotADirectory { path: PathBuf },

    /// The process may not list the input directory.
    #[error("Permission denied reading '{}'", path.display())]
    PermissionDenied { path: PathBuf },

    /// An uploaded file carries an extension outside the supported set.
    #[error("Unsupported format: '{extension}' ({filename}). Supported formats: {supported}")]
    UnsupportedFormat {
        filename: String,
        extension: String,
        supported: String,
    },

    // ── Filter errors ─────────────────────────────────────────────────────
    /// Nothing survived the format filter.
    #[error("No images found in '{location}' with formats: {formats}")]
    NoImagesFound { location: String, formats: String },

    // ── Assembly errors ───────────────────────────────────────────────────
    /// A single image could not be read or decoded.
    #[error("Failed to decode image '{name}': {detail}")]
    DecodeFailed { name: String, detail: String },

    /// Every image was skipped as undecodable; there is nothing to write.
    #[error("All {total} images failed to decode.\nFirst error: {first_error}")]
    AllImagesFailed { total: usize, first_error: String },

    /// lopdf refused to serialise the assembled document.
    #[error("Failed to assemble PDF: {0}")]
    PdfAssembly(String),

    /// Could not create or write the output PDF.
    #[error("Failed to write output file '{}': {source}", path.display())]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Img2PdfError {
    /// `true` when the request itself is at fault (HTTP 400), `false` for
    /// environment or I/O failures (HTTP 500).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Img2PdfError::InvalidInput(_)
                | Img2PdfError::DirectoryNotFound { .. }
                | Img2PdfError::NotADirectory { .. }
                | Img2PdfError::PermissionDenied { .. }
                | Img2PdfError::UnsupportedFormat { .. }
                | Img2PdfError::NoImagesFound { .. }
        )
    }

    /// Short stage label used as a structured logging field.
    pub fn stage(&self) -> &'static str {
        match self {
            Img2PdfError::InvalidInput(_)
            | Img2PdfError::DirectoryNotFound { .. }
            | Img2PdfError::NotADirectory { .. }
            | Img2PdfError::PermissionDenied { .. }
            | Img2PdfError::UnsupportedFormat { .. } => "discovery",
            Img2PdfError::NoImagesFound { .. } => "filter",
            Img2PdfError::DecodeFailed { .. }
            | Img2PdfError::AllImagesFailed { .. }
            | Img2PdfError::PdfAssembly(_) => "assembly",
            Img2PdfError::OutputWriteFailed { .. } => "write",
            Img2PdfError::InvalidConfig(_) | Img2PdfError::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_not_found_display() {
        let e = Img2PdfError::DirectoryNotFound {
            path: PathBuf::from("/no/such/dir"),
        };
        assert_eq!(e.to_string(), "Directory '/no/such/dir' does not exist");
        assert!(e.is_client_error());
        assert_eq!(e.stage(), "discovery");
    }

    #[test]
    fn no_images_found_lists_formats() {
        let e = Img2PdfError::NoImagesFound {
            location: "/tmp/scans".into(),
            formats: "png, jpg".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("/tmp/scans"), "got: {msg}");
        assert!(msg.contains("png, jpg"), "got: {msg}");
        assert!(e.is_client_error());
    }

    #[test]
    fn decode_failure_is_server_error() {
        let e = Img2PdfError::DecodeFailed {
            name: "broken.png".into(),
            detail: "invalid signature".into(),
        };
        assert!(e.to_string().contains("broken.png"));
        assert!(!e.is_client_error());
        assert_eq!(e.stage(), "assembly");
    }

    #[test]
    fn write_failure_keeps_io_source() {
        use std::error::Error as _;
        let e = Img2PdfError::OutputWriteFailed {
            path: PathBuf::from("/ro/out.pdf"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        };
        assert!(!e.is_client_error());
        assert!(e.source().is_some());
        assert!(e.to_string().contains("/ro/out.pdf"));
    }

    #[test]
    fn unsupported_format_display() {
        let e = Img2PdfError::UnsupportedFormat {
            filename: "notes.txt".into(),
            extension: ".txt".into(),
            supported: "png, jpg".into(),
        };
        assert!(e.to_string().contains(".txt"));
        assert!(e.is_client_error());
    }
}
