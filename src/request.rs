//! Per-request input to the converter.

use crate::config::SortOrder;
use std::path::PathBuf;

/// One uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    /// Client-supplied filename; only its extension and sort key are used.
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// Where the images come from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Every regular file directly inside this directory.
    Directory(PathBuf),
    /// Files received in memory, in upload order.
    Uploads(Vec<UploadedImage>),
}

/// Where the PDF goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Written to this path; parent directories are created.
    File(PathBuf),
    /// Returned as bytes only.
    Memory,
}

/// A single conversion.
///
/// # Example
/// ```rust
/// use edgequake_img2pdf::{ConversionRequest, SortOrder};
///
/// let request = ConversionRequest::directory("scans", "out/scans.pdf")
///     .formats(["png", "jpg"])
///     .sort_order(SortOrder::Modified);
/// assert_eq!(request.sort_order, Some(SortOrder::Modified));
/// ```
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub source: ImageSource,
    pub destination: Destination,
    /// Requested extensions. `None` means every allowed format.
    pub formats: Option<Vec<String>>,
    /// `None` keeps discovery order.
    pub sort_order: Option<SortOrder>,
}

impl ConversionRequest {
    /// Convert a directory into a PDF file, sorted by name.
    pub fn directory(input_dir: impl Into<PathBuf>, output_pdf: impl Into<PathBuf>) -> Self {
        Self {
            source: ImageSource::Directory(input_dir.into()),
            destination: Destination::File(output_pdf.into()),
            formats: None,
            sort_order: Some(SortOrder::Name),
        }
    }

    /// Convert uploaded files into an in-memory PDF, in upload order.
    pub fn uploads(files: Vec<UploadedImage>) -> Self {
        Self {
            source: ImageSource::Uploads(files),
            destination: Destination::Memory,
            formats: None,
            sort_order: None,
        }
    }

    pub fn formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.formats = Some(formats.into_iter().map(Into::into).collect());
        self
    }

    pub fn sort_order(mut self, order: SortOrder) -> Self {
        self.sort_order = Some(order);
        self
    }

    pub fn destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    /// Human-readable description of the source, for logs and messages.
    pub fn source_label(&self) -> String {
        match &self.source {
            ImageSource::Directory(p) => p.display().to_string(),
            ImageSource::Uploads(files) => format!("{} uploaded files", files.len()),
        }
    }
}
