//! Conversion results.

use crate::error::Img2PdfError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// An image left out under [`crate::config::DecodePolicy::Skip`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedImage {
    pub name: String,
    pub reason: String,
}

/// A successfully assembled PDF.
#[derive(Debug, Clone)]
pub struct ConvertedPdf {
    /// The complete PDF document.
    pub bytes: Vec<u8>,
    /// Pages written, one per image.
    pub images_converted: usize,
    /// Absolute path of the written file, for file destinations.
    pub output_path: Option<PathBuf>,
    pub skipped: Vec<SkippedImage>,
}

/// Boundary shape returned by the HTTP surface, the CLI and
/// [`crate::convert::convert_images_to_pdf`].
///
/// ```json
/// {
///   "success": true,
///   "message": "Successfully converted 3 images to 'out/scans.pdf'",
///   "output_path": "/home/me/out/scans.pdf",
///   "images_converted": 3
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images_converted: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_images: Vec<SkippedImage>,
}

impl ConversionResult {
    /// Success result for a conversion that produced `pdf`.
    ///
    /// `target` is what the caller asked for (used in the message).
    pub fn from_pdf(pdf: &ConvertedPdf, target: &str) -> Self {
        let mut message = format!(
            "Successfully converted {} images to '{}'",
            pdf.images_converted, target
        );
        if !pdf.skipped.is_empty() {
            message.push_str(&format!(" ({} skipped)", pdf.skipped.len()));
        }
        Self {
            success: true,
            message,
            output_path: pdf
                .output_path
                .as_ref()
                .map(|p| p.display().to_string()),
            images_converted: Some(pdf.images_converted),
            skipped_images: pdf.skipped.clone(),
        }
    }

    /// Failure result carrying the error's message. No pages were written.
    pub fn from_error(err: &Img2PdfError) -> Self {
        Self {
            success: false,
            message: err.to_string(),
            output_path: None,
            images_converted: Some(0),
            skipped_images: Vec::new(),
        }
    }
}
