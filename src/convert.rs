//! Conversion entry points.
//!
//! [`Converter`] is the service object: it owns the (immutable) config and
//! runs one request at a time per call. Clone it freely; clones share the
//! config through an `Arc`, so one converter can serve every HTTP request.
//!
//! [`convert_images_to_pdf`] is the single-function entry point for callers
//! that want the boundary behaviour (never an `Err`, always a
//! [`ConversionResult`]) without building anything.

use crate::config::{ConversionConfig, SortOrder};
use crate::error::Img2PdfError;
use crate::output::{ConversionResult, ConvertedPdf};
use crate::pipeline::{assemble, discover, select, write};
use crate::request::{ConversionRequest, Destination};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, Span};

/// Image-to-PDF conversion service.
///
/// # Example
/// ```rust,no_run
/// use edgequake_img2pdf::{ConversionConfig, ConversionRequest, Converter};
///
/// let converter = Converter::new(ConversionConfig::default());
/// let result = converter.convert_to_result(
///     ConversionRequest::directory("scans", "out/scans.pdf").formats(["png", "jpg"]),
/// );
/// println!("{}", result.message);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Converter {
    config: Arc<ConversionConfig>,
}

impl Converter {
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Run the whole pipeline for one request on the current thread.
    ///
    /// Failures are logged here, with the stage that raised them, before
    /// being returned.
    pub fn convert(&self, request: ConversionRequest) -> Result<ConvertedPdf, Img2PdfError> {
        let source = request.source_label();
        let span = info_span!("conversion", source = %source);
        let _enter = span.enter();

        self.run(request, &source).inspect_err(|e| {
            error!(stage = e.stage(), source = %source, "Conversion failed: {}", e);
        })
    }

    /// [`Converter::convert`] on tokio's blocking pool.
    ///
    /// Decoding and compression are CPU-bound; running them on an async
    /// worker would stall every other request on that worker. The caller's
    /// span is re-entered on the blocking thread so the `conversion` span
    /// nests under the request span.
    pub async fn convert_async(
        &self,
        request: ConversionRequest,
    ) -> Result<ConvertedPdf, Img2PdfError> {
        let this = self.clone();
        let span = Span::current();
        tokio::task::spawn_blocking(move || span.in_scope(|| this.convert(request)))
            .await
            .map_err(|e| Img2PdfError::Internal(format!("Conversion task panicked: {e}")))?
    }

    /// [`Converter::convert`], translated into the boundary result shape.
    pub fn convert_to_result(&self, request: ConversionRequest) -> ConversionResult {
        let target = target_label(&request.destination);
        match self.convert(request) {
            Ok(pdf) => ConversionResult::from_pdf(&pdf, &target),
            Err(e) => ConversionResult::from_error(&e),
        }
    }

    fn run(&self, request: ConversionRequest, source: &str) -> Result<ConvertedPdf, Img2PdfError> {
        let start = Instant::now();
        let config = &*self.config;

        if let Destination::File(path) = &request.destination {
            if path.as_os_str().is_empty() {
                return Err(Img2PdfError::InvalidInput(
                    "output_pdf_path must not be empty".into(),
                ));
            }
        }

        // ── Step 1: Discovery ────────────────────────────────────────────
        let items = discover::discover(request.source, &config.allowed_formats)?;

        // ── Step 2: Filter & sort ────────────────────────────────────────
        let formats = select::effective_formats(request.formats.as_deref(), &config.allowed_formats);
        let ordered = select::filter_and_sort(
            items,
            &formats,
            request.sort_order,
            config.case_sensitive_names,
            source,
        )?;
        debug!(
            "Converting {} images (order: {})",
            ordered.len(),
            request
                .sort_order
                .map_or_else(|| "upload".to_string(), |o| o.to_string())
        );

        // ── Step 3: Assembly ─────────────────────────────────────────────
        let assembled = assemble::assemble(&ordered, config)?;

        // ── Step 4: Output ───────────────────────────────────────────────
        let output_path = match &request.destination {
            Destination::File(path) => Some(write::write_pdf(path, &assembled.bytes)?),
            Destination::Memory => None,
        };

        info!(
            "Converted {} images in {}ms{}",
            assembled.pages,
            start.elapsed().as_millis(),
            output_path
                .as_ref()
                .map(|p| format!(" → {}", p.display()))
                .unwrap_or_default()
        );

        Ok(ConvertedPdf {
            bytes: assembled.bytes,
            images_converted: assembled.pages,
            output_path,
            skipped: assembled.skipped,
        })
    }
}

/// Convert every image in `input_dir` into one PDF at `output_pdf_path`.
///
/// Uses the default service configuration. `image_formats` restricts the
/// extensions considered (default: all supported); `sort_order` is `"name"`
/// or `"modified"`. Errors come back as `success = false`.
///
/// ```rust,no_run
/// use edgequake_img2pdf::convert_images_to_pdf;
///
/// let formats = vec!["png".to_string()];
/// let result = convert_images_to_pdf("scans", "scans.pdf", Some(formats.as_slice()), "modified");
/// assert!(result.success, "{}", result.message);
/// ```
pub fn convert_images_to_pdf(
    input_dir: impl AsRef<Path>,
    output_pdf_path: impl AsRef<Path>,
    image_formats: Option<&[String]>,
    sort_order: &str,
) -> ConversionResult {
    let order = match sort_order.parse::<SortOrder>() {
        Ok(o) => o,
        Err(e) => return ConversionResult::from_error(&e),
    };

    let mut request =
        ConversionRequest::directory(input_dir.as_ref(), output_pdf_path.as_ref()).sort_order(order);
    if let Some(formats) = image_formats {
        request = request.formats(formats.iter().cloned());
    }

    Converter::default().convert_to_result(request)
}

fn target_label(destination: &Destination) -> String {
    match destination {
        Destination::File(p) => p.display().to_string(),
        Destination::Memory => "memory".to_string(),
    }
}
