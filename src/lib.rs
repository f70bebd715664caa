//! # edgequake-img2pdf
//!
//! Collect the images in a directory (or an HTTP upload) and concatenate
//! them into a single PDF, one image per page.
//!
//! ## Pipeline Overview
//!
//! ```text
//! directory / upload
//!  │
//!  ├─ 1. Discover  list regular files, or wrap uploaded bytes
//!  ├─ 2. Select    keep requested ∩ allowed formats, sort by name or mtime
//!  ├─ 3. Decode    image → RGB pixels (RGB JPEGs pass through untouched)
//!  ├─ 4. Assemble  one lopdf page per image, page size = image size
//!  └─ 5. Write     atomic rename into place, or bytes back to the caller
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_img2pdf::convert_images_to_pdf;
//!
//! let result = convert_images_to_pdf("scans", "scans.pdf", None, "name");
//! if result.success {
//!     println!("{}", result.message);
//! } else {
//!     eprintln!("error: {}", result.message);
//! }
//! ```
//!
//! For a long-lived service, build one [`Converter`] and share it:
//!
//! ```rust,no_run
//! use edgequake_img2pdf::{ConversionConfig, ConversionRequest, Converter, DecodePolicy};
//!
//! # async fn run() -> Result<(), edgequake_img2pdf::Img2PdfError> {
//! let converter = Converter::new(
//!     ConversionConfig::builder()
//!         .decode_policy(DecodePolicy::Skip)
//!         .build()?,
//! );
//! let pdf = converter
//!     .convert_async(ConversionRequest::directory("scans", "out/scans.pdf"))
//!     .await?;
//! println!("{} pages, {} skipped", pdf.images_converted, pdf.skipped.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | on      | axum HTTP surface ([`server::router`], [`server::serve`]) |
//! | `cli`    | on      | Enables the `img2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Library-only use:
//! ```toml
//! edgequake-img2pdf = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod request;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, DecodePolicy, ImageFormat, SortOrder};
pub use convert::{convert_images_to_pdf, Converter};
pub use error::Img2PdfError;
pub use output::{ConversionResult, ConvertedPdf, SkippedImage};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use request::{ConversionRequest, Destination, ImageSource, UploadedImage};
