//! Progress-callback trait for per-image conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the assembly stage turns each image into a page. The CLI uses
//! this to drive its progress bar; a host application can forward events to
//! its own telemetry without the library knowing how.
//!
//! # Example
//!
//! ```rust
//! use edgequake_img2pdf::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     pages: Arc<AtomicUsize>,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_image_complete(&self, index: usize, total: usize, name: &str) {
//!         self.pages.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}/{} {}", index, total, name);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     pages: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the assembly stage as it processes each image.
///
/// Implementations must be `Send + Sync`: one callback is shared by every
/// request a [`crate::convert::Converter`] serves, and requests may run on
/// different blocking threads at the same time. All methods default to
/// no-ops.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once, after filtering, before the first image is decoded.
    ///
    /// # Arguments
    /// * `total_images`: number of images that will be assembled
    fn on_conversion_start(&self, total_images: usize) {
        let _ = total_images;
    }

    /// Called before an image is decoded.
    ///
    /// # Arguments
    /// * `index`: 1-indexed position in the sorted sequence
    /// * `total`: total images
    /// * `name`: the image's filename
    fn on_image_start(&self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }

    /// Called after an image has been appended as a page.
    fn on_image_complete(&self, index: usize, total: usize, name: &str) {
        let _ = (index, total, name);
    }

    /// Called when an image fails to decode.
    ///
    /// Under [`crate::config::DecodePolicy::Abort`] this is the last event
    /// of the request.
    fn on_image_error(&self, index: usize, total: usize, name: &str, error: &str) {
        let _ = (index, total, name, error);
    }

    /// Called once after every image has been attempted.
    ///
    /// # Arguments
    /// * `total_images`: images attempted
    /// * `pages`: pages written
    fn on_conversion_complete(&self, total_images: usize, pages: usize) {
        let _ = (total_images, pages);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
