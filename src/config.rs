//! Configuration types for image-to-PDF conversion.
//!
//! Service-wide behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. A [`crate::convert::Converter`] owns
//! one config for its whole lifetime; per-request knobs (input, output,
//! format subset, sort order) live on [`crate::request::ConversionRequest`].

use crate::error::Img2PdfError;
use crate::progress::ProgressCallback;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Configuration for a [`crate::convert::Converter`].
///
/// # Example
/// ```rust
/// use edgequake_img2pdf::{ConversionConfig, DecodePolicy, ImageFormat};
///
/// let config = ConversionConfig::builder()
///     .allowed_formats([ImageFormat::Png, ImageFormat::Jpg, ImageFormat::Jpeg])
///     .resolution(150.0)
///     .decode_policy(DecodePolicy::Skip)
///     .build()
///     .unwrap();
/// assert_eq!(config.allowed_formats.len(), 3);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Formats this service accepts. Always a non-empty subset of
    /// [`ImageFormat::ALL`]. Default: every supported format.
    ///
    /// A request's `image_formats` is intersected with this set, so an
    /// operator can narrow the service without touching clients.
    pub allowed_formats: BTreeSet<ImageFormat>,

    /// Compare filenames case-sensitively when sorting by name. Default: false.
    pub case_sensitive_names: bool,

    /// Page resolution in DPI. Default: 72.
    ///
    /// Each page's MediaBox is the image size scaled by `72 / resolution`,
    /// so at the default one pixel maps to one PDF point.
    pub resolution: f32,

    /// Embed RGB JPEG sources unchanged (`DCTDecode`) instead of re-encoding
    /// their pixels. Default: true.
    pub jpeg_passthrough: bool,

    /// What to do when an image cannot be decoded. Default: [`DecodePolicy::Abort`].
    pub decode_policy: DecodePolicy,

    /// Optional per-image progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            allowed_formats: ImageFormat::ALL.into_iter().collect(),
            case_sensitive_names: false,
            resolution: 72.0,
            jpeg_passthrough: true,
            decode_policy: DecodePolicy::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("allowed_formats", &self.allowed_formats)
            .field("case_sensitive_names", &self.case_sensitive_names)
            .field("resolution", &self.resolution)
            .field("jpeg_passthrough", &self.jpeg_passthrough)
            .field("decode_policy", &self.decode_policy)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Start building a config from the defaults.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Comma-separated list of the allowed formats, for messages.
    pub fn allowed_formats_display(&self) -> String {
        format_list(&self.allowed_formats)
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    /// Restrict the service to these formats.
    pub fn allowed_formats(mut self, formats: impl IntoIterator<Item = ImageFormat>) -> Self {
        self.config.allowed_formats = formats.into_iter().collect();
        self
    }

    pub fn case_sensitive_names(mut self, v: bool) -> Self {
        self.config.case_sensitive_names = v;
        self
    }

    /// Page resolution in DPI (clamped to 1–2400).
    pub fn resolution(mut self, dpi: f32) -> Self {
        self.config.resolution = dpi.clamp(1.0, 2400.0);
        self
    }

    pub fn jpeg_passthrough(mut self, v: bool) -> Self {
        self.config.jpeg_passthrough = v;
        self
    }

    pub fn decode_policy(mut self, policy: DecodePolicy) -> Self {
        self.config.decode_policy = policy;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Validate and return the config.
    pub fn build(self) -> Result<ConversionConfig, Img2PdfError> {
        let c = &self.config;
        if c.allowed_formats.is_empty() {
            return Err(Img2PdfError::InvalidConfig(
                "At least one image format must be allowed".into(),
            ));
        }
        if !c.resolution.is_finite() {
            return Err(Img2PdfError::InvalidConfig(format!(
                "Resolution must be a finite DPI value, got {}",
                c.resolution
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// A supported image file extension.
///
/// `jpg`/`jpeg` and `tif`/`tiff` are distinct members on purpose: a request
/// for `["jpg"]` must not pick up `photo.jpeg`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ImageFormat {
    Png,
    Jpg,
    Jpeg,
    Bmp,
    Tiff,
    Tif,
    Gif,
}

impl ImageFormat {
    /// Every supported format.
    pub const ALL: [ImageFormat; 7] = [
        ImageFormat::Png,
        ImageFormat::Jpg,
        ImageFormat::Jpeg,
        ImageFormat::Bmp,
        ImageFormat::Tiff,
        ImageFormat::Tif,
        ImageFormat::Gif,
    ];

    /// Match an extension case-insensitively. A leading `.` is ignored.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim().trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" => Some(ImageFormat::Jpg),
            "jpeg" => Some(ImageFormat::Jpeg),
            "bmp" => Some(ImageFormat::Bmp),
            "tiff" => Some(ImageFormat::Tiff),
            "tif" => Some(ImageFormat::Tif),
            "gif" => Some(ImageFormat::Gif),
            _ => None,
        }
    }

    /// The format tag of a filename, from its last extension.
    pub fn from_filename(name: &str) -> Option<Self> {
        std::path::Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Lower-case extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpg => "jpg",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Tiff => "tiff",
            ImageFormat::Tif => "tif",
            ImageFormat::Gif => "gif",
        }
    }

    /// The decoder the `image` crate should use when content sniffing fails.
    pub fn decoder_format(self) -> image::ImageFormat {
        match self {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpg | ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Bmp => image::ImageFormat::Bmp,
            ImageFormat::Tiff | ImageFormat::Tif => image::ImageFormat::Tiff,
            ImageFormat::Gif => image::ImageFormat::Gif,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Order in which pages are assembled.
///
/// Deserialises through [`FromStr`], so JSON bodies accept the same
/// spellings as the CLI and the multipart form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum SortOrder {
    /// Lexicographic by filename.
    #[default]
    Name,
    /// Ascending by last-modified time.
    Modified,
}

impl FromStr for SortOrder {
    type Err = Img2PdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(SortOrder::Name),
            "modified" => Ok(SortOrder::Modified),
            other => Err(Img2PdfError::InvalidInput(format!(
                "Unknown sort order '{other}': expected 'name' or 'modified'"
            ))),
        }
    }
}

impl TryFrom<String> for SortOrder {
    type Error = Img2PdfError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Name => f.write_str("name"),
            SortOrder::Modified => f.write_str("modified"),
        }
    }
}

/// Handling of images that fail to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePolicy {
    /// The first undecodable image fails the whole request.
    #[default]
    Abort,
    /// Undecodable images are left out and reported in the result.
    Skip,
}

pub(crate) fn format_list<'a>(formats: impl IntoIterator<Item = &'a ImageFormat>) -> String {
    formats
        .into_iter()
        .map(|f| f.extension())
        .collect::<Vec<_>>()
        .join(", ")
}
