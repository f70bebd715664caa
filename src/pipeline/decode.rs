//! Decoding: image bytes → page-ready pixels.
//!
//! Every page in the output uses one colour representation, 8-bit
//! `DeviceRGB`. Greyscale, palette and 16-bit sources are widened or
//! narrowed by the `image` crate; sources with an alpha channel are
//! composited over white first, since a PDF viewer would otherwise show the
//! transparent areas black.
//!
//! A baseline or progressive JPEG with three components is already a valid
//! `DCTDecode` stream, so (when pass-through is enabled) its bytes are kept
//! verbatim instead of being decompressed and re-stored losslessly at many
//! times the size.

use crate::config::ImageFormat;
use crate::error::Img2PdfError;
use crate::pipeline::discover::SourceItem;
use image::{DynamicImage, ImageReader};
use std::io::Cursor;
use tracing::debug;

/// Pixel payload of one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagePixels {
    /// Original JPEG bytes, embedded with `DCTDecode`.
    Jpeg(Vec<u8>),
    /// Raw interleaved RGB, 3 bytes per pixel, row-major.
    Rgb(Vec<u8>),
}

/// A decoded image ready to become a page.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: PagePixels,
}

/// Read and decode one discovered item.
pub fn decode_item(item: &SourceItem, jpeg_passthrough: bool) -> Result<DecodedImage, Img2PdfError> {
    let bytes = item.read_bytes().map_err(|e| Img2PdfError::DecodeFailed {
        name: item.name.clone(),
        detail: format!("read failed: {e}"),
    })?;
    decode_bytes(&item.name, &bytes, item.format, jpeg_passthrough)
}

/// Decode `bytes`, sniffing the container from content and falling back to
/// the extension-derived `hint`.
pub fn decode_bytes(
    name: &str,
    bytes: &[u8],
    hint: Option<ImageFormat>,
    jpeg_passthrough: bool,
) -> Result<DecodedImage, Img2PdfError> {
    let failed = |detail: String| Img2PdfError::DecodeFailed {
        name: name.to_string(),
        detail,
    };

    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| failed(e.to_string()))?;
    if reader.format().is_none() {
        if let Some(hint) = hint {
            reader.set_format(hint.decoder_format());
        }
    }
    let container = reader.format();

    let img = reader.decode().map_err(|e| failed(e.to_string()))?;
    let (width, height) = (img.width(), img.height());
    if width == 0 || height == 0 {
        return Err(failed("image has no pixels".into()));
    }

    let passthrough = jpeg_passthrough
        && container == Some(image::ImageFormat::Jpeg)
        && matches!(img, DynamicImage::ImageRgb8(_))
        && jpeg_component_count(bytes) == Some(3);

    let pixels = if passthrough {
        PagePixels::Jpeg(bytes.to_vec())
    } else {
        PagePixels::Rgb(flatten_to_rgb(img))
    };

    debug!(
        "Decoded {} → {}x{} ({})",
        name,
        width,
        height,
        if passthrough { "jpeg pass-through" } else { "rgb" }
    );

    Ok(DecodedImage {
        width,
        height,
        pixels,
    })
}

/// Convert to 8-bit RGB, compositing any alpha channel over white.
fn flatten_to_rgb(img: DynamicImage) -> Vec<u8> {
    if !img.color().has_alpha() {
        return img.into_rgb8().into_raw();
    }

    let rgba = img.into_rgba8();
    let mut out = Vec::with_capacity(rgba.width() as usize * rgba.height() as usize * 3);
    for px in rgba.pixels() {
        let [r, g, b, a] = px.0;
        let a = u32::from(a);
        for c in [r, g, b] {
            out.push(((u32::from(c) * a + 255 * (255 - a) + 127) / 255) as u8);
        }
    }
    out
}

/// Number of colour components declared by the first SOF marker of a JPEG.
///
/// Returns `None` when the stream is not a JPEG or ends before a frame
/// header. CMYK (4) and greyscale (1) JPEGs are re-encoded instead of passed
/// through, because their bytes do not match `DeviceRGB`.
fn jpeg_component_count(bytes: &[u8]) -> Option<u8> {
    if bytes.len() < 4 || bytes[0] != 0xFF || bytes[1] != 0xD8 {
        return None;
    }

    let mut pos = 2;
    while pos + 4 <= bytes.len() {
        if bytes[pos] != 0xFF {
            return None;
        }
        let marker = bytes[pos + 1];
        // Fill bytes.
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        // Standalone markers carry no length.
        if marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
            pos += 2;
            continue;
        }

        let len = u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]) as usize;
        let is_sof = (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_sof {
            // FF Cn | Lf(2) | P(1) | Y(2) | X(2) | Nf(1)
            return bytes.get(pos + 9).copied();
        }
        if marker == 0xDA || marker == 0xD9 {
            return None;
        }
        pos += 2 + len;
    }
    None
}
