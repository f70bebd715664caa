//! Assembly: ordered images → one multi-page PDF.
//!
//! Each image becomes exactly one page whose MediaBox matches the image's
//! size at the configured resolution, with the image drawn edge to edge.
//! Pages are appended to the page tree in input order, so the PDF's page
//! order is the sorted order by construction.
//!
//! ```text
//! Catalog ──▶ Pages ──▶ Page 1 ──▶ Contents  "q W 0 0 H 0 0 cm /Im0 Do Q"
//!                  │            └─▶ Resources /XObject /Im0 ──▶ Image stream
//!                  └──▶ Page 2 …
//! ```

use crate::config::{ConversionConfig, DecodePolicy};
use crate::error::Img2PdfError;
use crate::output::SkippedImage;
use crate::pipeline::decode::{self, DecodedImage, PagePixels};
use crate::pipeline::discover::SourceItem;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::io::Write;
use tracing::{debug, info, warn};

const IMAGE_NAME: &[u8] = b"Im0";

/// Result of the assembly stage.
#[derive(Debug)]
pub struct AssembledPdf {
    pub bytes: Vec<u8>,
    pub pages: usize,
    pub skipped: Vec<SkippedImage>,
}

/// Incrementally builds a PDF with one full-bleed image per page.
pub struct PdfAssembler {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
    resolution: f32,
}

impl PdfAssembler {
    /// `resolution` is the DPI used to turn pixels into points.
    pub fn new(resolution: f32) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
            resolution,
        }
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Append `image` as the next page.
    pub fn add_page(&mut self, image: DecodedImage) -> Result<(), Img2PdfError> {
        let width_pt = image.width as f32 * 72.0 / self.resolution;
        let height_pt = image.height as f32 * 72.0 / self.resolution;

        let image_id = self.doc.add_object(image_xobject(image)?);

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(width_pt),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Real(height_pt),
                        Object::Integer(0),
                        Object::Integer(0),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(IMAGE_NAME.to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_bytes = content
            .encode()
            .map_err(|e| Img2PdfError::PdfAssembly(format!("content stream: {e}")))?;
        let content_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), content_bytes));

        let resources = Dictionary::from_iter([(
            "XObject",
            Object::Dictionary(Dictionary::from_iter([(
                IMAGE_NAME.to_vec(),
                Object::Reference(image_id),
            )])),
        )]);

        let page_id = self.doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(self.pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(width_pt),
                    Object::Real(height_pt),
                ]),
            ),
            ("Resources", Object::Dictionary(resources)),
            ("Contents", Object::Reference(content_id)),
        ]));

        self.kids.push(Object::Reference(page_id));
        Ok(())
    }

    /// Close the page tree and serialise the document.
    pub fn finish(mut self) -> Result<Vec<u8>, Img2PdfError> {
        let count = self.kids.len() as i64;
        let pages = Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(self.kids)),
            ("Count", Object::Integer(count)),
        ]);
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(self.pages_id)),
        ]));
        let info_id = self.doc.add_object(Dictionary::from_iter([(
            "Producer",
            Object::string_literal(concat!("edgequake-img2pdf ", env!("CARGO_PKG_VERSION"))),
        )]));
        self.doc.trailer.set("Root", Object::Reference(catalog_id));
        self.doc.trailer.set("Info", Object::Reference(info_id));

        let mut out = Vec::new();
        self.doc
            .save_to(&mut out)
            .map_err(|e| Img2PdfError::PdfAssembly(e.to_string()))?;
        Ok(out)
    }
}

/// Build the image XObject for one page.
fn image_xobject(image: DecodedImage) -> Result<Stream, Img2PdfError> {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(i64::from(image.width)));
    dict.set("Height", Object::Integer(i64::from(image.height)));
    dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
    dict.set("BitsPerComponent", Object::Integer(8));

    let data = match image.pixels {
        PagePixels::Jpeg(bytes) => {
            dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
            bytes
        }
        PagePixels::Rgb(raw) => {
            let compress_err =
                |e: std::io::Error| Img2PdfError::PdfAssembly(format!("image compression: {e}"));
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&raw).map_err(compress_err)?;
            let compressed = encoder.finish().map_err(compress_err)?;
            dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
            compressed
        }
    };

    // Already compressed; lopdf must not filter it a second time.
    Ok(Stream::new(dict, data).with_compression(false))
}

/// Decode `items` in order and assemble them into one PDF.
///
/// Progress events go to the config's callback. Under
/// [`DecodePolicy::Abort`] the first decode failure ends the call; under
/// [`DecodePolicy::Skip`] failures are recorded and the remaining images
/// still become pages.
pub fn assemble(
    items: &[SourceItem],
    config: &ConversionConfig,
) -> Result<AssembledPdf, Img2PdfError> {
    let total = items.len();
    let cb = config.progress_callback.as_ref();
    if let Some(cb) = cb {
        cb.on_conversion_start(total);
    }

    let mut assembler = PdfAssembler::new(config.resolution);
    let mut skipped = Vec::new();
    let mut first_error: Option<String> = None;

    for (idx, item) in items.iter().enumerate() {
        let index = idx + 1;
        if let Some(cb) = cb {
            cb.on_image_start(index, total, &item.name);
        }

        let decoded = match decode::decode_item(item, config.jpeg_passthrough) {
            Ok(d) => d,
            Err(e) => {
                if let Some(cb) = cb {
                    cb.on_image_error(index, total, &item.name, &e.to_string());
                }
                match config.decode_policy {
                    DecodePolicy::Abort => {
                        if let Some(cb) = cb {
                            cb.on_conversion_complete(total, 0);
                        }
                        return Err(e);
                    }
                    DecodePolicy::Skip => {
                        warn!("Skipping {}: {}", item.name, e);
                        first_error.get_or_insert_with(|| e.to_string());
                        skipped.push(SkippedImage {
                            name: item.name.clone(),
                            reason: e.to_string(),
                        });
                        continue;
                    }
                }
            }
        };

        assembler.add_page(decoded)?;
        debug!("Page {}/{} ← {}", index, total, item.name);
        if let Some(cb) = cb {
            cb.on_image_complete(index, total, &item.name);
        }
    }

    let pages = assembler.page_count();
    if let Some(cb) = cb {
        cb.on_conversion_complete(total, pages);
    }

    if pages == 0 {
        return Err(Img2PdfError::AllImagesFailed {
            total,
            first_error: first_error.unwrap_or_default(),
        });
    }

    let bytes = assembler.finish()?;
    info!("Assembled {} pages ({} bytes)", pages, bytes.len());

    Ok(AssembledPdf {
        bytes,
        pages,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::discover::ItemOrigin;
    use image::{DynamicImage, Rgb, RgbImage};
    use std::io::Cursor;

    fn png_item(name: &str, width: u32, height: u32) -> SourceItem {
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([0, 128, 255])))
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        SourceItem {
            name: name.to_string(),
            origin: ItemOrigin::Memory(buf),
            format: crate::config::ImageFormat::from_filename(name),
            modified: None,
        }
    }

    fn broken_item(name: &str) -> SourceItem {
        SourceItem {
            name: name.to_string(),
            origin: ItemOrigin::Memory(b"garbage".to_vec()),
            format: crate::config::ImageFormat::from_filename(name),
            modified: None,
        }
    }

    fn page_widths(bytes: &[u8]) -> Vec<i64> {
        let doc = Document::load_mem(bytes).unwrap();
        doc.get_pages()
            .values()
            .map(|&page_id| {
                let page = doc.get_dictionary(page_id).unwrap();
                let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
                let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
                let image_id = xobjects.get(IMAGE_NAME).unwrap().as_reference().unwrap();
                let stream = doc.get_object(image_id).unwrap().as_stream().unwrap();
                stream.dict.get(b"Width").unwrap().as_i64().unwrap()
            })
            .collect()
    }

    #[test]
    fn one_page_per_image_in_order() {
        let items = vec![png_item("a.png", 30, 10), png_item("b.png", 10, 10), png_item("c.png", 20, 5)];
        let pdf = assemble(&items, &ConversionConfig::default()).unwrap();
        assert_eq!(pdf.pages, 3);
        assert!(pdf.bytes.starts_with(b"%PDF-1.5"));
        assert_eq!(page_widths(&pdf.bytes), vec![30, 10, 20]);
    }

    #[test]
    fn media_box_follows_resolution() {
        let items = vec![png_item("a.png", 144, 72)];
        let config = ConversionConfig::builder().resolution(144.0).build().unwrap();
        let pdf = assemble(&items, &config).unwrap();

        let doc = Document::load_mem(&pdf.bytes).unwrap();
        let (_, &page_id) = doc.get_pages().iter().next().unwrap();
        let media_box = doc
            .get_dictionary(page_id)
            .unwrap()
            .get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .clone();
        assert_eq!(media_box[2].as_float().unwrap(), 72.0);
        assert_eq!(media_box[3].as_float().unwrap(), 36.0);
    }

    #[test]
    fn decode_failure_aborts_by_default() {
        let items = vec![png_item("a.png", 2, 2), broken_item("b.png"), png_item("c.png", 2, 2)];
        let err = assemble(&items, &ConversionConfig::default()).unwrap_err();
        match err {
            Img2PdfError::DecodeFailed { name, .. } => assert_eq!(name, "b.png"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn skip_policy_reports_and_continues() {
        let items = vec![png_item("a.png", 4, 2), broken_item("b.png"), png_item("c.png", 6, 2)];
        let config = ConversionConfig::builder()
            .decode_policy(DecodePolicy::Skip)
            .build()
            .unwrap();
        let pdf = assemble(&items, &config).unwrap();
        assert_eq!(pdf.pages, 2);
        assert_eq!(pdf.skipped.len(), 1);
        assert_eq!(pdf.skipped[0].name, "b.png");
        assert_eq!(page_widths(&pdf.bytes), vec![4, 6]);
    }

    #[test]
    fn skip_policy_with_nothing_decodable_fails() {
        let items = vec![broken_item("a.png"), broken_item("b.png")];
        let config = ConversionConfig::builder()
            .decode_policy(DecodePolicy::Skip)
            .build()
            .unwrap();
        let err = assemble(&items, &config).unwrap_err();
        assert!(matches!(err, Img2PdfError::AllImagesFailed { total: 2, .. }), "got {err:?}");
    }
}
