// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF authoring with `lopdf`.
//
// JPEG bytes are embedded verbatim as `/DCTDecode` image XObjects, so the
// quality chosen at encode time is exactly what ends up in the file. Decoded
// pixels go in as `/FlateDecode` samples with an optional `/SMask`.

use std::io::Cursor;

use image::codecs::jpeg::JpegDecoder;
use image::{DynamicImage, GenericImageView, ImageDecoder};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use paperkit_core::error::EngineError;
use tracing::debug;

use crate::jpeg::jpeg_components;
use crate::traits::*;

/// [`PdfAuthor`] that writes documents with `lopdf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfAuthor;

impl PdfAuthor for LopdfAuthor {
    fn name(&self) -> &str {
        "lopdf"
    }

    fn create(&self) -> Box<dyn DocumentBuilder> {
        Box::new(LopdfBuilder::new())
    }
}

/// A page waiting to be written: its size plus the draw operations and
/// XObject resources collected so far.
struct PageDraft {
    width: f32,
    height: f32,
    operations: Vec<Operation>,
    xobjects: Dictionary,
}

/// Embedded image: object id plus pixel size.
struct EmbeddedImage {
    object_id: ObjectId,
    width_px: u32,
    height_px: u32,
}

/// In-progress document. Pages are only turned into objects on `serialize`.
pub struct LopdfBuilder {
    document: Document,
    pages_id: ObjectId,
    images: Vec<EmbeddedImage>,
    pages: Vec<PageDraft>,
}

impl LopdfBuilder {
    pub fn new() -> Self {
        let mut document = Document::with_version("1.7");
        let pages_id = document.new_object_id();
        Self {
            document,
            pages_id,
            images: Vec::new(),
            pages: Vec::new(),
        }
    }

    fn register(&mut self, object_id: ObjectId, width_px: u32, height_px: u32) -> ImageRef {
        let index = self.images.len();
        self.images.push(EmbeddedImage {
            object_id,
            width_px,
            height_px,
        });
        ImageRef {
            index,
            width_px,
            height_px,
        }
    }

    /// Flate-compressed 8-bit sample stream.
    fn add_samples(&mut self, mut dict: Dictionary, samples: Vec<u8>) -> EngineResult<ObjectId> {
        dict.set("BitsPerComponent", Object::Integer(8));
        let mut stream = Stream::new(dict, samples);
        stream
            .compress()
            .map_err(|err| EngineError::Failed(format!("failed to compress image samples: {err}")))?;
        Ok(self.document.add_object(stream))
    }
}

fn image_dict(width_px: u32, height_px: u32, color_space: &[u8]) -> Dictionary {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(i64::from(width_px)));
    dict.set("Height", Object::Integer(i64::from(height_px)));
    dict.set("ColorSpace", Object::Name(color_space.to_vec()));
    dict
}

impl Default for LopdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentBuilder for LopdfBuilder {
    fn embed_image(&mut self, bytes: &[u8]) -> EngineResult<ImageRef> {
        // Decoders report CMYK frames as RGB, so trust the frame header.
        let color_space: &[u8] = match jpeg_components(bytes) {
            Some(1) => b"DeviceGray",
            Some(3) => b"DeviceRGB",
            Some(components) => {
                return Err(EngineError::Failed(format!(
                    "JPEG with {components} colour components cannot be embedded as-is"
                )));
            }
            None => return Err(EngineError::Failed("not an embeddable JPEG: no frame header".into())),
        };
        let decoder = JpegDecoder::new(Cursor::new(bytes))
            .map_err(|err| EngineError::Failed(format!("not an embeddable JPEG: {err}")))?;
        let (width_px, height_px) = decoder.dimensions();

        let mut dict = image_dict(width_px, height_px, color_space);
        dict.set("BitsPerComponent", Object::Integer(8));
        dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));

        let object_id = self
            .document
            .add_object(Stream::new(dict, bytes.to_vec()).with_compression(false));

        let image = self.register(object_id, width_px, height_px);
        debug!(index = image.index, width_px, height_px, bytes = bytes.len(), "JPEG embedded");
        Ok(image)
    }

    fn embed_pixels(&mut self, image: &DynamicImage) -> EngineResult<ImageRef> {
        let (width_px, height_px) = image.dimensions();
        let color = image.color();

        let (color_space, samples): (&[u8], Vec<u8>) = if color.has_color() {
            (b"DeviceRGB", image.to_rgb8().into_raw())
        } else {
            (b"DeviceGray", image.to_luma8().into_raw())
        };
        let mut dict = image_dict(width_px, height_px, color_space);

        if color.has_alpha() {
            let alpha: Vec<u8> = image.to_rgba8().pixels().map(|pixel| pixel.0[3]).collect();
            let mask_id = self.add_samples(image_dict(width_px, height_px, b"DeviceGray"), alpha)?;
            dict.set("SMask", Object::Reference(mask_id));
        }

        let object_id = self.add_samples(dict, samples)?;
        let embedded = self.register(object_id, width_px, height_px);
        debug!(
            index = embedded.index,
            width_px,
            height_px,
            alpha = color.has_alpha(),
            "Pixels embedded"
        );
        Ok(embedded)
    }

    fn add_page(&mut self, width: f32, height: f32) -> PageRef {
        self.pages.push(PageDraft {
            width,
            height,
            operations: Vec::new(),
            xobjects: Dictionary::new(),
        });
        PageRef(self.pages.len() - 1)
    }

    fn draw_image(&mut self, page: PageRef, image: ImageRef, rect: Rect) -> EngineResult<()> {
        let embedded = self
            .images
            .get(image.index)
            .ok_or_else(|| EngineError::Failed(format!("unknown image #{}", image.index)))?;
        let draft = self
            .pages
            .get_mut(page.0)
            .ok_or_else(|| EngineError::Failed(format!("unknown page #{}", page.0)))?;

        let name = format!("Im{}", image.index);
        draft
            .xobjects
            .set(name.as_bytes().to_vec(), Object::Reference(embedded.object_id));
        draft.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(rect.width),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(rect.height),
                    Object::Real(rect.x),
                    Object::Real(rect.y),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
        Ok(())
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn serialize(self: Box<Self>) -> EngineResult<Vec<u8>> {
        let LopdfBuilder {
            mut document,
            pages_id,
            images,
            pages,
        } = *self;

        let mut kids = Vec::with_capacity(pages.len());
        for draft in pages {
            let content = Content {
                operations: draft.operations,
            };
            let encoded = content
                .encode()
                .map_err(|err| EngineError::Failed(format!("content stream: {err}")))?;
            let content_id = document.add_object(Stream::new(Dictionary::new(), encoded));

            let mut resources = Dictionary::new();
            resources.set("XObject", Object::Dictionary(draft.xobjects));

            let mut page = Dictionary::new();
            page.set("Type", Object::Name(b"Page".to_vec()));
            page.set("Parent", Object::Reference(pages_id));
            page.set(
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(draft.width),
                    Object::Real(draft.height),
                ]),
            );
            page.set("Resources", Object::Dictionary(resources));
            page.set("Contents", Object::Reference(content_id));
            kids.push(Object::Reference(document.add_object(page)));
        }

        let page_count = kids.len();
        let mut pages_dict = Dictionary::new();
        pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
        pages_dict.set("Count", Object::Integer(page_count as i64));
        pages_dict.set("Kids", Object::Array(kids));
        document
            .objects
            .insert(pages_id, Object::Dictionary(pages_dict));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = document.add_object(catalog);
        document.trailer.set("Root", Object::Reference(catalog_id));

        let mut output = Vec::new();
        document
            .save_to(&mut output)
            .map_err(|err| EngineError::Failed(format!("failed to serialise PDF: {err}")))?;

        debug!(
            pages = page_count,
            images = images.len(),
            output_bytes = output.len(),
            "Document serialised"
        );
        Ok(output)
    }
}
