// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — build new PDF documents out of raster images, one image per
// page, through a `PdfAuthor`.

use image::DynamicImage;
use paperkit_core::error::{PaperkitError, Result};
use paperkit_core::types::{DocumentType, ImagePdfQuality, jpeg_quality_percent};
use paperkit_engine::jpeg::jpeg_components;
use paperkit_engine::{LopdfAuthor, PdfAuthor, Rect};
use tracing::{debug, info, instrument, warn};

use crate::image::ImageProcessor;

/// Quality used when a JPEG has to be converted at the HIGH preset.
const CONVERSION_QUALITY: f32 = 0.9;

/// Creates new PDF documents from images.
///
/// Each page is exactly the size of its image, one point per pixel, with the
/// image filling the page.
pub struct PdfWriter {
    author: Box<dyn PdfAuthor>,
}

/// What goes into the document for one input image.
#[derive(Debug, PartialEq)]
enum PageContent {
    /// JPEG bytes, embedded as-is.
    Jpeg(Vec<u8>),
    /// Decoded pixels, embedded losslessly.
    Pixels(DynamicImage),
}

impl PdfWriter {
    /// Writer backed by the `lopdf` author.
    pub fn new() -> Self {
        Self::with_author(Box::new(LopdfAuthor))
    }

    pub fn with_author(author: Box<dyn PdfAuthor>) -> Self {
        Self { author }
    }

    /// Build a PDF with one page per image, in order.
    ///
    /// At [`ImagePdfQuality::High`] grey and RGB JPEGs are embedded untouched,
    /// other JPEGs are converted at 0.9 and every other format keeps its
    /// exact pixels (alpha included). The other presets re-encode every image
    /// as JPEG at their own quality.
    #[instrument(skip(self, images), fields(images = images.len()))]
    pub fn images_to_pdf(&self, images: &[&[u8]], quality: ImagePdfQuality) -> Result<Vec<u8>> {
        if images.is_empty() {
            return Err(PaperkitError::InvalidInput("no images to convert".into()));
        }

        let mut builder = self.author.create();
        for (index, data) in images.iter().enumerate() {
            let content = page_content(data, quality).map_err(|err| match err {
                PaperkitError::Image(detail) => {
                    PaperkitError::Image(format!("image #{}: {}", index + 1, detail))
                }
                other => other,
            })?;

            let embedded = match &content {
                PageContent::Jpeg(bytes) => builder.embed_image(bytes),
                PageContent::Pixels(pixels) => builder.embed_pixels(pixels),
            };
            let image =
                embedded.map_err(|err| PaperkitError::Pdf(format!("image #{}: {}", index + 1, err)))?;
            let (width, height) = image.scaled(1.0);
            let page = builder.add_page(width, height);
            builder
                .draw_image(page, image, Rect::full_page(width, height))
                .map_err(|err| PaperkitError::Pdf(err.to_string()))?;

            debug!(index, width_px = image.width_px, height_px = image.height_px, "Image page added");
        }

        let output = builder
            .serialize()
            .map_err(|err| PaperkitError::Pdf(err.to_string()))?;
        info!(pages = images.len(), output_bytes = output.len(), "Images converted to PDF");
        Ok(output)
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn page_content(data: &[u8], quality: ImagePdfQuality) -> Result<PageContent> {
    if let Some(reencode) = quality.reencode_quality() {
        let jpeg = ImageProcessor::from_bytes(data)?.to_jpeg_bytes(jpeg_quality_percent(reencode))?;
        return Ok(PageContent::Jpeg(jpeg));
    }

    if DocumentType::sniff(data) == Some(DocumentType::Jpeg) {
        if jpeg_is_embeddable(data) {
            return Ok(PageContent::Jpeg(data.to_vec()));
        }
        warn!("JPEG colour model not embeddable as-is, re-encoding");
        let jpeg = ImageProcessor::from_bytes(data)?
            .to_jpeg_bytes(jpeg_quality_percent(CONVERSION_QUALITY))?;
        return Ok(PageContent::Jpeg(jpeg));
    }

    Ok(PageContent::Pixels(ImageProcessor::from_bytes(data)?.into_dynamic()))
}

/// Grey and RGB frames only; CMYK and YCCK need converting first.
fn jpeg_is_embeddable(data: &[u8]) -> bool {
    matches!(jpeg_components(data), Some(1 | 3))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{cmyk_jpeg_header, page_sizes};
    use image::{Rgba, RgbaImage};
    use lopdf::Document;

    fn encoded(width: u32, height: u32, format: image::ImageFormat) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 3) as u8, (y * 5) as u8, 90, 255])
        });
        let mut buffer = Vec::new();
        let dynamic = match format {
            image::ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(img).to_rgb8()),
            _ => DynamicImage::ImageRgba8(img),
        };
        dynamic
            .write_to(&mut std::io::Cursor::new(&mut buffer), format)
            .unwrap();
        buffer
    }

    #[test]
    fn one_page_per_image_sized_in_pixels() {
        let jpeg = encoded(80, 60, image::ImageFormat::Jpeg);
        let png = encoded(40, 90, image::ImageFormat::Png);

        let pdf = PdfWriter::new()
            .images_to_pdf(&[jpeg.as_slice(), png.as_slice()], ImagePdfQuality::High)
            .unwrap();
        assert_eq!(page_sizes(&pdf), vec![(80.0, 60.0), (40.0, 90.0)]);
    }

    fn jpeg_bytes(content: PageContent) -> Vec<u8> {
        match content {
            PageContent::Jpeg(bytes) => bytes,
            PageContent::Pixels(_) => panic!("expected JPEG content"),
        }
    }

    #[test]
    fn high_quality_embeds_jpeg_verbatim() {
        let jpeg = encoded(32, 32, image::ImageFormat::Jpeg);
        assert_eq!(page_content(&jpeg, ImagePdfQuality::High).unwrap(), PageContent::Jpeg(jpeg.clone()));
        assert_ne!(jpeg_bytes(page_content(&jpeg, ImagePdfQuality::Low).unwrap()), jpeg);
    }

    #[test]
    fn cmyk_jpeg_is_never_embedded_verbatim() {
        let cmyk = cmyk_jpeg_header();
        assert!(!jpeg_is_embeddable(&cmyk));
        assert!(jpeg_is_embeddable(&encoded(8, 8, image::ImageFormat::Jpeg)));
        assert!(!matches!(
            page_content(&cmyk, ImagePdfQuality::High),
            Ok(PageContent::Jpeg(bytes)) if bytes == cmyk
        ));
    }

    #[test]
    fn high_quality_keeps_png_pixels() {
        let png = encoded(40, 30, image::ImageFormat::Png);
        let expected = image::load_from_memory(&png).unwrap().to_rgb8().into_raw();

        let pdf = PdfWriter::new()
            .images_to_pdf(&[png.as_slice()], ImagePdfQuality::High)
            .unwrap();
        let document = Document::load_mem(&pdf).unwrap();
        let image = document
            .objects
            .values()
            .filter_map(|object| object.as_stream().ok())
            .find(|stream| {
                stream.dict.get(b"Subtype").and_then(|s| s.as_name()).ok() == Some(b"Image".as_slice())
                    && stream.dict.get(b"SMask").is_ok()
            })
            .expect("image XObject with soft mask");
        let samples = if image.is_compressed() {
            image.decompressed_content().unwrap()
        } else {
            image.content.clone()
        };
        assert_eq!(samples, expected);
    }

    #[test]
    fn low_quality_is_smaller_than_medium() {
        let png = encoded(128, 128, image::ImageFormat::Png);
        let medium = jpeg_bytes(page_content(&png, ImagePdfQuality::Medium).unwrap());
        let low = jpeg_bytes(page_content(&png, ImagePdfQuality::Low).unwrap());
        assert!(low.len() <= medium.len());
    }

    #[test]
    fn rejects_empty_and_undecodable_input() {
        let writer = PdfWriter::new();
        assert!(matches!(
            writer.images_to_pdf(&[], ImagePdfQuality::High),
            Err(PaperkitError::InvalidInput(_))
        ));
        assert!(matches!(
            writer.images_to_pdf(&[b"junk".as_slice()], ImagePdfQuality::Medium),
            Err(PaperkitError::Image(_))
        ));
    }
}
